use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::warn;
use nbn_formats::{EditorSession, SessionSummary};
use serde::Serialize;

mod cli;
mod preview;
mod script;

use cli::EditRun;
use preview::{dump_raster_to_png, PreviewStats};
use script::StepTally;

#[derive(Debug, Serialize)]
struct InjectionReport {
    target: PathBuf,
    offset: String,
    bytes_written: usize,
}

#[derive(Debug, Serialize)]
struct RunReport {
    session: SessionSummary,
    #[serde(flatten)]
    tally: StepTally,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<PreviewStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    injected: Option<InjectionReport>,
}

fn main() -> Result<()> {
    env_logger::init();
    let run = cli::parse()?;

    let report = execute(&run)?;

    if let Some(path) = run.report_json.as_ref() {
        let json = serde_json::to_string_pretty(&report).context("serializing run report")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Run report written to {}", path.display());
    }

    let failures = report.tally.failures.len();
    if failures > 0 {
        bail!("{failures} step(s) failed; see messages above");
    }
    Ok(())
}

/// Runs every requested step. Edit, save and inject failures are reported
/// and recorded but do not stop the run; only an unreadable input does.
fn execute(run: &EditRun) -> Result<RunReport> {
    let mut session = EditorSession::new();
    let len = session
        .load(&run.input)
        .with_context(|| format!("loading {}", run.input.display()))?;
    println!("Loaded {} ({} bytes)", run.input.display(), len);

    let mut tally = StepTally::default();

    if let Some(dims) = run.dimensions {
        record(
            &mut tally,
            session.set_dimensions(dims.width(), dims.height()),
        );
    }
    if let Some(dims) = record(&mut tally, session.ensure_dimensions()) {
        println!("Interpreting as {dims}");
    }

    for step in &run.steps {
        let result = step.apply(&mut session, &mut tally);
        record(&mut tally, result);
    }

    let preview = match run.dump_png.as_ref() {
        Some(path) => match session.raster() {
            Ok(raster) => {
                let stats = dump_raster_to_png(raster, path)
                    .with_context(|| format!("writing PNG preview {}", path.display()))?;
                println!(
                    "Preview written to {} ({}x{}, mean luma {:.2})",
                    path.display(),
                    stats.width,
                    stats.height,
                    stats.mean_luma
                );
                Some(stats)
            }
            Err(err) => {
                report_failure(&mut tally, &err);
                None
            }
        },
        None => None,
    };

    let mut saved = None;
    if let Some(path) = run.save.as_ref() {
        if let Some(written) = record(&mut tally, session.save(path)) {
            println!("File saved as {} ({written} bytes)", path.display());
            saved = Some(path.clone());
        }
    }

    let mut injected = None;
    if let Some(injection) = run.inject.as_ref() {
        if let Some(bytes_written) = record(
            &mut tally,
            session.inject(&injection.target, &injection.offset),
        ) {
            println!(
                "Injected image data into {} at offset {}",
                injection.target.display(),
                injection.offset.trim()
            );
            injected = Some(InjectionReport {
                target: injection.target.clone(),
                offset: injection.offset.clone(),
                bytes_written,
            });
        }
    }

    Ok(RunReport {
        session: session.summary(),
        tally,
        preview,
        saved,
        injected,
    })
}

fn record<T, E: std::fmt::Display>(tally: &mut StepTally, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            report_failure(tally, &err);
            None
        }
    }
}

fn report_failure(tally: &mut StepTally, err: &dyn std::fmt::Display) {
    warn!("{err}");
    println!("status: {err}");
    tally.failures.push(err.to_string());
}
