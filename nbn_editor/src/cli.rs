use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nbn_formats::{BrushSpec, Dimensions};

use crate::script::{EditScript, EditStep};

#[derive(Parser, Debug)]
#[command(about = "Headless editor for raw 15bpp NBN image assets", version)]
pub struct Args {
    /// NBN asset to load
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Interpret the asset as WIDTHxHEIGHT instead of the derived near-square layout
    #[arg(long, value_name = "WxH")]
    pub dimensions: Option<Dimensions>,

    /// JSON edit script (strokes, undos, dimension changes) applied before any --stroke
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Brush stroke as X,Y,RADIUS,COLOR (may repeat); radius is clamped to 0-50
    #[arg(long = "stroke", value_name = "X,Y,R,COLOR", allow_hyphen_values = true)]
    pub strokes: Vec<BrushSpec>,

    /// Undo this many strokes after all edits
    #[arg(long, default_value_t = 0)]
    pub undo: usize,

    /// Write the decoded image to a PNG preview after editing
    #[arg(long, value_name = "FILE")]
    pub dump_png: Option<PathBuf>,

    /// Save the edited buffer as a standalone file (must keep the input's length)
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Existing file to patch with the edited buffer
    #[arg(long, value_name = "FILE", requires = "inject_offset")]
    pub inject_target: Option<PathBuf>,

    /// Offset into --inject-target, as 0x-prefixed hex or decimal
    #[arg(
        long,
        value_name = "OFFSET",
        requires = "inject_target",
        allow_hyphen_values = true
    )]
    pub inject_offset: Option<String>,

    /// Path to write the session summary as JSON
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Injection {
    pub target: PathBuf,
    pub offset: String,
}

#[derive(Debug)]
pub struct EditRun {
    pub input: PathBuf,
    pub dimensions: Option<Dimensions>,
    pub steps: Vec<EditStep>,
    pub dump_png: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub inject: Option<Injection>,
    pub report_json: Option<PathBuf>,
}

pub fn parse() -> Result<EditRun> {
    let args = Args::parse();
    args.into_run()
}

impl Args {
    fn into_run(self) -> Result<EditRun> {
        let mut steps = Vec::new();
        if let Some(path) = self.script.as_ref() {
            let script = EditScript::from_json_file(path)
                .with_context(|| format!("loading edit script {}", path.display()))?;
            steps.extend(script.steps);
        }
        steps.extend(self.strokes.into_iter().map(EditStep::Stroke));
        if self.undo > 0 {
            steps.push(EditStep::Undo { count: self.undo });
        }

        let inject = match (self.inject_target, self.inject_offset) {
            (Some(target), Some(offset)) => Some(Injection { target, offset }),
            (None, None) => None,
            _ => bail!("--inject-target and --inject-offset must be used together"),
        };

        Ok(EditRun {
            input: self.input,
            dimensions: self.dimensions,
            steps,
            dump_png: self.dump_png,
            save: self.save,
            inject,
            report_json: self.report_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strokes_follow_script_and_undo_comes_last() {
        let args = Args::try_parse_from([
            "nbn_editor",
            "--input",
            "in.nbn",
            "--stroke",
            "-1,2,3,7FFF",
            "--stroke",
            "4,5,0,001F",
            "--undo",
            "1",
        ])
        .unwrap();
        let run = args.into_run().unwrap();
        assert_eq!(run.steps.len(), 3);
        assert_eq!(
            run.steps[0],
            EditStep::Stroke(BrushSpec::new(-1, 2, 3, "7FFF"))
        );
        assert_eq!(run.steps[2], EditStep::Undo { count: 1 });
        assert!(run.inject.is_none());
    }

    #[test]
    fn injection_needs_target_and_offset() {
        let result = Args::try_parse_from([
            "nbn_editor",
            "--input",
            "in.nbn",
            "--inject-target",
            "host.bin",
        ]);
        assert!(result.is_err());

        let args = Args::try_parse_from([
            "nbn_editor",
            "--input",
            "in.nbn",
            "--inject-target",
            "host.bin",
            "--inject-offset",
            "0x100",
        ])
        .unwrap();
        let run = args.into_run().unwrap();
        let inject = run.inject.unwrap();
        assert_eq!(inject.offset, "0x100");
    }

    #[test]
    fn rejects_bad_dimensions_at_parse_time() {
        let result = Args::try_parse_from([
            "nbn_editor",
            "--input",
            "in.nbn",
            "--dimensions",
            "0x10",
        ]);
        assert!(result.is_err());
    }
}
