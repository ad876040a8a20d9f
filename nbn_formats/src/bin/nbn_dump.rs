use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use nbn_formats::{Dimensions, PixelWord, patch};
use serde::Serialize;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(about = "Summarise raw 15bpp NBN image assets", version)]
struct Args {
    /// NBN files or directories (directories are scanned recursively for *.nbn)
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// Interpret the buffers with this size instead of the derived square
    #[arg(long, value_name = "WxH")]
    dimensions: Option<Dimensions>,

    /// Number of most common colours to list per file
    #[arg(long, default_value_t = 8)]
    top: usize,

    /// Emit a JSON array instead of the text report
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct AssetSummary {
    path: PathBuf,
    byte_len: usize,
    dangling_byte: bool,
    dimensions: Option<Dimensions>,
    synthesised_pixels: usize,
    first_words: Vec<String>,
    top_colors: Vec<(String, usize)>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let files = resolve_paths(&args.paths);
    if files.is_empty() {
        bail!("no NBN files found");
    }

    let mut summaries = Vec::with_capacity(files.len());
    for path in files {
        let summary = summarise(&path, args.dimensions, args.top)
            .with_context(|| format!("summarising {}", path.display()))?;
        summaries.push(summary);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            print_summary(summary);
        }
    }
    Ok(())
}

fn resolve_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(|res| res.ok()) {
                let is_nbn = entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("nbn"))
                    .unwrap_or(false);
                if entry.file_type().is_file() && is_nbn {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    files.sort();
    files.dedup();
    files
}

fn summarise(path: &Path, dimensions: Option<Dimensions>, top: usize) -> Result<AssetSummary> {
    let bytes = patch::load(path)?;
    let dimensions = dimensions.or_else(|| Dimensions::derive(bytes.len()));
    let stored_pixels = bytes.len() / 2;
    let synthesised_pixels = dimensions
        .and_then(|dims| dims.pixel_count())
        .map(|count| count.saturating_sub(stored_pixels))
        .unwrap_or(0);

    let words = bytes
        .chunks_exact(2)
        .map(|chunk| PixelWord::from_le_bytes([chunk[0], chunk[1]]));

    let mut histogram: HashMap<PixelWord, usize> = HashMap::new();
    for word in words.clone() {
        *histogram.entry(word).or_insert(0) += 1;
    }
    let mut top_colors: Vec<_> = histogram.into_iter().collect();
    top_colors.sort_by_key(|&(word, count)| (std::cmp::Reverse(count), word.raw()));
    top_colors.truncate(top);

    Ok(AssetSummary {
        path: path.to_path_buf(),
        byte_len: bytes.len(),
        dangling_byte: bytes.len() % 2 == 1,
        dimensions,
        synthesised_pixels,
        first_words: words.take(8).map(|word| word.to_string()).collect(),
        top_colors: top_colors
            .into_iter()
            .map(|(word, count)| (word.to_string(), count))
            .collect(),
    })
}

fn print_summary(summary: &AssetSummary) {
    let dims = summary
        .dimensions
        .map(|dims| dims.to_string())
        .unwrap_or_else(|| String::from("-"));
    println!(
        "{path}: {len} bytes, {dims}{pad}{dangling}",
        path = summary.path.display(),
        len = summary.byte_len,
        pad = if summary.synthesised_pixels > 0 {
            format!(" ({} padded pixels)", summary.synthesised_pixels)
        } else {
            String::new()
        },
        dangling = if summary.dangling_byte {
            ", dangling final byte"
        } else {
            ""
        }
    );
    println!("  first words: {}", summary.first_words.join(" "));
    for (word, count) in &summary.top_colors {
        println!("  {word} -> {count}");
    }
}
