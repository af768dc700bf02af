mod docx;
mod parser;
mod render;
mod store;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::warn;

use store::{ItemRow, Meta, SheetRecord};

#[derive(Parser)]
#[command(
    name = "kl_extractor",
    about = "TO-1 maintenance checklist pipeline: docx in, interchange data + HTML forms out"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover structure from .docx checklists into interchange artifacts
    Extract {
        /// Directory scanned for .docx files
        #[arg(short, long, default_value = ".")]
        input: PathBuf,
        /// Interchange artifact directory
        #[arg(short, long, default_value = "data")]
        data: PathBuf,
        /// Engineer roster file, one name per line
        #[arg(long)]
        roster: Option<PathBuf>,
        /// Max documents to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Render one static HTML form per sheet
    Render {
        #[arg(short, long, default_value = "data")]
        data: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
    },
    /// Render the combined interactive document
    Interactive {
        #[arg(short, long, default_value = "data")]
        data: PathBuf,
        /// Output file
        #[arg(short, long, default_value = "out/checklists.html")]
        out: PathBuf,
    },
    /// Extract + render static + interactive in one pipeline
    Run {
        #[arg(short, long, default_value = ".")]
        input: PathBuf,
        #[arg(short, long, default_value = "data")]
        data: PathBuf,
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
        #[arg(long)]
        roster: Option<PathBuf>,
    },
    /// Show interchange statistics
    Stats {
        #[arg(short, long, default_value = "data")]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            data,
            roster,
            limit,
        } => {
            let counts = run_extract(&input, &data, roster.as_deref(), limit)?;
            counts.print();
            Ok(())
        }
        Commands::Render { data, out } => {
            let n = run_render(&data, &out)?;
            println!("Rendered {} static sheets to {}", n, out.display());
            Ok(())
        }
        Commands::Interactive { data, out } => {
            run_interactive(&data, &out)?;
            println!("Rendered interactive document to {}", out.display());
            Ok(())
        }
        Commands::Run {
            input,
            data,
            out,
            roster,
        } => {
            let counts = run_extract(&input, &data, roster.as_deref(), None)?;
            counts.print();
            let n = run_render(&data, &out)?;
            println!("Rendered {} static sheets to {}", n, out.display());
            let combined = out.join("checklists.html");
            run_interactive(&data, &combined)?;
            println!("Rendered interactive document to {}", combined.display());
            Ok(())
        }
        Commands::Stats { data } => run_stats(&data),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ExtractCounts {
    sheets: usize,
    items: usize,
    errors: usize,
}

impl ExtractCounts {
    fn print(&self) {
        println!("Saved {} sheets, {} items.", self.sheets, self.items);
        if self.errors > 0 {
            println!("{} documents failed (see warnings above).", self.errors);
        }
    }
}

fn run_extract(
    input: &Path,
    data: &Path,
    roster: Option<&Path>,
    limit: Option<usize>,
) -> Result<ExtractCounts> {
    let mut files = docx::collect_docx(input)?;
    if files.is_empty() {
        bail!("No .docx files found in {}", input.display());
    }
    if let Some(n) = limit {
        files.truncate(n);
    }
    println!("Extracting {} documents...", files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let results: Vec<(PathBuf, Result<(SheetRecord, Vec<ItemRow>)>)> = files
        .par_iter()
        .map(|path| {
            let result = extract_one(path);
            pb.inc(1);
            (path.clone(), result)
        })
        .collect();
    pb.finish_and_clear();

    let mut meta = Meta::default();
    let mut items = Vec::new();
    let mut errors = 0;
    for (path, result) in results {
        match result {
            Ok((record, rows)) => {
                meta.sheets.push(record);
                items.extend(rows);
            }
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                errors += 1;
            }
        }
    }
    if meta.sheets.is_empty() {
        bail!("All {} documents failed to extract", errors);
    }

    if let Some(path) = roster {
        meta.engineers = store::load_roster(path)?;
    }
    store::save(data, &meta, &items)?;

    Ok(ExtractCounts {
        sheets: meta.sheets.len(),
        items: items.len(),
        errors,
    })
}

fn extract_one(path: &Path) -> Result<(SheetRecord, Vec<ItemRow>)> {
    let lines = docx::read_paragraphs(path)?;
    let parser::Sheet {
        month,
        title,
        warnings,
        closing,
        items,
    } = parser::recover(&lines);

    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Non-UTF-8 file name: {}", path.display()))?
        .to_string();
    let source = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let rows = items
        .into_iter()
        .map(|i| ItemRow {
            sheet_id: id.clone(),
            device: i.device,
            operation: i.operation,
        })
        .collect();
    let record = SheetRecord {
        id,
        source,
        month,
        title,
        warnings,
        closing,
    };
    Ok((record, rows))
}

fn run_render(data: &Path, out: &Path) -> Result<usize> {
    let (meta, items) = store::load(data)?;
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let grouped = store::group_items(items);
    let month = render::current_month_label();
    for sheet in &meta.sheets {
        let rows = grouped.get(&sheet.id).map(Vec::as_slice).unwrap_or(&[]);
        let html = render::render_static(sheet, rows, &month, &meta.engineers);
        let path = out.join(format!("{}.html", sheet.id));
        fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(meta.sheets.len())
}

fn run_interactive(data: &Path, out: &Path) -> Result<()> {
    let (meta, items) = store::load(data)?;
    let html = render::render_interactive(&meta, &items, &render::current_month_label())?;
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(out, html).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(())
}

fn run_stats(data: &Path) -> Result<()> {
    let (meta, items) = store::load(data)?;

    let mut per_sheet: HashMap<&str, usize> = HashMap::new();
    for row in &items {
        *per_sheet.entry(row.sheet_id.as_str()).or_default() += 1;
    }
    let counts: Vec<usize> = meta
        .sheets
        .iter()
        .map(|s| per_sheet.get(s.id.as_str()).copied().unwrap_or(0))
        .collect();
    let min = counts.iter().min().copied().unwrap_or(0);
    let max = counts.iter().max().copied().unwrap_or(0);
    let avg = if meta.sheets.is_empty() {
        0.0
    } else {
        items.len() as f64 / meta.sheets.len() as f64
    };
    let untitled = meta.sheets.iter().filter(|s| s.title.is_empty()).count();
    let warning_lines: usize = meta.sheets.iter().map(|s| s.warnings.len()).sum();

    println!("Sheets:          {}", meta.sheets.len());
    println!("Items:           {}", items.len());
    println!("Items per sheet: {} min / {:.1} avg / {} max", min, avg, max);
    println!("Warning lines:   {}", warning_lines);
    println!("Missing titles:  {}", untitled);
    println!("Engineers:       {}", meta.engineers.len());
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
