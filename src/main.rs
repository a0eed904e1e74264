use anyhow::{Context, Result};
use brandsplit::{
    config::Config,
    discover,
    progress::{BarProgress, NoProgress, SplitObserver},
    run::{split_file, RunSummary},
    DirSink, OutputFormat,
};
use clap::Parser;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Split a product table into one file per brand")]
struct Args {
    /// YAML file with input_dir / output_dir / format / progress
    #[arg(long)]
    config: Option<PathBuf>,
    /// Folder listing the candidate inputs
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Folder receiving one file per brand
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Split this file once and exit, skipping the menu
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(d) = args.input_dir {
        cfg.input_dir = d;
    }
    if let Some(d) = args.output_dir {
        cfg.output_dir = d;
    }
    if let Some(f) = args.format {
        cfg.format = f;
    }
    if args.no_progress {
        cfg.progress = false;
    }
    info!(?cfg, "startup");

    // ─── 3) one-shot mode ────────────────────────────────────────────
    if let Some(file) = args.file {
        let summary = run_once(&cfg, file)?;
        if !summary.failed_brands().is_empty() {
            std::process::exit(2);
        }
        return Ok(());
    }

    // ─── 4) interactive loop ─────────────────────────────────────────
    println!("=== Split a table by brand ===");
    let stdin = io::stdin();
    loop {
        if !interactive_run(&cfg, &mut stdin.lock())? {
            break;
        }
        print!("Press Enter to exit or type 'restart' to run again: ");
        io::stdout().flush()?;
        let answer = read_line(&mut stdin.lock())?;
        if !discover::wants_restart(&answer) {
            break;
        }
    }

    info!("all done");
    Ok(())
}

/// Menu, selection and one split. `Ok(false)` means there was nothing to
/// run and the program should stop.
fn interactive_run(cfg: &Config, input: &mut impl BufRead) -> Result<bool> {
    if discover::ensure_dir(&cfg.input_dir)? {
        println!(
            "Created '{}'. Put the source file in it and run again.",
            cfg.input_dir.display()
        );
        return Ok(false);
    }

    let files = discover::list_inputs(&cfg.input_dir)?;
    if files.is_empty() {
        println!(
            "No .csv or .parquet files found in '{}'.",
            cfg.input_dir.display()
        );
        return Ok(false);
    }

    println!("Files found:");
    for (i, f) in files.iter().enumerate() {
        let name = f
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| f.display().to_string());
        println!("[{}] {}", i + 1, name);
    }
    print!("Select the file to process: ");
    io::stdout().flush()?;

    let answer = read_line(input)?;
    let Some(choice) = discover::parse_selection(&answer, files.len()) else {
        println!("Invalid option.");
        return Ok(false);
    };

    // errors here are reported and the operator may still restart
    if let Err(e) = run_once(cfg, files[choice].clone()) {
        error!("{:#}", e);
        println!("Error: {:#}", e);
    }
    Ok(true)
}

fn run_once(cfg: &Config, file: PathBuf) -> Result<RunSummary> {
    let mut sink = DirSink::new(&cfg.output_dir, cfg.format);
    let mut bars = BarProgress::new();
    let mut quiet = NoProgress;
    let observer: &mut dyn SplitObserver = if cfg.progress {
        &mut bars
    } else {
        &mut quiet
    };

    println!("Loading {} ...", file.display());
    let summary = split_file(&file, &mut sink, observer)
        .with_context(|| format!("splitting {}", file.display()))?;

    println!(
        "\nDone in {:.2} seconds: {} rows, {} files written to '{}'",
        summary.elapsed.as_secs_f64(),
        summary.rows,
        summary.files_written(),
        sink.out_dir().display()
    );
    let failed = summary.failed_brands();
    if !failed.is_empty() {
        println!("Failed brands ({}): {}", failed.len(), failed.join(", "));
    }
    Ok(summary)
}

fn read_line(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("reading from stdin")?;
    Ok(line)
}
