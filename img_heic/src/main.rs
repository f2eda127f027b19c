use clap::{Parser, ValueEnum};
use console::style;
use img_heic::logging::{init_logging, LogConfig};
use img_heic::{
    print_summary_report, run_batch, BatchConfig, BatchOutcome, HeicCodec, DEFAULT_QUALITY,
};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "img-heic")]
#[command(version, about = "Bulk JPEG to HEIC converter", long_about = None)]
struct Cli {
    /// Directory to scan for .jpg/.jpeg files (prompted for when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Lossy HEVC quality level (0-100)
    #[arg(short, long, default_value_t = DEFAULT_QUALITY)]
    quality: u8,

    /// Write converted files here instead of the desktop heic folder
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Do not open the output folder when done
    #[arg(long)]
    no_open: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging("img_heic", LogConfig::default()) {
        eprintln!("⚠️  Could not initialize logging: {}", e);
    }

    let input = match cli.input {
        Some(path) => path,
        None => prompt_for_input()?,
    };
    let input = expand_home(&input);
    // Canonicalize when possible; a nonexistent path fails the check below.
    let input = input.canonicalize().unwrap_or(input);

    if !input.is_dir() {
        eprintln!(
            "{} '{}' is not a valid directory.",
            style("Error:").red().bold(),
            input.display()
        );
        std::process::exit(1);
    }

    let config = BatchConfig {
        input_dir: input.clone(),
        output_dir: cli.output.clone(),
        quality: cli.quality,
        quiet: cli.format == OutputFormat::Json,
        verbose: cli.verbose,
    };

    let codec = HeicCodec::new();

    match run_batch(&codec, &config)? {
        BatchOutcome::NoFilesFound => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&json!({ "found": 0 }))?);
            } else {
                println!("No .jpg/.jpeg files found. Exiting.");
            }
        }
        BatchOutcome::Completed {
            result,
            output_dir,
            elapsed,
        } => {
            info!(
                succeeded = result.succeeded,
                failed = result.failed,
                skipped = result.skipped,
                "batch finished"
            );
            match cli.format {
                OutputFormat::Human => {
                    print_summary_report(&result, elapsed, "JPEG → HEIC");
                    println!(
                        "\n✅ All done! Your HEIC files are in: {}",
                        output_dir.display()
                    );
                    if !cli.no_open {
                        reveal_output_dir(&output_dir);
                    }
                }
                OutputFormat::Json => {
                    let report = json!({
                        "input_dir": input.display().to_string(),
                        "output_dir": output_dir.display().to_string(),
                        "elapsed_seconds": elapsed.as_secs_f64(),
                        "result": result,
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
    }

    Ok(())
}

/// Thin interactive adapter used when no INPUT argument is given.
fn prompt_for_input() -> anyhow::Result<PathBuf> {
    print!("Enter full path of the folder with JPG/JPEG files:\n> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(PathBuf::from(line.trim()))
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if s == "~" {
        return dirs::home_dir().unwrap_or_else(|| path.to_path_buf());
    }
    if let Some(rest) = s.strip_prefix("~/").or_else(|| s.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Best effort only; a headless session has no file browser and that is fine.
fn reveal_output_dir(dir: &Path) {
    if let Err(e) = open::that_detached(dir) {
        tracing::debug!("could not open output folder: {}", e);
    }
}
