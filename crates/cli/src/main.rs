// ABOUTME: CLI for extracting XPath-driven features from HTML files, crawl directories, and record streams.
// ABOUTME: Loads a criteria config, runs the chosen mode, and writes JSON or CSV to stdout or a file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pagefeat::batch::pipeline::{open_input, run_lines, LabeledRow};
use pagefeat::batch::walk::run_directory;
use pagefeat::{load_criteria_file, write_csv, CsvSink, FeatureExtractor, WalkOptions};
use serde_json::json;
use tracing::{info, warn};

/// Extract counted and textual features from HTML using XPath criteria.
#[derive(Parser, Debug)]
#[command(name = "pagefeat")]
#[command(about = "Extract XPath-driven features from HTML documents", long_about = None)]
struct Cli {
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log per-document progress.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Criteria configuration (JSON with features_to_count / text_to_extract).
    #[arg(short, long)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the feature names (CSV column order), one per line.
    Names {
        #[command(flatten)]
        config: ConfigArgs,

        /// Meta feature names to declare before the criteria.
        #[arg(long = "meta")]
        meta: Vec<String>,
    },

    /// Extract features from HTML files and print one JSON object per file.
    Extract {
        #[command(flatten)]
        config: ConfigArgs,

        /// HTML files to process.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Walk a crawl directory (HTML plus request/response sidecars) and write CSV.
    Walk {
        #[command(flatten)]
        config: ConfigArgs,

        /// Root of the crawl directory.
        dir: PathBuf,

        /// Output CSV path (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process `<base64>,<label>` record files (plain or .gz).
    Pipeline {
        #[command(flatten)]
        config: ConfigArgs,

        /// Record files to read.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Stop after this many successfully extracted records.
        #[arg(long)]
        limit: Option<usize>,

        /// Emit CSV with a leading label column instead of JSON lines.
        #[arg(long, default_value_t = false)]
        csv: bool,

        /// Output path (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("error: {err:#}");
        return ExitCode::from(1);
    }

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("PAGEFEAT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Names { config, meta } => {
            let extractor = FeatureExtractor::from_config_file(&config.config, &meta)
                .with_context(|| format!("loading {}", config.config.display()))?;
            let mut out = io::stdout().lock();
            for name in extractor.feature_names() {
                writeln!(out, "{name}")?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Extract { config, files } => {
            let mut extractor = FeatureExtractor::from_config_file(&config.config, ["file"])
                .with_context(|| format!("loading {}", config.config.display()))?;
            let mut out = io::stdout().lock();
            let mut had_error = false;

            for file in &files {
                let name = file.display().to_string();
                match extractor.accumulate_file(file, &[("file", name.as_str())]) {
                    Ok(row) => writeln!(out, "{}", serde_json::to_string(row)?)?,
                    Err(e) => {
                        warn!(file = %name, error = %e, "cannot extract file");
                        had_error = true;
                    }
                }
                // Already printed.
                extractor.take_rows();
            }

            Ok(if had_error {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }

        Command::Walk {
            config,
            dir,
            output,
        } => {
            let opts = WalkOptions::default();
            let mut extractor =
                FeatureExtractor::from_config_file(&config.config, opts.meta_feature_names())
                    .with_context(|| format!("loading {}", config.config.display()))?;

            let summary = run_directory(&mut extractor, &dir, &opts)
                .with_context(|| format!("walking {}", dir.display()))?;
            eprintln!("Skipped {} of {}", summary.skipped, summary.total);

            let writer = open_output(output.as_deref())?;
            write_csv(writer, &extractor.feature_names(), extractor.rows())
                .context("writing CSV")?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Pipeline {
            config,
            inputs,
            limit,
            csv,
            output,
        } => {
            let criteria = load_criteria_file(&config.config)
                .with_context(|| format!("loading {}", config.config.display()))?;
            let names: Vec<String> = criteria.names().map(str::to_string).collect();
            let writer = open_output(output.as_deref())?;
            let mut out = if csv {
                RecordOut::Csv(CsvSink::with_leading_columns(writer, &["label"], &names)?)
            } else {
                RecordOut::Json(writer)
            };

            let limit = limit.unwrap_or(usize::MAX);
            let (mut extracted, mut skipped) = (0usize, 0usize);

            'inputs: for input in &inputs {
                if extracted >= limit {
                    break;
                }
                let reader = open_input(input)
                    .with_context(|| format!("opening {}", input.display()))?;
                for result in run_lines(&criteria, reader) {
                    match result {
                        Ok(labeled) => {
                            out.write(&labeled)?;
                            extracted += 1;
                            if extracted >= limit {
                                break 'inputs;
                            }
                        }
                        Err(e) => {
                            warn!(input = %input.display(), error = %e, "skipping record");
                            skipped += 1;
                        }
                    }
                }
            }

            out.finish()?;
            info!(extracted, skipped, "pipeline finished");
            eprintln!("Skipped {} of {}", skipped, extracted + skipped);
            Ok(ExitCode::SUCCESS)
        }
    }
}

enum RecordOut<W: Write> {
    Json(W),
    Csv(CsvSink<W>),
}

impl<W: Write> RecordOut<W> {
    fn write(&mut self, labeled: &LabeledRow) -> Result<()> {
        match self {
            RecordOut::Json(w) => {
                let line = json!({ "label": labeled.label, "features": labeled.features });
                writeln!(w, "{line}")?;
            }
            RecordOut::Csv(sink) => sink.write_row_with(&[labeled.label.as_str()], &labeled.features)?,
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        let mut w = match self {
            RecordOut::Json(w) => w,
            RecordOut::Csv(sink) => sink.finish()?,
        };
        w.flush()?;
        Ok(())
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}
