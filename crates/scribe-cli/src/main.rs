use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt};

use scribe_core::config_file::{self, ConfigFile};
use scribe_core::{Config, OcrEngine, StrategyKind};

mod output;

use output::ColorMode;

/// Scribe - extract text from images and PDFs with ordered OCR fallback
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from an image or PDF
    Extract {
        /// Path to the image or PDF
        file_path: PathBuf,

        /// OCR engine for images and rasterized pages (tesseract, gemini, mistral)
        #[arg(long)]
        engine: Option<OcrEngine>,

        /// Tesseract language code(s), e.g. eng or eng+deu
        #[arg(long)]
        lang: Option<String>,

        /// Comma-separated PDF strategy order
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,

        /// Linear render scale for rasterized pages
        #[arg(long)]
        scale: Option<f32>,

        /// Write the text to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Log progress and list every strategy attempt on failure
        #[arg(short, long)]
        verbose: bool,
    },

    /// List PDF strategies and whether they are available here
    Strategies {
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the current settings (without API keys) to the platform config file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Command::Extract { verbose: true, .. });
    init_logging(verbose);

    match cli.command {
        Command::Extract {
            file_path,
            engine,
            lang,
            strategies,
            scale,
            output,
            no_color,
            verbose,
        } => {
            let config = resolve_config(engine, lang, strategies, scale)?;
            extract(&file_path, &config, output, no_color, verbose)
        }
        Command::Strategies { no_color } => {
            let config = Config::load()?;
            let color = ColorMode(!no_color);
            let statuses = scribe_ingest::describe(&config);
            output::print_strategies(&mut std::io::stdout(), &statuses, color)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { save } => {
            let config = Config::load()?;
            show_config(&config, save)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// CLI flags > environment > config files > defaults.
fn resolve_config(
    engine: Option<OcrEngine>,
    lang: Option<String>,
    strategies: Vec<StrategyKind>,
    scale: Option<f32>,
) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(engine) = engine {
        config.ocr_engine = engine;
    }
    if let Some(lang) = lang {
        config.ocr_language = lang;
    }
    if !strategies.is_empty() {
        config.strategy_order = strategies;
    }
    if let Some(scale) = scale {
        config.render_scale = config_file::check_scale(scale)?;
    }
    tracing::debug!(?config, "configuration resolved");
    Ok(config)
}

fn extract(
    file_path: &Path,
    config: &Config,
    output: Option<PathBuf>,
    no_color: bool,
    verbose: bool,
) -> anyhow::Result<ExitCode> {
    let color = ColorMode(!no_color);
    let extractor = scribe_ingest::build_extractor(config);

    let spinner = if no_color || verbose {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")?);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    };
    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.display().to_string());
    spinner.set_message(format!("Extracting text from {name}..."));

    let result = scribe_ingest::extract_path(file_path, &extractor);
    spinner.finish_and_clear();

    match result {
        Ok(text) => {
            if let Some(path) = output {
                std::fs::write(&path, format!("{text}\n"))?;
                output::print_saved(&mut std::io::stderr(), &path, text.chars().count(), color)?;
            } else {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{text}")?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            output::print_failure(&mut std::io::stderr(), &err, verbose, color)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn show_config(config: &Config, save: bool) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    match config_file::config_path() {
        Some(path) => writeln!(stdout, "Config file: {}", path.display())?,
        None => writeln!(stdout, "Config file: (no platform config directory)")?,
    }
    writeln!(stdout, "Local overrides: .scribe.toml")?;
    writeln!(stdout)?;
    writeln!(stdout, "{config:#?}")?;

    if save {
        let path = config_file::save_config(&ConfigFile::from_config(config))?;
        writeln!(stdout)?;
        writeln!(stdout, "Saved to {}", path.display())?;
    }
    Ok(())
}
