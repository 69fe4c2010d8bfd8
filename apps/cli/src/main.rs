use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use deckcast_core::PlayerConfig;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod backends;
mod commands;

#[derive(Parser)]
#[command(name = "deckcast")]
#[command(about = "Narrate, time and record JSON slide-deck presentations")]
struct Cli {
    /// Config file (JSON). Defaults to the user config dir when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scripts in the scripts directory
    List {
        /// Load and validate every listed script
        #[arg(long)]
        check: bool,
    },

    /// Validate a script and print its page timeline
    Plan {
        /// Script name, path or URL
        script: String,
    },

    /// Play a script in the terminal with narration
    Play {
        /// Script name, path or URL
        script: String,

        /// Narration language, e.g. "en-US". Defaults to the script's language
        #[arg(short, long)]
        lang: Option<String>,

        /// Start recording and playing right away
        #[arg(long, conflicts_with = "no_capture")]
        record: bool,

        /// Start playing right away
        #[arg(long)]
        autoplay: bool,

        /// Disable screen recording
        #[arg(long)]
        no_capture: bool,

        /// Where recordings are saved
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Play a script unattended from start to finish and save the recording
    Record {
        /// Script name, path or URL
        script: String,

        /// Narration language recorded in the session. Defaults to the script's language
        #[arg(short, long)]
        lang: Option<String>,

        /// Run the timeline without capturing the screen
        #[arg(long)]
        no_capture: bool,

        /// Where recordings are saved
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

pub(crate) fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "deckcast=debug,deckcast_core=debug"
    } else {
        "deckcast=info,deckcast_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match PlayerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    println!(
        "\n{}  {}\n",
        style("deckcast").cyan().bold(),
        style("Presentation Player").dim()
    );

    match cli.command {
        Commands::List { check } => commands::list::run(&config, check).await,
        Commands::Plan { script } => commands::plan::run(&config, &script).await,
        Commands::Play {
            script,
            lang,
            record,
            autoplay,
            no_capture,
            output_dir,
        } => {
            let args = commands::play::PlayArgs {
                script,
                lang,
                record,
                autoplay,
                capture: !no_capture,
                output_dir: output_dir.unwrap_or_else(|| config.paths.output_dir()),
            };
            commands::play::run(&config, args).await
        }
        Commands::Record {
            script,
            lang,
            no_capture,
            output_dir,
        } => {
            let args = commands::record::RecordArgs {
                script,
                lang,
                capture: !no_capture,
                output_dir: output_dir.unwrap_or_else(|| config.paths.output_dir()),
            };
            commands::record::run(&config, args).await
        }
    }
}
