use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use chart_cli::commands::{config_ops, decode_ops};
use chart_cli::trace_init::init_tracing;

#[derive(Parser)]
#[command(name = "chartool", about = "Chart decoder front-end")]
struct Cli {
    /// Write JSON trace logs to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode the sentences of a JSON request file
    Decode {
        /// Request file: sentences with their rule applications
        input: String,
        /// Settings TOML (defaults are embedded)
        #[arg(long)]
        config: Option<String>,
        /// Derivations per sentence (default: nbest.size)
        #[arg(short, long)]
        n: Option<usize>,
        /// Only list derivations with distinct output (default: nbest.distinct)
        #[arg(long)]
        distinct: Option<bool>,
        /// Worker threads per sentence (default: search.threads)
        #[arg(long)]
        threads: Option<usize>,
        /// Sentences decoded concurrently
        #[arg(short, long, default_value = "1")]
        jobs: usize,
        /// Output JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
    /// Decoder settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Export default settings as TOML
    Export,
    /// Validate a custom settings TOML file
    Validate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let guard = init_tracing(cli.log_dir.as_deref());

    match cli.command {
        Command::Decode {
            input,
            config,
            n,
            distinct,
            threads,
            jobs,
            json,
        } => {
            let opts = decode_ops::DecodeOptions {
                nbest: n,
                distinct,
                threads,
                jobs,
                json,
            };
            if !decode_ops::decode_cmd(&input, config.as_deref(), &opts) {
                drop(guard);
                process::exit(1);
            }
        }
        Command::Settings { action } => match action {
            SettingsAction::Export => config_ops::settings_export(),
            SettingsAction::Validate { file } => config_ops::settings_validate(&file),
        },
    }
}
