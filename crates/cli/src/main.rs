mod expand;
mod settings;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::expand::{cmd_expand, ExpandOptions};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "CACHEXP_LOG";

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Expand cache references in JSON documents.
#[derive(Parser)]
#[command(
    name = "cachexp",
    version,
    about = "Expand cache references in JSON documents"
)]
struct Cli {
    /// Output format for errors and reports (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log cache lookups to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand the references of a JSON document
    Expand {
        /// Path to the JSON document, or `-` for stdin
        input: PathBuf,
        /// Directory holding the cached entries
        #[arg(long)]
        store: Option<PathBuf>,
        /// Path to a cachexp.toml settings file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Maximum nesting depth of reference blocks
        #[arg(long)]
        depth: Option<u32>,
        /// Key marking a reference block
        #[arg(long)]
        expand_key: Option<String>,
        /// Key holding a list next to ordinary fields
        #[arg(long)]
        placeholder_key: Option<String>,
        /// Reference name to leave unexpanded (repeatable)
        #[arg(long = "exclude", value_name = "NAME")]
        exclude: Vec<String>,
        /// Base URL of an HTTP origin queried on cache misses
        #[arg(long)]
        origin: Option<String>,
        /// Header forwarded to the origin, as 'Name: value' (repeatable)
        #[arg(long = "header", value_name = "HEADER")]
        headers: Vec<String>,
        /// Origin request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Exit with an error when any reference failed to resolve
        #[arg(long)]
        strict: bool,
        /// Pretty-print the expanded document
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective settings as JSON
    Config {
        /// Path to a cachexp.toml settings file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Expand {
            input,
            store,
            config,
            depth,
            expand_key,
            placeholder_key,
            exclude,
            origin,
            headers,
            timeout_ms,
            strict,
            pretty,
        } => {
            cmd_expand(ExpandOptions {
                input: &input,
                settings: config.as_deref(),
                store,
                depth,
                expand_key,
                placeholder_key,
                exclude,
                origin,
                headers,
                timeout_ms,
                strict,
                pretty,
                output: cli.output,
                quiet: cli.quiet,
            });
        }
        Commands::Config { config } => {
            cmd_config(config.as_deref(), cli.output, cli.quiet);
        }
    }
}

/// Install the stderr subscriber. `CACHEXP_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(path: Option<&std::path::Path>, output: OutputFormat, quiet: bool) {
    let settings = match settings::load_settings(path) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    if let Err(e) = settings.expand.validate() {
        report_error(
            &format!("error: invalid configuration: {}", e),
            output,
            quiet,
        );
        process::exit(1);
    }

    match serde_json::to_string_pretty(&settings) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
