mod commands;
mod settings;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Provenance record store client.
#[derive(Parser)]
#[command(name = "provstore", version, about = "Provenance record store client")]
struct Cli {
    /// Record store to use: a JSON file path, an http(s) URL or a connection file
    #[arg(long, global = true)]
    store: Option<String>,

    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Log debug detail to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List projects
    Projects,

    /// Show a project's long name and description
    Info { project: String },

    /// Create an empty project
    CreateProject {
        name: String,
        #[arg(long, default_value = "")]
        long_name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Replace a project's long name and description
    UpdateProject {
        name: String,
        #[arg(long, default_value = "")]
        long_name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List records, optionally only those carrying any of the given tags
    List {
        project: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show one record
    Show { project: String, label: String },

    /// Save records from a JSON file holding one record or an array of them
    Import { project: String, file: PathBuf },

    /// Print every record of a project as a JSON array
    Export { project: String },

    /// Delete one record
    Delete { project: String, label: String },

    /// Delete every record carrying a tag
    DeleteTag { project: String, tag: String },

    /// Print the label of the most recent record
    Latest { project: String },

    /// Copy records from another store into this one
    Sync {
        /// Project to copy (omit with --all)
        project: Option<String>,
        /// Store to copy from
        #[arg(long)]
        from: String,
        /// Copy every project
        #[arg(long)]
        all: bool,
    },

    /// Copy the store somewhere safe
    Backup,

    /// Delete every project and record
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Print which backend would open a store URI
    Backend { uri: String },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match Settings::from_env(cli.store.clone(), cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    debug!(
        store = %settings.store,
        envelope_hosts = ?settings.http.envelope_hosts,
        timeout = ?settings.http.timeout,
        "resolved settings"
    );
    let registry = provstore_http::default_registry(&settings.http);
    let ctx = commands::Context {
        registry: &registry,
        store_uri: &settings.store,
        output: cli.output,
        quiet: cli.quiet,
    };

    if let Err(msg) = commands::run(&ctx, cli.command) {
        report_error(&msg, cli.output, cli.quiet);
        process::exit(1);
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
