//! pinexam CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pinexam", version, about = "Pin-based assessment engine")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and a demo course
    Init,

    /// Validate course documents
    Validate {
        /// Path to a course JSON file or a directory of them
        #[arg(long)]
        course: PathBuf,
    },

    /// List available courses
    Courses,

    /// Start a new journal under a fresh pin
    Start {
        /// Course name
        #[arg(long)]
        course: String,

        /// Course language (default: from config)
        #[arg(long)]
        language: Option<String>,

        /// Seed for pin and group draws
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the journal of a pin as JSON
    Show {
        #[arg(long)]
        pin: String,
    },

    /// Record an answer
    Answer {
        #[arg(long)]
        pin: String,

        /// Set id
        #[arg(long)]
        set: String,

        /// Test id
        #[arg(long)]
        test: String,

        /// Answer as JSON, e.g. '[true,false]' or '[[5,6]]'
        #[arg(long)]
        value: String,
    },

    /// Recompute and store results
    Update {
        #[arg(long)]
        pin: String,
    },

    /// Lock results and print the validation code
    Lock {
        #[arg(long)]
        pin: String,

        /// Seed for the validation code
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the result sheet
    Report {
        #[arg(long)]
        pin: String,

        /// Output directory
        #[arg(long, default_value = "./pinexam-results")]
        output: PathBuf,

        /// Output format: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,
    },
}

fn init_tracing(config: Option<&std::path::Path>) {
    let directive = pinexam_store::config::load_config_from(config)
        .map(|c| c.log_filter)
        .unwrap_or_else(|_| "pinexam=info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.config.as_deref());

    let config = cli.config;
    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { course } => commands::validate::execute(course),
        Commands::Courses => commands::courses::execute(config),
        Commands::Start {
            course,
            language,
            seed,
        } => commands::start::execute(config, course, language, seed).await,
        Commands::Show { pin } => commands::show::execute(config, pin).await,
        Commands::Answer {
            pin,
            set,
            test,
            value,
        } => commands::answer::execute(config, pin, set, test, value).await,
        Commands::Update { pin } => commands::update::execute(config, pin).await,
        Commands::Lock { pin, seed } => commands::lock::execute(config, pin, seed).await,
        Commands::Report {
            pin,
            output,
            format,
        } => commands::report::execute(config, pin, output, format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
