//! examguard CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "examguard",
    version,
    about = "Exam integrity analysis: trap-rule scoring and answer collusion detection"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a cohort of exam answers
    Analyze {
        /// JSON answer export
        #[arg(long)]
        answers: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rule table TOML (overrides the config)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Combined similarity at which a pair is reported (0.0-1.0)
        #[arg(long)]
        similarity_threshold: Option<f64>,

        /// Per-answer trap score at which an answer is flagged (0-100)
        #[arg(long)]
        ai_threshold: Option<u32>,

        /// Max concurrent analysis tasks
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory
        #[arg(long, default_value = "./examguard-results")]
        output: PathBuf,

        /// Output format: json, html, csv, md, all
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Score a single answer against the trap rules
    #[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
    Score {
        /// Answer text
        #[arg(long)]
        text: Option<String>,

        /// File containing the answer text
        #[arg(long)]
        file: Option<PathBuf>,

        /// Rule table TOML
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two answer files for similarity
    Compare {
        /// First answer file
        #[arg(long)]
        a: PathBuf,

        /// Second answer file
        #[arg(long)]
        b: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a rule table TOML file
    Validate {
        /// Path to the rule table
        #[arg(long)]
        rules: PathBuf,
    },

    /// Create a starter config and rule table
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examguard=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            answers,
            config,
            rules,
            similarity_threshold,
            ai_threshold,
            parallelism,
            output,
            format,
        } => {
            commands::analyze::execute(commands::analyze::AnalyzeArgs {
                answers,
                config,
                rules,
                similarity_threshold,
                ai_threshold,
                parallelism,
                output,
                format,
            })
            .await
        }
        Commands::Score {
            text,
            file,
            rules,
            json,
        } => commands::score::execute(text, file, rules, json),
        Commands::Compare { a, b, json } => commands::compare::execute(a, b, json),
        Commands::Validate { rules } => commands::validate::execute(rules),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
