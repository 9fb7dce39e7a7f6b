//! redpen CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "redpen", version, about = "Deterministic assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize an assessment and a blank answers file
    Generate {
        /// Subject to assess (defaults to the configured subject)
        #[arg(long)]
        subject: Option<String>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Evaluate a candidate's answers
    Evaluate {
        /// Assessment JSON
        #[arg(long)]
        assessment: PathBuf,

        /// Answers JSON (an array of candidate answers)
        #[arg(long)]
        answers: PathBuf,

        /// Candidate id recorded on the report
        #[arg(long)]
        candidate: Option<String>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Score without the subject's reviewer calibration
        #[arg(long)]
        no_calibration: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Override one question's score and update calibration
    Override {
        /// Report JSON, rewritten in place
        #[arg(long)]
        report: PathBuf,

        /// Assessment JSON the report was produced from
        #[arg(long)]
        assessment: PathBuf,

        /// Question id (e.g. "q-3")
        #[arg(long)]
        question: String,

        /// New score, 0 to 10
        #[arg(long)]
        score: u32,

        /// Reviewer note
        #[arg(long)]
        note: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replace one question with a refined variant
    Regenerate {
        /// Assessment JSON
        #[arg(long)]
        assessment: PathBuf,

        /// Question id (e.g. "q-3")
        #[arg(long)]
        question: String,

        /// Where to write the updated assessment (defaults to in place)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate an assessment, and optionally a report against it
    Validate {
        /// Assessment JSON
        #[arg(long)]
        assessment: PathBuf,

        /// Report JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show reviewer calibration for a subject
    Calibration {
        /// Subject (defaults to the configured subject)
        #[arg(long)]
        subject: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("redpen=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            subject,
            output,
            config,
        } => commands::generate::execute(subject, output, config).await,
        Commands::Evaluate {
            assessment,
            answers,
            candidate,
            output,
            format,
            no_calibration,
            config,
        } => {
            commands::evaluate::execute(
                assessment,
                answers,
                candidate,
                output,
                format,
                no_calibration,
                config,
            )
            .await
        }
        Commands::Override {
            report,
            assessment,
            question,
            score,
            note,
            config,
        } => commands::override_score::execute(report, assessment, question, score, note, config),
        Commands::Regenerate {
            assessment,
            question,
            output,
            config,
        } => commands::regenerate::execute(assessment, question, output, config).await,
        Commands::Validate { assessment, report } => {
            commands::validate::execute(assessment, report)
        }
        Commands::Calibration { subject, config } => {
            commands::calibration::execute(subject, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
