//! Scoped RAG command line
//!
//! Run with: cargo run -p scoped-rag --features cli --bin scoped-rag -- --help

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use scoped_rag::{
    config::RagConfig,
    engine::QueryEngine,
    ingestion::IngestPipeline,
    types::{Query, QueryOutcome},
};

#[derive(Parser, Debug)]
#[command(name = "scoped-rag", version, about = "Role-scoped question answering over department documents")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "SCOPED_RAG_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and chunk a document tree, printing chunk counts per department
    Ingest {
        /// Root directory; each subdirectory is a department
        dir: PathBuf,
    },
    /// Build the indexes and answer one question
    Ask {
        /// Role the question is asked under
        #[arg(long)]
        role: String,
        /// Document root, defaults to ingestion.data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// The question
        question: String,
    },
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    Ok(pb)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scoped_rag=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RagConfig::from_file(path)?,
        None => RagConfig::default(),
    };

    match cli.command {
        Commands::Ingest { dir } => {
            let pipeline = IngestPipeline::new(&config.ingestion)?;
            let pb = spinner(&format!("Ingesting {}", dir.display()))?;
            let (_, report) = pipeline.run_blocking(dir).await?;
            pb.finish_and_clear();

            for (department, count) in &report.chunks_per_department {
                println!("{:<20} {:>6} chunks", style(department).cyan(), count);
            }
            println!(
                "{} {} files, {} chunks",
                style("Loaded").green().bold(),
                report.files_loaded,
                report.total_chunks()
            );
            for path in &report.files_unsupported {
                println!("{} {}", style("skipped").yellow(), path);
            }
            for failure in &report.failures {
                println!("{} {}: {}", style("failed").red(), failure.path, failure.error);
            }
        }
        Commands::Ask {
            role,
            data_dir,
            question,
        } => {
            let engine = QueryEngine::from_config(&config)?;
            let root = data_dir.unwrap_or_else(|| config.ingestion.data_dir.clone());

            let pb = spinner("Building indexes")?;
            let summary = engine.refresh_from(&root).await?;
            pb.set_message(format!(
                "Indexed {} chunks, answering",
                summary.ingest.total_chunks()
            ));

            let response = engine.answer(&Query::new(question, role)).await?;
            pb.finish_and_clear();

            let label = match response.outcome {
                QueryOutcome::Answered => style("Answer").green().bold(),
                QueryOutcome::NoMatches => style("No matches").yellow().bold(),
                QueryOutcome::Degraded => style("Degraded").red().bold(),
            };
            println!("{}\n{}\n", label, response.answer);

            for (i, citation) in response.citations.iter().enumerate() {
                println!(
                    "[{}] {} ({}) score {:.3}\n    {}",
                    i + 1,
                    style(&citation.filename).cyan(),
                    citation.department,
                    citation.relevance_score,
                    style(&citation.summary).dim()
                );
            }
        }
    }

    Ok(())
}
