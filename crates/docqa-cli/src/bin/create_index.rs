//! Builds the vector index from the configured PDF directory.
//!
//! Takes no arguments. Exits with `0` when the index was created or was
//! already populated, and `1` on any failure.

#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use docqa_cli::config::{SourceConfig, load_env_file};
use docqa_cli::telemetry;
use docqa_core::config::{Settings, VectorBackendKind};
use docqa_rig::RagService;
use docqa_rig::loader::PdfLoader;
use docqa_vector::PopulateOptions;

const RULE_WIDTH: usize = 50;

#[tokio::main]
async fn main() -> ExitCode {
    println!("📚 Document Q&A Index Creator");
    println!("{}", "=".repeat(RULE_WIDTH));

    match run().await {
        Ok(()) => {
            println!();
            println!("🎉 Setup complete! Start the server with: docqa");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!();
            println!("❌ Setup failed: {err:#}");
            println!("Please check your API keys and documents and try again.");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let sources = SourceConfig::from_env();
    load_env_file(&sources.env_file);
    telemetry::init_tracing("warn")?;

    let settings = sources.resolve_settings()?;
    report_credentials(&settings);

    if settings.index.backend == VectorBackendKind::Memory {
        println!("⚠️  VECTOR_BACKEND is 'memory'; the index lives only as long as this process.");
    }

    let loader = PdfLoader::from_settings(&settings.documents);
    let files = loader.list_files()?;
    if files.is_empty() {
        anyhow::bail!(
            "no PDF files found in '{}'; add your documents there",
            loader.root().display()
        );
    }

    let names: Vec<String> = files
        .iter()
        .map(|path| {
            path.strip_prefix(loader.root())
                .unwrap_or(path)
                .display()
                .to_string()
        })
        .collect();
    println!("📄 Found {} PDF file(s): {}", files.len(), names.join(", "));
    println!();

    let rag = RagService::from_settings(settings).context("failed to create pipeline service")?;
    println!("⏳ Building index '{}'...", rag.index_name());

    let report = rag.ingest(PopulateOptions::default()).await?;
    for failure in &report.failures {
        println!("⚠️  Skipped {}: {}", failure.path, failure.message);
    }
    println!("✅ {}", report.summary());

    Ok(())
}

fn report_credentials(settings: &Settings) {
    let missing = settings.missing_credentials();
    for key in &missing {
        println!("❌ {key} is missing");
    }

    if !missing.is_empty() {
        println!("Add them to your environment, a .env file or secrets.toml:");
        for key in &missing {
            println!("{key}=your_{}", key.to_lowercase());
        }
        println!();
    }
}
