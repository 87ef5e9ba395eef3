//! Batch orchestrator for the mailsift pipeline.
//!
//! Reads a JSON array of raw mails, classifies each one against the brand
//! registry, and writes the same records back with the derived fields merged
//! in. All the analysis lives in `mailsift-classify`; this binary is only
//! the I/O shell around it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use mailsift_classify::Classifier;
use mailsift_core::{load_registry, BrandRegistry, Classification, MailRecord};

#[derive(Debug, Parser)]
#[command(name = "mailsift")]
#[command(about = "Heuristic receipt and subscription classifier for mail batches")]
struct Cli {
    /// Path to the brand registry.
    #[arg(
        long,
        env = "MAILSIFT_REGISTRY",
        default_value = "./config/brands.yaml",
        global = true
    )]
    registry: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify a JSON batch of mails and write the annotated batch.
    Classify {
        /// Input file: a JSON array of mail records.
        #[arg(long, env = "MAILSIFT_INPUT")]
        input: PathBuf,
        /// Output file for the annotated records.
        #[arg(long, env = "MAILSIFT_OUTPUT")]
        output: PathBuf,
    },
    /// Load and validate the brand registry, then exit.
    Validate,
}

/// Mail metadata as it appears in the input batch. Unknown keys are carried
/// through to the output untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MailMetadata {
    #[serde(default)]
    from: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    date: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MailEntry {
    metadata: MailMetadata,
    #[serde(default)]
    body: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// One output record: the input mail with its classification merged in.
#[derive(Debug, Serialize)]
struct AnnotatedMail {
    #[serde(flatten)]
    mail: MailEntry,
    #[serde(flatten)]
    classification: Classification,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let registry = load_registry(&cli.registry)
        .with_context(|| format!("loading brand registry from {}", cli.registry.display()))?;
    tracing::info!(
        brands = registry.brands.len(),
        path = %cli.registry.display(),
        "brand registry loaded"
    );

    match cli.command {
        Commands::Validate => {
            println!("registry ok: {} brands", registry.brands.len());
            Ok(())
        }
        Commands::Classify { input, output } => classify_batch(&registry, &input, &output),
    }
}

fn classify_batch(registry: &BrandRegistry, input: &Path, output: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("reading mail batch from {}", input.display()))?;
    let mails: Vec<MailEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing mail batch from {}", input.display()))?;

    let classifier = Classifier::new(registry);
    let count = mails.len();

    let annotated: Vec<AnnotatedMail> = mails
        .into_iter()
        .map(|mail| {
            let record = MailRecord {
                sender: mail.metadata.from.clone(),
                subject: mail.metadata.subject.clone(),
                meta_date: mail.metadata.date.clone(),
                body: mail.body.clone(),
            };
            let classification = classifier.classify(&record);
            AnnotatedMail {
                mail,
                classification,
            }
        })
        .collect();

    let json = serde_json::to_string_pretty(&annotated).context("serializing annotated batch")?;
    fs::write(output, json)
        .with_context(|| format!("writing annotated batch to {}", output.display()))?;

    tracing::info!(count, output = %output.display(), "wrote classified batch");
    Ok(())
}
