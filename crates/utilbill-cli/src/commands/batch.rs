//! Batch command - parse and normalize a directory of bills.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use utilbill_core::{
    BatchOutcome, BatchRunner, BatchSummary, BillNormalizer, BillStore, DocumentSource,
    MemoryStore, ProviderParser,
};

use super::{load_config, Provider};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input directory
    #[arg(required = true)]
    input: PathBuf,

    /// Bill provider of every document in the directory
    #[arg(short, long, value_enum)]
    provider: Provider,

    /// Number of parallel workers (default from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Wall-clock budget for the run, in seconds
    #[arg(long)]
    time_budget: Option<u64>,

    /// Write a per-document summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Print outcomes as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.input.display());
    }

    let documents = DocumentSource::from_dir(&args.input)
        .with_extensions(config.source.extensions.clone())
        .load()?;

    if documents.is_empty() {
        anyhow::bail!("No documents found in {}", args.input.display());
    }

    if !args.json {
        println!(
            "{} Found {} documents to process",
            style("ℹ").blue(),
            documents.len()
        );
    }

    let jobs = args.jobs.unwrap_or(config.batch.jobs);
    let time_budget = args
        .time_budget
        .map(Duration::from_secs)
        .or_else(|| config.time_budget());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(format!("Processing {} documents", documents.len()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let normalizer = BillNormalizer::new(MemoryStore::new());
    let parser = ProviderParser::from_config(args.provider.into(), &config.extraction);
    let outcomes = BatchRunner::new(parser, &normalizer)
        .with_jobs(jobs)
        .with_time_budget(time_budget)
        .run(&documents);

    pb.finish_and_clear();

    let summary = BatchSummary::from_outcomes(&outcomes);

    if let Some(path) = &args.summary {
        write_summary(path, &outcomes, normalizer.store())?;
        debug!("Wrote summary to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    let store = normalizer.store();
    println!();
    println!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        summary.total(),
        start.elapsed()
    );
    println!(
        "   {} success, {} partial, {} fatal, {} skipped",
        style(summary.success).green(),
        style(summary.partial_failure).yellow(),
        style(summary.fatal).red(),
        style(summary.skipped).dim()
    );
    let bills: usize = store
        .meters()
        .iter()
        .map(|m| store.bills_for_meter(m.id).len())
        .sum();
    println!("   {} meters, {} bills stored", store.meters().len(), bills);

    let problems: Vec<&BatchOutcome> = outcomes.iter().filter(|o| !o.is_success()).collect();
    if !problems.is_empty() {
        println!();
        println!("{}", style("Not stored:").yellow());
        for outcome in problems {
            println!("  - {}: {}", outcome.source_document_id(), describe(outcome));
        }
    }

    if let Some(path) = &args.summary {
        println!();
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            path.display()
        );
    }

    Ok(())
}

fn describe(outcome: &BatchOutcome) -> String {
    match outcome {
        BatchOutcome::Success { bill_id, .. } => format!("bill {}", bill_id),
        BatchOutcome::PartialFailure { reasons, .. } => {
            let names: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
            format!("missing {}", names.join(", "))
        }
        BatchOutcome::Fatal { reason, .. } => reason.clone(),
        BatchOutcome::Skipped { .. } => "skipped, time budget exhausted".to_string(),
    }
}

fn write_summary(
    path: &Path,
    outcomes: &[BatchOutcome],
    store: &impl BillStore,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "document",
        "status",
        "bill_id",
        "account_number",
        "period",
        "total",
        "detail",
    ])?;

    for outcome in outcomes {
        let (bill_id, account, period, total) = match outcome {
            BatchOutcome::Success { bill_id, .. } => match store.bill(*bill_id) {
                Some(bill) => (
                    bill_id.to_string(),
                    store
                        .meter(bill.meter_id)
                        .map(|m| m.client_number)
                        .unwrap_or_default(),
                    bill.period().to_string(),
                    bill.total_to_pay.to_string(),
                ),
                None => (bill_id.to_string(), String::new(), String::new(), String::new()),
            },
            BatchOutcome::PartialFailure { parsed, .. } => (
                String::new(),
                parsed.account_number.clone().unwrap_or_default(),
                parsed.period().map(|p| p.to_string()).unwrap_or_default(),
                parsed.total_amount.map(|t| t.to_string()).unwrap_or_default(),
            ),
            _ => (String::new(), String::new(), String::new(), String::new()),
        };
        let detail = if outcome.is_success() {
            String::new()
        } else {
            describe(outcome)
        };

        wtr.write_record([
            outcome.source_document_id(),
            outcome.kind(),
            bill_id.as_str(),
            account.as_str(),
            period.as_str(),
            total.as_str(),
            detail.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
