//! Process command - parse a single bill document.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use utilbill_core::bill::rules::format_clp_amount;
use utilbill_core::source::read_document;
use utilbill_core::{BillParser, ParsedBill, ProviderParser};

use super::{load_config, Provider};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (text or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Bill provider
    #[arg(short, long, value_enum)]
    provider: Provider,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let document = read_document(&args.input);
    let parser = ProviderParser::from_config(args.provider.into(), &config.extraction);
    let parsed = parser.parse(&document.text, &document.id)?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&parsed)?,
        OutputFormat::Text => format_bill_text(&parsed),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    let missing = parsed.missing_fields();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
        eprintln!(
            "{} Incomplete bill, missing: {}",
            style("!").yellow(),
            names.join(", ")
        );
    }
    for anomaly in &parsed.anomalies {
        eprintln!("{} {}", style("!").yellow(), anomaly);
    }

    info!("Processed {} in {:?}", document.id, start.elapsed());

    Ok(())
}

fn format_bill_text(bill: &ParsedBill) -> String {
    let mut output = String::new();
    let dash = "-".to_string();

    let _ = writeln!(output, "Document: {}", bill.source_document_id);
    let _ = writeln!(output, "Provider: {}", bill.meter_type);
    let _ = writeln!(
        output,
        "Account:  {}",
        bill.account_number.as_ref().unwrap_or(&dash)
    );
    let _ = writeln!(
        output,
        "Period:   {}",
        bill.period().map(|p| p.to_string()).unwrap_or_else(|| dash.clone())
    );
    let _ = writeln!(
        output,
        "Total:    {}",
        bill.total_amount.map(format_clp_amount).unwrap_or_else(|| dash.clone())
    );
    if let Some(tarifa) = &bill.tarifa {
        let _ = writeln!(output, "Tarifa:   {}", tarifa);
    }
    if let Some(invoice) = &bill.invoice_number {
        let _ = writeln!(output, "Boleta:   {}", invoice);
    }
    if let Some(address) = &bill.service_address {
        let _ = writeln!(output, "Address:  {}", address);
    }

    if !bill.charges.is_empty() {
        output.push('\n');
        output.push_str("Charges:\n");
        for charge in &bill.charges {
            let _ = writeln!(
                output,
                "  {:<40} {:>12}  {}",
                charge.name,
                format_clp_amount(charge.value),
                charge.value_type
            );
        }
    }

    output
}
