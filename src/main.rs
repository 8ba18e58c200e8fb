//! CLI for listing and filling PDF form fields.
//!
//! `pdf-autofill fields form.pdf` shows the names a value mapping needs;
//! `pdf-autofill fill form.pdf out.pdf --set Name=Alice` writes a filled copy
//! of the first page.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use pdf_autofill::{FillerConfig, FormFiller, UnknownFieldPolicy};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pdf-autofill")]
#[command(version, about = "Fill PDF form fields and list their names", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the fully qualified names of the form fields in a PDF
    Fields {
        /// PDF file to inspect
        pdf: PathBuf,

        /// Print a JSON array of names instead of the listing
        #[arg(long)]
        json: bool,

        /// Also show each field's type and current value
        #[arg(short, long, conflicts_with = "json")]
        detailed: bool,
    },

    /// Copy the first page of a PDF into a new file with form fields filled in
    Fill {
        /// Source PDF with an interactive form
        source: PathBuf,

        /// Output file, overwritten if it exists
        destination: PathBuf,

        /// Field value, repeatable
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// JSON object mapping field names to values; --set entries win
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// What to do with names that match no field
        #[arg(long, value_enum, default_value = "ignore")]
        unknown_fields: UnknownFields,

        /// Compress streams of the output document
        #[arg(long)]
        compress: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum UnknownFields {
    Ignore,
    Warn,
    Error,
}

impl From<UnknownFields> for UnknownFieldPolicy {
    fn from(value: UnknownFields) -> Self {
        match value {
            UnknownFields::Ignore => UnknownFieldPolicy::Ignore,
            UnknownFields::Warn => UnknownFieldPolicy::Warn,
            UnknownFields::Error => UnknownFieldPolicy::Error,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("❌ Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Fields {
            pdf,
            json,
            detailed,
        } => list(&pdf, json, detailed),
        Command::Fill {
            source,
            destination,
            set,
            values,
            unknown_fields,
            compress,
        } => {
            let mut mapping = match values {
                Some(path) => read_values_file(&path)?,
                None => BTreeMap::new(),
            };
            mapping.extend(set);

            let config = FillerConfig {
                unknown_fields: unknown_fields.into(),
                compress_output: compress,
            };
            fill(&source, &destination, mapping, config)
        }
    }
}

fn list(pdf: &Path, json: bool, detailed: bool) -> Result<()> {
    let filler = FormFiller::from_path(pdf)
        .with_context(|| format!("failed to open {}", pdf.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&filler.field_names())?);
        return Ok(());
    }

    if !detailed {
        println!("Headers needed for data file: {:?}", filler.field_names());
        return Ok(());
    }

    let fields = filler.fields();
    if fields.is_empty() {
        println!("ℹ️  No form fields found in {}", pdf.display());
        return Ok(());
    }

    println!("📄 {} field(s) in {}", fields.len(), pdf.display());
    println!("{}", "─".repeat(60));
    for field in &fields {
        let kind = format!("{:?}", field.kind);
        match &field.value {
            Some(value) => println!("  {:<32} {kind:<10} = {value}", field.name),
            None => println!("  {:<32} {kind}", field.name),
        }
    }

    Ok(())
}

fn fill(
    source: &Path,
    destination: &Path,
    mapping: BTreeMap<String, String>,
    config: FillerConfig,
) -> Result<()> {
    let mut filler = FormFiller::with_config(source, config)
        .with_context(|| format!("failed to open {}", source.display()))?;

    let report = filler
        .fill_to_path(destination, &mapping)
        .with_context(|| format!("failed to fill {}", source.display()))?;

    println!(
        "✅ Wrote {} ({} field(s) filled)",
        destination.display(),
        report.updated.len()
    );
    if !report.unknown.is_empty() {
        println!("⚠️  Not found on the first page: {}", report.unknown.join(", "));
    }
    if !report.skipped.is_empty() {
        println!("⚠️  Left unchanged: {}", report.skipped.join(", "));
    }

    Ok(())
}

/// Parse a `NAME=VALUE` pair. The value may itself contain `=`.
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{s}`"))?;
    if name.is_empty() {
        return Err(format!("empty field name in `{s}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Read a JSON object of field values. Numbers and booleans are written as
/// their JSON text, `null` as an empty string.
fn read_values_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON object", path.display()))?;

    Ok(raw
        .into_iter()
        .map(|(name, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (name, text)
        })
        .collect())
}
