// ABOUTME: CLI for cleaning product descriptions with the catalog sanitizer.
// ABOUTME: Sanitizes files/stdin or JSON record batches and prints HTML or JSON.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use catalog_sanitizer::{Options, Sanitizer, TracingLogger};
use clap::Parser;
use rayon::prelude::*;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Clean product description HTML against a tag whitelist.
#[derive(Parser, Debug)]
#[command(name = "catalog-clean")]
#[command(about = "Sanitize product descriptions and print the result", long_about = None)]
struct Args {
    /// Local file paths. Use "-" to read one input from stdin.
    #[arg(required = true)]
    targets: Vec<String>,

    /// Print the heading report instead of sanitized markup.
    #[arg(long, default_value_t = false)]
    headings: bool,

    /// Treat every target as a JSON array of product records.
    #[arg(long, default_value_t = false)]
    batch: bool,

    /// Record field holding the product identifier (batch mode).
    #[arg(long, default_value = "id")]
    id_field: String,

    /// Record field holding the description markup (batch mode).
    #[arg(long, default_value = "description")]
    description_field: String,

    /// Product identifier attached to log events (only valid with a single non-batch target).
    #[arg(long)]
    product_id: Option<String>,

    /// JSON options file overriding the default whitelist.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Log every sanitized description.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.product_id.is_some() && (args.batch || args.targets.len() > 1) {
        bail!("--product-id is only valid with a single non-batch target");
    }

    let opts = match &args.config {
        Some(path) => Options::from_json_file(path)?,
        None => Options::default(),
    };
    let sanitizer = Sanitizer::new(opts, Arc::new(TracingLogger))?;

    let mut failed = 0;
    let rendered = if args.batch {
        let mut records = Vec::new();
        for target in &args.targets {
            match load_records(target) {
                Ok(batch) => records.extend(
                    batch
                        .into_par_iter()
                        .map(|record| process_record(&sanitizer, &args, record))
                        .collect::<Vec<_>>(),
                ),
                Err(err) => {
                    tracing::error!(path = target.as_str(), "{:#}", err);
                    failed += 1;
                }
            }
        }
        render_json(&Value::Array(records), args.compact)?
    } else {
        let mut results = Vec::new();
        for target in &args.targets {
            match load_text(target) {
                Ok(raw) => results.push(process_text(&sanitizer, &args, target, &raw)),
                Err(err) => {
                    tracing::error!(path = target.as_str(), "{:#}", err);
                    failed += 1;
                    results.push(json!({
                        "target": target,
                        "ok": false,
                        "error": format!("{:#}", err)
                    }));
                }
            }
        }

        // Single target and ok => emit the payload itself; otherwise an envelope.
        match results.as_slice() {
            [only] if only.get("ok").and_then(Value::as_bool) == Some(true) => {
                if args.headings {
                    render_json(&only["headings"], args.compact)?
                } else {
                    only["description"].as_str().unwrap_or_default().to_string()
                }
            }
            _ => render_json(
                &json!({
                    "results": results,
                    "total": results.len(),
                    "failed": failed
                }),
                args.compact,
            )?,
        }
    };

    match &args.output {
        Some(path) => fs::write(path, format!("{}\n", rendered))
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", rendered),
    }

    Ok(if failed > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn process_text(sanitizer: &Sanitizer, args: &Args, target: &str, raw: &str) -> Value {
    if args.headings {
        return match sanitizer.extract_headings(raw) {
            Ok(report) => json!({ "target": target, "ok": true, "headings": report }),
            Err(err) => json!({ "target": target, "ok": false, "error": err.to_string() }),
        };
    }
    let cleaned = sanitizer.sanitize(raw, args.product_id.as_deref());
    json!({ "target": target, "ok": true, "description": cleaned })
}

/// Adds `new_description` (or `headings`) to one record; non-object records pass through.
fn process_record(sanitizer: &Sanitizer, args: &Args, mut record: Value) -> Value {
    let product_id = record.get(&args.id_field).and_then(id_string);
    let description = record.get(&args.description_field).cloned();

    let Some(fields) = record.as_object_mut() else {
        return record;
    };

    match description {
        Some(Value::String(raw)) if args.headings => {
            let value = match sanitizer.extract_headings(&raw) {
                Ok(report) => serde_json::to_value(report).unwrap_or(Value::Null),
                Err(err) => {
                    tracing::warn!(product_id = product_id.as_deref().unwrap_or("-"), "{}", err);
                    json!({ "error": err.to_string() })
                }
            };
            fields.insert("headings".to_string(), value);
        }
        Some(Value::String(raw)) => {
            let cleaned = sanitizer.sanitize(&raw, product_id.as_deref());
            fields.insert("new_description".to_string(), Value::String(cleaned));
        }
        other => {
            tracing::warn!(
                product_id = product_id.as_deref().unwrap_or("-"),
                "description field is not a string; left unchanged"
            );
            if !args.headings {
                fields.insert("new_description".to_string(), other.unwrap_or(Value::Null));
            }
        }
    }
    record
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn render_json(value: &Value, compact: bool) -> Result<String> {
    Ok(if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    })
}

fn load_text(target: &str) -> Result<String> {
    let bytes = load_bytes(target)?;
    String::from_utf8(bytes).map_err(|e| anyhow!("{} is not valid UTF-8: {}", target, e))
}

fn load_records(target: &str) -> Result<Vec<Value>> {
    let bytes = load_bytes(target)?;
    match serde_json::from_slice::<Value>(&bytes).with_context(|| format!("parsing {}", target))? {
        Value::Array(records) => Ok(records),
        _ => bail!("{} does not hold a JSON array of records", target),
    }
}

fn load_bytes(target: &str) -> Result<Vec<u8>> {
    if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    Ok(fs::read(path)?)
}
