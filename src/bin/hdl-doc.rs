//! hdl-doc command line tool
//!
//! Prints the JSON documentation model of each VHDL or Verilog file given on
//! the command line.

use anyhow::{Context, Result};
use clap::Parser;
use hdl_doc::{extract_files, ExtractConfig, HdlLanguage, HdlParser};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hdl-doc")]
#[command(about = "Extract documentation models from VHDL and Verilog sources")]
#[command(version)]
struct Args {
    /// Source files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Dialect for files whose extension does not tell (vhdl or verilog)
    #[arg(short, long)]
    lang: Option<HdlLanguage>,

    /// Character marking documentation comments
    #[arg(long)]
    doc_symbol: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only print the name and kind of each primary unit
    #[arg(long)]
    name_only: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<ExtractConfig> {
    let mut config = match &args.config {
        Some(path) => ExtractConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?,
        None => ExtractConfig::default(),
    };
    if let Some(language) = args.lang {
        config.language = language;
    }
    if let Some(symbol) = &args.doc_symbol {
        config.doc_symbol = symbol.clone();
    }
    Ok(config)
}

fn unit_names(files: &[PathBuf], config: &ExtractConfig) -> Vec<(PathBuf, Result<Value>)> {
    files
        .iter()
        .map(|path| {
            let result = HdlParser::from_file(path, config)
                .and_then(|(mut parser, source)| parser.unit_name(&source))
                .map_err(anyhow::Error::from)
                .and_then(|name| serde_json::to_value(name).context("Failed to serialize unit name"));
            (path.clone(), result)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else if args.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;

    let results: Vec<(PathBuf, Result<Value>)> = if args.name_only {
        unit_names(&args.files, &config)
    } else {
        extract_files(args.files.clone(), &config)
            .await
            .into_iter()
            .map(|report| {
                let value = report
                    .result
                    .map_err(anyhow::Error::from)
                    .and_then(|unit| serde_json::to_value(unit).context("Failed to serialize model"));
                (report.path, value)
            })
            .collect()
    };

    let mut failed = 0;
    let documents: Vec<Value> = results
        .into_iter()
        .map(|(path, result)| match result {
            Ok(model) => json!({ "path": path, "model": model }),
            Err(e) => {
                failed += 1;
                tracing::error!("{}: {:#}", path.display(), e);
                json!({ "path": path, "error": format!("{:#}", e) })
            }
        })
        .collect();

    let output = serde_json::to_string_pretty(&documents).context("Failed to render JSON output")?;
    println!("{}", output);

    if failed > 0 {
        anyhow::bail!("{} of {} files could not be documented", failed, documents.len());
    }
    Ok(())
}
