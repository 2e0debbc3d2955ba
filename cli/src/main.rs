//! podindex CLI: plan index runs and align chart series.
//!
//! Usage:
//! ```bash
//! podindex info [--config indexer.json]
//! podindex plan 17445564 17500000 10000
//! podindex align --forward series.json
//! ```

mod logging;

use std::env;
use std::fs;
use std::process;

use anyhow::{bail, Context, Result};
use podindex_core::{plan_chunks, IndexerConfig};
use podindex_evm::fetcher::POD_DEPLOYED_TOPIC0;
use podindex_evm::IndexerBuilder;
use podindex_series::{extract, FillPolicy, Series};

use crate::logging::{init_tracing, LogConfig};

fn main() {
    init_tracing(&LogConfig::from_env());

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "info" => cmd_info(&args[2..]),
        "plan" => cmd_plan(&args[2..]),
        "align" => cmd_align(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("podindex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("podindex {}", env!("CARGO_PKG_VERSION"));
    println!("Resumable chunked event indexing and chart series alignment\n");
    println!("USAGE:");
    println!("    podindex <COMMAND>\n");
    println!("COMMANDS:");
    println!("    info [--config <file>]           Show indexer configuration");
    println!("    plan <start> <end> <chunk_size>  Print the chunk ranges for a block range");
    println!("    align [--forward] <file>         Align a JSON list of series for charting");
    println!("    version                          Print version");
    println!("    help                             Print this help\n");
    println!("ENVIRONMENT:");
    println!("    PODINDEX_LOG       log filter directives (default: warn)");
    println!("    PODINDEX_LOG_JSON  set to 1 for JSON logs");
}

fn cmd_info(args: &[String]) -> Result<()> {
    let config = match args {
        [] => IndexerConfig::default(),
        [flag, path] if flag == "--config" => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            IndexerConfig::from_json(&raw)?
        }
        _ => bail!("usage: podindex info [--config <file>]"),
    };
    let config = IndexerBuilder::from_config(config).build_config();

    println!("PodIndex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Contract: {}", config.contract_address);
    println!(
        "  Event: {}({} indexed, {} indexed)",
        config.event, config.address_arg, config.owner_arg
    );
    if config.event == "PodDeployed" {
        println!("  Topic0: {POD_DEPLOYED_TOPIC0}");
    }
    println!("  Genesis block: {}", config.genesis_block);
    println!("  Chunk size: {} blocks/query", config.chunk_size);
    println!("  Max in flight: {}", config.max_in_flight);
    println!(
        "  Retries: {} (backoff {}ms..{}ms x{})",
        config.retry.max_retries,
        config.retry.initial_backoff_ms,
        config.retry.max_backoff_ms,
        config.retry.multiplier
    );
    println!("  Chunk timeout: {}ms", config.chunk_timeout_ms);
    match config.run_deadline_ms {
        Some(ms) => println!("  Run deadline: {ms}ms"),
        None => println!("  Run deadline: none"),
    }
    println!("  Storage backends: memory, SQLite (feature: sqlite)");
    Ok(())
}

fn cmd_plan(args: &[String]) -> Result<()> {
    let [start, end, chunk] = args else {
        bail!("usage: podindex plan <start> <end> <chunk_size>");
    };
    let start: u64 = start.parse().with_context(|| format!("invalid start block: {start}"))?;
    let end: u64 = end.parse().with_context(|| format!("invalid end block: {end}"))?;
    let chunk: u64 = chunk.parse().with_context(|| format!("invalid chunk size: {chunk}"))?;

    let chunks = plan_chunks(start, end, chunk)?;
    tracing::info!(start, end, chunk, count = chunks.len(), "planned chunks");
    for range in &chunks {
        println!("{range}");
    }
    Ok(())
}

fn cmd_align(args: &[String]) -> Result<()> {
    let (fill, path) = match args {
        [path] => (FillPolicy::Zero, path),
        [flag, path] if flag == "--forward" => (FillPolicy::Forward, path),
        _ => bail!("usage: podindex align [--forward] <file>"),
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let series: Vec<Series> =
        serde_json::from_str(&raw).with_context(|| format!("parsing series from {path}"))?;

    let presentation = extract(&series, fill)?;
    println!("{}", serde_json::to_string_pretty(&presentation)?);
    Ok(())
}
