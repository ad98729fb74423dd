#![forbid(unsafe_code)]
//! Offline audit of a ledger snapshot: verify the chain and print results.
//! The snapshot file is only read, never rewritten.

use ballotchain::blockchain::{verify_chain, Block};
use ballotchain::config::{load_config_from, DEFAULT_CONFIG_PATH};
use ballotchain::persistence::{JsonFilePersistence, Persistence};
use ballotchain::tally::{tally_by_barangay, tally_overall, Tally};
use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Snapshot to audit; defaults to the configured data file
    #[arg(long)]
    data_file: Option<PathBuf>,
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Also print one results table per barangay
    #[arg(long)]
    by_barangay: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_file = match cli.data_file {
        Some(path) => path,
        None => load_config_from(&cli.config)?.data_file(),
    };

    let snapshot = JsonFilePersistence::new(&data_file)
        .load_snapshot()?
        .ok_or_else(|| format!("No ledger snapshot at {}", data_file.display()))?;

    println!("{}", "🗳️  BALLOT LEDGER AUDIT".bright_cyan().bold());
    println!("{}", format!("📁 {}", data_file.display()).cyan());
    println!();

    match verify_chain(&snapshot.chain) {
        Ok(()) => println!(
            "{}",
            format!("✅ Chain intact: {} block(s)", snapshot.chain.len()).green().bold()
        ),
        Err(e) => println!("{}", format!("❌ Chain broken: {}", e).red().bold()),
    }
    println!();

    if !snapshot.chain.is_empty() {
        println!("{}", blocks_table(&snapshot.chain));
        println!();
    }

    let pending_count: usize = snapshot
        .current_votes_by_barangay
        .iter()
        .map(|(_, votes)| votes.len())
        .sum();
    println!(
        "{}",
        format!(
            "⏳ Pending votes: {}   ⛏️  Mined barangays: {}",
            pending_count,
            snapshot.mined_barangays.len()
        )
        .yellow()
    );
    println!();

    println!("{}", "📊 OVERALL RESULTS".bright_blue().bold());
    println!(
        "{}",
        results_table(&tally_overall(&snapshot.chain, &snapshot.current_votes_by_barangay))
    );

    if cli.by_barangay {
        for (barangay, tally) in tally_by_barangay(&snapshot.chain, &snapshot.current_votes_by_barangay) {
            println!();
            println!("{}", format!("📍 {}", barangay).bright_magenta().bold());
            println!("{}", results_table(&tally));
        }
    }

    Ok(())
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).fg(TableColor::Cyan).add_attribute(Attribute::Bold))
        .collect()
}

fn blocks_table(blocks: &[Block]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Block", "Barangay", "Votes", "Mined", "Hash"]));

    for block in blocks {
        table.add_row(vec![
            Cell::new(format!("#{}", block.index)).fg(TableColor::White),
            Cell::new(&block.barangay).fg(TableColor::Magenta),
            Cell::new(block.votes.len()).fg(TableColor::Yellow),
            Cell::new(format_timestamp(block.timestamp)).fg(TableColor::Grey),
            Cell::new(short_hash(&block.hash)).fg(TableColor::Green),
        ]);
    }
    table
}

fn results_table(tally: &Tally) -> Table {
    let mut rows: Vec<(&String, &u64)> = tally.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Candidate", "Votes"]));

    for (candidate, count) in rows {
        table.add_row(vec![
            Cell::new(candidate).fg(TableColor::White),
            Cell::new(count).fg(TableColor::Yellow),
        ]);
    }
    table
}

fn short_hash(hash: &str) -> String {
    if hash.len() > 16 {
        format!("{}...", &hash[..13])
    } else {
        hash.to_string()
    }
}

fn format_timestamp(timestamp: f64) -> String {
    use chrono::DateTime;

    let secs = timestamp.trunc() as i64;
    let nanos = (timestamp.fract() * 1e9) as u32;
    match DateTime::from_timestamp(secs, nanos) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Invalid".to_string(),
    }
}
