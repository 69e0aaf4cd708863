#![forbid(unsafe_code)]
//! Command-line tools for the carbon credit ledger

use std::time::Instant;

use carbonledger::blockchain::{Block, Ledger};
use carbonledger::miner::{ProofOfWork, DEFAULT_DIFFICULTY};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Leading hex zeros required of a proof digest
    #[arg(long, global = true, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Finds the proof for a reference proof
    Solve {
        /// Proof of the block being extended
        reference: u64,
    },
    /// Checks a candidate proof against a reference proof
    VerifyProof { reference: u64, candidate: u64 },
    /// Runs an issue / transfer / retire session and prints the resulting chain
    Demo,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let pow = ProofOfWork::new(cli.difficulty);

    match cli.command {
        Commands::Solve { reference } => {
            let start = Instant::now();
            let proof = pow.solve(reference);
            println!(
                "{} {} (reference {}, {:.3}s)",
                "Proof found:".bright_green().bold(),
                proof.to_string().bright_white(),
                reference,
                start.elapsed().as_secs_f64()
            );
        }
        Commands::VerifyProof {
            reference,
            candidate,
        } => {
            if pow.is_valid(reference, candidate) {
                println!("{}", "✅ Proof is valid".bright_green());
            } else {
                println!("{}", "❌ Proof is not valid".bright_red());
                std::process::exit(1);
            }
        }
        Commands::Demo => demo(pow)?,
    }

    Ok(())
}

fn demo(pow: ProofOfWork) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_proof_of_work(pow);

    println!("{}", "🌱 Carbon ledger demo".bright_cyan().bold());

    ledger.issue("alice", 10.0, "reforestation", None)?;
    ledger.issue("bob", 5.0, "renewable_energy", Some("wind farm batch 3"))?;
    seal_and_report(&mut ledger)?;

    ledger.transfer("alice", "bob", 4.0, None, None)?;
    ledger.retire("bob", 4.0, Some("2024 company travel"))?;
    seal_and_report(&mut ledger)?;

    for block in ledger.chain() {
        print_block(block);
    }

    let stats = ledger.stats()?;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Metric")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new("Value")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
        ]);
    let rows = [
        ("Total blocks", stats.total_blocks.to_string()),
        ("Total transactions", stats.total_transactions.to_string()),
        ("Credits issued", stats.total_issued.to_string()),
        ("Credits retired", stats.total_retired.to_string()),
        ("In circulation", stats.circulating.to_string()),
        ("Pending", stats.pending_count.to_string()),
        ("Last block hash", stats.last_block_hash),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value).fg(TableColor::White)]);
    }
    println!("{table}");

    for owner in ["alice", "bob"] {
        println!("  {:<6} {}", owner.bright_yellow(), ledger.balance_of(owner));
    }

    ledger.verify()?;
    println!("{}", "✅ Chain verified".bright_green());
    Ok(())
}

fn seal_and_report(ledger: &mut Ledger) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let block = ledger.seal_block()?;
    println!(
        "⛏️  Sealed block {} with proof {} in {:.3}s",
        block.index.to_string().bright_white(),
        block.proof,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn print_block(block: &Block) {
    println!();
    println!("{}", format!("Block #{}", block.index).bright_blue().bold());
    println!("  hash:          {}", block.hash());
    println!("  previous hash: {}", block.previous_hash);
    println!("  proof:         {}", block.proof);
    for tx in &block.transactions {
        let kind = if tx.is_issuance() {
            "ISSUE ".green()
        } else if tx.is_retirement() {
            "RETIRE".red()
        } else {
            "MOVE  ".yellow()
        };
        println!(
            "  {} {} -> {} : {} {}",
            kind,
            tx.sender(),
            tx.recipient(),
            tx.amount(),
            tx.note().unwrap_or_default().dimmed()
        );
    }
}
