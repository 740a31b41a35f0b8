//! multipay - Demo Batch Payout Run
//!
//! End-to-end exercise of the payout core against the in-process mock
//! ledger. Architecture:
//!
//! ```text
//! ┌───────────┐    ┌──────────────┐    ┌──────────────┐    ┌───────────┐
//! │ Allocator │───▶│ QueueBuilder │───▶│ Coordinator  │───▶│ MockLedger│
//! │ (shares)  │    │ (jobs)       │    │ (FSM + gates)│    │ (3 ports) │
//! └───────────┘    └──────────────┘    └──────────────┘    └───────────┘
//! ```
//!
//! Events are printed as JSON lines as the run advances; the operator
//! checkpoint auto-confirms.

use std::sync::Arc;

use anyhow::Context;

use multipay::config::AppConfig;
use multipay::distribution::Allocator;
use multipay::logging::init_logging;
use multipay::money::{format_amount, parse_amount};
use multipay::payout::{
    BalanceSource, MockLedger, OperatorDecision, PayoutCoordinator, build_queue, event_channel,
};

// ============================================================
// FLAGS
// ============================================================

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_amount() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--amount" && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "1.5".to_string()
}

// ============================================================
// MAIN
// ============================================================

const DEMO_RECIPIENTS: [&str; 3] = [
    "0x1111111111111111111111111111111111111111",
    "0x2222222222222222222222222222222222222222",
    "0x3333333333333333333333333333333333333333",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    println!("=== multipay: Batch Payout Demo ===");
    println!("env: {}", env);

    let decimals = config.payout.asset_decimals;
    let total = parse_amount(&get_amount(), decimals).context("invalid --amount")?;

    // 1. Roster + equal split
    let mut allocator = Allocator::with_limit(config.payout.max_recipients);
    for addr in DEMO_RECIPIENTS {
        allocator.add_recipient(addr)?;
    }
    println!("\n=== Distribution ===");
    for entry in allocator.entries() {
        println!(
            "  {}  {:>3}%",
            allocator.recipients()[entry.index].short(),
            entry.share
        );
    }

    // 2. Materialize the job queue
    let queue = build_queue(total, allocator.recipients(), allocator.shares())?;
    println!(
        "\n=== Queue: {} jobs, {} total ===",
        queue.len(),
        format_amount(queue.total(), decimals, 6)
    );

    // 3. Run against the mock ledger, printing events as JSON lines
    let ledger = Arc::new(MockLedger::new(total));
    let (event_tx, mut event_rx) = event_channel(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("event serialization failed: {}", e),
            }
        }
    });

    let mut coordinator = PayoutCoordinator::new(
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
        config.payout.delays(),
    )
    .with_events(event_tx);

    println!("\n=== Executing ===");
    let final_state = coordinator
        .run_to_completion(queue, |_, _| OperatorDecision::Confirm)
        .await?;

    let report_json = coordinator
        .report()
        .map(serde_json::to_string_pretty)
        .transpose()?;

    // dropping the coordinator closes the event channel
    drop(coordinator);
    printer.await?;

    // 4. Summary
    println!("\n=== Run Summary ===");
    println!("final state: {}", final_state);
    if let Some(json) = report_json {
        println!("{}", json);
    }
    println!("transfers accepted: {}", ledger.transfer_count());
    println!(
        "remaining mock balance: {}",
        format_amount(ledger.available_balance().await, decimals, 6)
    );

    println!("\n=== Done ===");
    Ok(())
}
