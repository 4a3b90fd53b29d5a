use super::common::{load_last_sync, save_last_sync, CliResult, LastSync, Settings};
use crate::{print_info, print_success};
use colored::*;
use mahala_light::{ChainStateSnapshot, LightClientError};

pub async fn handle_sync(settings: &Settings) -> CliResult<()> {
    let (client, address) = settings.open()?;
    let full_node_url = client.full_node_url().unwrap_or_default();
    print_info(&format!("Syncing {} with {}...", address, full_node_url));

    let report = client.sync().await?;
    save_last_sync(
        &settings.last_sync_path(),
        &LastSync {
            address,
            full_node_url,
            snapshot: report.snapshot.clone(),
        },
    )?;

    print_success("Sync complete");
    print_snapshot(&report.snapshot);
    println!(
        "{} {}",
        "Validator:".bold(),
        if report.selection.selected {
            "selected".green()
        } else {
            "not selected".dimmed()
        }
    );
    Ok(())
}

/// Last synced values, without touching the network.
pub fn handle_balance(settings: &Settings) -> CliResult<()> {
    let (_client, address) = settings.open()?;
    let record = match load_last_sync(&settings.last_sync_path())? {
        Some(record) if record.address == address => record,
        _ => return Err(LightClientError::NotSynced.into()),
    };

    println!("{} {}", "Address:".bold(), address.green());
    println!("{} {}", "Full node:".bold(), record.full_node_url);
    print_snapshot(&record.snapshot);
    Ok(())
}

fn print_snapshot(snapshot: &ChainStateSnapshot) {
    println!();
    println!(
        "{} {} MHL",
        "Balance:".bold(),
        snapshot.balance.to_string().cyan()
    );
    println!(
        "{} {} MHL",
        "Daily dividend:".bold(),
        snapshot.daily_dividend.to_string().cyan()
    );
    if let Some(at) = snapshot.last_sync_timestamp {
        println!("{} {}", "Synced at:".bold(), at);
    }
}
