// Host scheduler: the light client itself owns no timers, so cadence lives
// here. Ticks run as independent tasks and may overlap; overlapping syncs
// collapse into one session inside the engine.

use super::common::{save_last_sync, CliResult, LastSync, Settings};
use crate::{print_error, print_info, print_success};
use mahala_light::ValidatorEvent;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

pub async fn handle(settings: &Settings, block_interval: u64, sync_interval: u64) -> CliResult<()> {
    if block_interval == 0 || sync_interval == 0 {
        return Err("intervals must be at least one second".into());
    }

    let (client, address) = settings.open()?;
    let full_node_url = client.full_node_url().unwrap_or_default();
    let last_sync_path = settings.last_sync_path();
    print_info(&format!(
        "Watching {} on {} (validator every {}s, sync every {}s). Ctrl+C to stop.",
        address, full_node_url, block_interval, sync_interval
    ));

    let mut events = client.subscribe_validator_events();
    let mut block_tick = interval(Duration::from_secs(block_interval));
    let mut sync_tick = interval(Duration::from_secs(sync_interval));
    block_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    sync_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = block_tick.tick() => {
                let client = client.clone();
                tokio::spawn(async move {
                    match client.check_validator_selection().await {
                        Ok(selected) => debug!("Validator check: selected={}", selected),
                        Err(e) => warn!("Validator check failed: {}", e),
                    }
                });
            }
            _ = sync_tick.tick() => {
                let client = client.clone();
                let path = last_sync_path.clone();
                let address = address.clone();
                let full_node_url = full_node_url.clone();
                tokio::spawn(async move {
                    match client.sync().await {
                        Ok(report) => {
                            print_success(&format!(
                                "Synced: balance {} MHL, daily dividend {} MHL",
                                report.snapshot.balance, report.snapshot.daily_dividend
                            ));
                            let record = LastSync {
                                address,
                                full_node_url,
                                snapshot: report.snapshot,
                            };
                            if let Err(e) = save_last_sync(&path, &record) {
                                warn!("Could not record last sync: {}", e);
                            }
                        }
                        Err(e) => print_error(&format!("Sync failed: {}", e)),
                    }
                });
            }
            event = events.recv() => match event {
                Ok(ValidatorEvent::Selected { round, as_of, .. }) => {
                    let round = round.map_or_else(|| "?".to_string(), |r| r.to_string());
                    print_success(&format!("Selected as validator for round {} ({})", round, as_of));
                }
                Err(RecvError::Lagged(missed)) => warn!("Missed {} validator events", missed),
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                if client.cancel_sync() {
                    print_info("In-flight sync cancelled");
                }
                break;
            }
        }
    }

    print_info("Stopped");
    Ok(())
}
