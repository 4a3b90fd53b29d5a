use super::common::{CliResult, Settings};
use crate::{print_info, print_success};
use colored::*;

pub async fn handle(settings: &Settings) -> CliResult<()> {
    let (client, address) = settings.open()?;
    print_info(&format!("Checking validator selection for {}...", address));

    let selected = client.check_validator_selection().await?;

    println!();
    if selected {
        print_success("This wallet is the selected validator for the current round");
    } else {
        println!("{} {}", "Selected:".bold(), "no".dimmed());
    }
    if let Some(selection) = client.last_validator_selection() {
        println!("{} {}", "As of:".bold(), selection.as_of);
    }
    Ok(())
}
