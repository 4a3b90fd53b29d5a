use super::common::{CliResult, Settings};
use crate::print_success;
use colored::*;
use mahala_crypto::DERIVATION_VERSION;

pub fn handle(settings: &Settings) -> CliResult<()> {
    let (_client, address) = settings.open()?;

    print_success("Wallet derived from this device's fingerprint");
    println!();
    println!("{} {}", "Address:".bold(), address.green());
    println!("{} v{}", "Derivation:".bold(), DERIVATION_VERSION);
    println!(
        "{} {}",
        "Device salt:".bold(),
        settings.data_dir.join("device_salt").display()
    );
    println!();
    println!(
        "{}",
        "Keep the device salt: the same device id and salt always recover this address.".yellow()
    );
    Ok(())
}
