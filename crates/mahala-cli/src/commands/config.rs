use super::common::{CliResult, Settings};
use crate::print_success;
use colored::*;

/// Write the effective light client settings (flags, env, existing file,
/// defaults) to the config path.
pub fn init(settings: &Settings, force: bool) -> CliResult<()> {
    let path = settings.config_path();
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    let config = settings.light_config()?;
    config.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save_to_file(&path)?;

    print_success(&format!("Config written to {}", path.display()));
    println!("{} {}", "Full node:".bold(), config.full_node_url.cyan());
    println!(
        "{} {} ms (connect {} ms)",
        "Read timeout:".bold(),
        config.read_timeout_ms,
        config.connect_timeout_ms
    );
    Ok(())
}
