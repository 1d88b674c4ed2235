//! API key check command.

use console::style;

use crate::config::{save_api_key, Settings};
use crate::govinfo::GovInfoClient;

/// Test an API key; a valid key given on the command line is saved.
pub async fn cmd_check_key(settings: &Settings, key: Option<&str>) -> anyhow::Result<()> {
    let config = match key {
        Some(key) => {
            let mut settings = settings.clone();
            settings.api_key = Some(key.to_string());
            settings.archive_config()?
        }
        None => settings.archive_config()?,
    };
    let client = GovInfoClient::new(config)?;

    if !client.check_key().await? {
        anyhow::bail!("invalid API key");
    }

    println!("{} API key accepted", style("✓").green());

    if let Some(key) = key {
        std::fs::create_dir_all(&settings.data_dir)?;
        let path = save_api_key(settings, key.trim())?;
        println!("  {} Saved to {}", style("→").dim(), path.display());
    }

    Ok(())
}
