//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    let applied = ctx.init_schema().await?;

    for name in &applied {
        println!("  {} Applied migration: {}", style("✓").green(), name);
    }

    println!(
        "{} Initialized cht in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!(
        "  {} Downloads go to {}",
        style("→").dim(),
        settings.downloads_dir.display()
    );

    if settings.api_key.is_none() {
        println!(
            "{} No API key configured; run 'cht check-key KEY' to save one",
            style("!").yellow()
        );
    }

    Ok(())
}
