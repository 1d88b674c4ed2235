//! Reconcile command.

use console::style;

use crate::config::Settings;
use crate::services::Reconciler;

/// Clear catalog paths whose files no longer exist.
pub async fn cmd_reconcile(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_exists() {
        println!(
            "{} No catalog at {}; run 'cht init' first",
            style("!").yellow(),
            settings.database_path().display()
        );
        return Ok(());
    }

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let report = Reconciler::new(ctx).reconcile().await?;

    for repair in &report.cleared {
        println!(
            "  {} {} ({}): {} no longer exists",
            style("✗").red(),
            repair.id,
            repair.format,
            repair.stale_path.display()
        );
    }

    println!(
        "{} Checked {} files, cleared {}",
        style("✓").green(),
        report.checked,
        report.cleared.len()
    );

    Ok(())
}
