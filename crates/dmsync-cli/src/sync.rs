//! `sync` command: one bulk reconciliation pass.

use std::sync::Arc;

use dmsync_engine::{BulkSync, LinkStore};

/// Runs the bulk sync once and prints the summary.
///
/// # Errors
///
/// Returns an error if the clients cannot be built, the link store cannot be
/// opened, or either product listing fails. Per-row failures are reported in
/// the summary and do not fail the command.
pub(crate) async fn run_sync(config: &dmsync_core::AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let links = LinkStore::from_config(config).await?;
    let (directus, medusa) = dmsync_engine::build_clients(config)?;
    let job = BulkSync::new(
        Arc::new(directus),
        Arc::new(medusa),
        links,
        config.collection.clone(),
        config.currency_code.clone(),
    );

    if dry_run {
        println!(
            "dry-run: planning sync of Directus collection '{}' into Medusa",
            config.collection
        );
    }

    let report = job
        .run(dry_run)
        .await
        .map_err(|e| anyhow::anyhow!("bulk sync aborted: {e}"))?;

    println!("sync complete: {report}");
    if report.failed > 0 {
        tracing::warn!(failed = report.failed, "some rows failed; see errors above");
    }
    Ok(())
}
