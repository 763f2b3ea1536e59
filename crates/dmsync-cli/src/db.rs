//! `db` and `links` commands.

use dmsync_engine::LinkStore;

pub(crate) async fn run_ping(config: &dmsync_core::AppConfig) -> anyhow::Result<()> {
    let pool = dmsync_db::connect_pool_from_config(config).await?;
    dmsync_db::ping(&pool).await?;
    println!("database reachable");
    Ok(())
}

pub(crate) async fn run_migrate(config: &dmsync_core::AppConfig) -> anyhow::Result<()> {
    let pool = dmsync_db::connect_pool_from_config(config).await?;
    let applied = dmsync_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Prints every recorded link, one per line.
pub(crate) async fn run_links_list(config: &dmsync_core::AppConfig) -> anyhow::Result<()> {
    if config.database_url.is_none() {
        anyhow::bail!("DATABASE_URL is not set; links are only persisted in Postgres");
    }

    let links = LinkStore::from_config(config).await?.list().await?;
    if links.is_empty() {
        println!("no product links recorded");
        return Ok(());
    }

    for link in &links {
        println!(
            "{:<24} {:<32} {}",
            link.cms_key, link.commerce_product_id, link.title
        );
    }
    println!("{} link(s)", links.len());
    Ok(())
}
