//! One-shot reconciliation of the whole CMS collection against Medusa.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use dmsync_core::{bulk_create_payload, CmsProduct, CreateProductPayload};
use dmsync_directus::DirectusClient;
use dmsync_medusa::{CommerceProduct, MedusaClient};

use crate::error::SyncError;
use crate::links::{LinkStore, ProductLink};

/// Counts from one bulk sync run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub scanned: usize,
    pub up_to_date: usize,
    pub adopted: usize,
    pub created: usize,
    pub invalid: usize,
    pub failed: usize,
    pub dry_run: bool,
    /// Set when the run was refused because another run held the lock.
    pub skipped: bool,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return f.write_str("skipped (another bulk sync is running)");
        }
        write!(
            f,
            "scanned={} up_to_date={} adopted={} created={} invalid={} failed={}",
            self.scanned, self.up_to_date, self.adopted, self.created, self.invalid, self.failed
        )?;
        if self.dry_run {
            f.write_str(" (dry run)")?;
        }
        Ok(())
    }
}

/// What the job intends to do with one CMS row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowPlan {
    UpToDate {
        cms_key: Option<String>,
        commerce_product_id: String,
    },
    /// Record a link to an existing, unclaimed product with the same title.
    Adopt {
        cms_key: String,
        commerce_product_id: String,
        title: String,
    },
    /// Create a new product. `stale_link` is set when the row was linked to a
    /// product that no longer exists.
    Create {
        cms_key: Option<String>,
        payload: CreateProductPayload,
        stale_link: Option<String>,
    },
    Invalid {
        cms_key: Option<String>,
        reason: String,
    },
}

impl fmt::Display for RowPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = |k: &Option<String>| k.clone().unwrap_or_else(|| "-".to_owned());
        match self {
            Self::UpToDate {
                cms_key,
                commerce_product_id,
            } => write!(f, "up-to-date {} -> {commerce_product_id}", key(cms_key)),
            Self::Adopt {
                cms_key,
                commerce_product_id,
                title,
            } => write!(f, "adopt      {cms_key} -> {commerce_product_id} ({title})"),
            Self::Create {
                cms_key, payload, ..
            } => write!(
                f,
                "create     {} \"{}\" amount={}",
                key(cms_key),
                payload.title,
                payload.primary_amount().unwrap_or_default()
            ),
            Self::Invalid { cms_key, reason } => {
                write!(f, "invalid    {}: {reason}", key(cms_key))
            }
        }
    }
}

/// Decides, row by row, how to bring Medusa in line with the CMS.
///
/// Rows are planned in order; a product adopted by an earlier row cannot be
/// adopted again by a later row with the same title.
#[must_use]
pub fn plan_rows(
    rows: &[CmsProduct],
    products: &[CommerceProduct],
    links: &[ProductLink],
    currency_code: &str,
) -> Vec<RowPlan> {
    let live: HashSet<&str> = products.iter().map(|p| p.id.as_str()).collect();
    let by_key: HashMap<&str, &ProductLink> =
        links.iter().map(|l| (l.cms_key.as_str(), l)).collect();
    let mut claimed: HashSet<String> = links
        .iter()
        .map(|l| l.commerce_product_id.clone())
        .collect();

    rows.iter()
        .map(|row| {
            let cms_key = row.id.clone();
            let title = match row.title() {
                Ok(title) => title,
                Err(e) => {
                    return RowPlan::Invalid {
                        cms_key,
                        reason: e.to_string(),
                    }
                }
            };

            let link = cms_key.as_deref().and_then(|k| by_key.get(k).copied());
            if let Some(link) = link {
                if live.contains(link.commerce_product_id.as_str()) {
                    return RowPlan::UpToDate {
                        cms_key,
                        commerce_product_id: link.commerce_product_id.clone(),
                    };
                }
            } else if let Some(existing) = products
                .iter()
                .find(|p| p.title == title && !claimed.contains(&p.id))
            {
                claimed.insert(existing.id.clone());
                return match cms_key {
                    Some(key) => RowPlan::Adopt {
                        cms_key: key,
                        commerce_product_id: existing.id.clone(),
                        title: title.to_owned(),
                    },
                    None => RowPlan::UpToDate {
                        cms_key: None,
                        commerce_product_id: existing.id.clone(),
                    },
                };
            }

            match bulk_create_payload(row, currency_code) {
                Ok(payload) => RowPlan::Create {
                    stale_link: link.map(|l| l.commerce_product_id.clone()),
                    cms_key,
                    payload,
                },
                Err(e) => RowPlan::Invalid {
                    cms_key,
                    reason: e.to_string(),
                },
            }
        })
        .collect()
}

/// Bulk reconciliation job. At most one [`BulkSync::run`] executes at a time
/// per instance; share it behind an `Arc` between the scheduler and callers.
pub struct BulkSync {
    directus: Arc<DirectusClient>,
    medusa: Arc<MedusaClient>,
    links: LinkStore,
    collection: String,
    currency_code: String,
    run_lock: Mutex<()>,
}

impl BulkSync {
    #[must_use]
    pub fn new(
        directus: Arc<DirectusClient>,
        medusa: Arc<MedusaClient>,
        links: LinkStore,
        collection: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            directus,
            medusa,
            links,
            collection: collection.into(),
            currency_code: currency_code.into(),
            run_lock: Mutex::new(()),
        }
    }

    /// Loads both catalogues and the link table, then plans every row.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if either listing or the link table cannot be
    /// read in full.
    pub async fn plan(&self) -> Result<Vec<RowPlan>, SyncError> {
        let products = self.medusa.list_all_products().await?;
        tracing::debug!(count = products.len(), "loaded Medusa products");

        let links = self.links.list().await?;
        tracing::debug!(count = links.len(), "loaded product links");

        let rows = self.directus.list_products(&self.collection).await?;
        tracing::debug!(
            count = rows.len(),
            collection = %self.collection,
            "loaded CMS rows"
        );

        Ok(plan_rows(&rows, &products, &links, &self.currency_code))
    }

    /// Runs one reconciliation pass. With `dry_run` the plan is printed and
    /// nothing is written to Medusa or the link store.
    ///
    /// If another run of this job is still in progress, returns immediately
    /// with a report whose `skipped` flag is set; nothing is listed or
    /// created. Overlapping passes would both plan the same missing row.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] only when the inputs cannot be loaded; per-row
    /// failures are counted in the report.
    pub async fn run(&self, dry_run: bool) -> Result<SyncReport, SyncError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::warn!(
                collection = %self.collection,
                dry_run,
                "bulk sync already running; skipping this pass"
            );
            return Ok(SyncReport {
                dry_run,
                skipped: true,
                ..SyncReport::default()
            });
        };

        let plans = self.plan().await?;
        let mut report = SyncReport {
            scanned: plans.len(),
            dry_run,
            ..SyncReport::default()
        };

        for plan in plans {
            if dry_run {
                println!("  {plan}");
            }
            self.apply(plan, dry_run, &mut report).await;
        }

        tracing::info!(
            scanned = report.scanned,
            up_to_date = report.up_to_date,
            adopted = report.adopted,
            created = report.created,
            invalid = report.invalid,
            failed = report.failed,
            dry_run,
            "bulk sync complete"
        );
        Ok(report)
    }

    async fn apply(&self, plan: RowPlan, dry_run: bool, report: &mut SyncReport) {
        if dry_run {
            match plan {
                RowPlan::UpToDate { .. } => report.up_to_date += 1,
                RowPlan::Adopt { .. } => report.adopted += 1,
                RowPlan::Create { .. } => report.created += 1,
                RowPlan::Invalid { .. } => report.invalid += 1,
            }
            return;
        }

        match plan {
            RowPlan::UpToDate {
                cms_key,
                commerce_product_id,
            } => {
                report.up_to_date += 1;
                tracing::debug!(
                    cms_key = cms_key.as_deref().unwrap_or("-"),
                    commerce_product_id = %commerce_product_id,
                    "product already in Medusa"
                );
            }
            RowPlan::Invalid { cms_key, reason } => {
                report.invalid += 1;
                tracing::warn!(
                    cms_key = cms_key.as_deref().unwrap_or("-"),
                    reason = %reason,
                    "skipping invalid CMS row"
                );
            }
            RowPlan::Adopt {
                cms_key,
                commerce_product_id,
                title,
            } => {
                let link = ProductLink {
                    cms_key,
                    commerce_product_id,
                    title,
                };
                match self.links.upsert(&link).await {
                    Ok(()) => {
                        report.adopted += 1;
                        tracing::info!(
                            cms_key = %link.cms_key,
                            commerce_product_id = %link.commerce_product_id,
                            "linked CMS row to existing Medusa product"
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::error!(cms_key = %link.cms_key, error = %e, "failed to record link");
                    }
                }
            }
            RowPlan::Create {
                cms_key,
                payload,
                stale_link,
            } => {
                if let Some(stale) = &stale_link {
                    tracing::warn!(
                        cms_key = cms_key.as_deref().unwrap_or("-"),
                        stale_commerce_product_id = %stale,
                        "linked Medusa product no longer exists; recreating"
                    );
                }
                self.create(cms_key, &payload, report).await;
            }
        }
    }

    async fn create(
        &self,
        cms_key: Option<String>,
        payload: &CreateProductPayload,
        report: &mut SyncReport,
    ) {
        let key = cms_key.as_deref().unwrap_or("-");
        let product = match self.medusa.create_product(payload).await {
            Ok(product) => product,
            Err(e) => {
                report.failed += 1;
                let e = SyncError::from(e);
                tracing::error!(
                    cms_key = key,
                    title = %payload.title,
                    kind = e.kind(),
                    transient = e.is_transient(),
                    error = %e,
                    "failed to create product in Medusa"
                );
                return;
            }
        };

        report.created += 1;
        tracing::info!(
            cms_key = key,
            commerce_product_id = %product.id,
            title = %product.title,
            "product created in Medusa"
        );

        let Some(cms_key) = cms_key else {
            return;
        };
        let link = ProductLink {
            cms_key,
            commerce_product_id: product.id,
            title: payload.title.clone(),
        };
        if let Err(e) = self.links.upsert(&link).await {
            tracing::error!(
                cms_key = %link.cms_key,
                commerce_product_id = %link.commerce_product_id,
                error = %e,
                "product created but link not recorded"
            );
        }
    }
}

#[cfg(test)]
#[path = "bulk_test.rs"]
mod tests;
