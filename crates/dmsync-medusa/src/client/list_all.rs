//! Multi-page product listing for `MedusaClient`.

use crate::error::MedusaError;
use crate::types::CommerceProduct;

use super::MedusaClient;
use super::MAX_PAGES;

impl MedusaClient {
    /// Lists every product by walking `offset` forward one page at a time.
    ///
    /// Stops when the reported `count` is reached, or when a page comes back
    /// shorter than requested (for servers that omit `count`).
    ///
    /// **All-or-nothing**: on any page failure the products from earlier pages
    /// are discarded and the error is returned. Comparing against a partial
    /// listing would make the bulk sync create duplicates.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_products_page`]; returns
    /// [`MedusaError::PaginationLimit`] past [`MAX_PAGES`].
    pub async fn list_all_products(&self) -> Result<Vec<CommerceProduct>, MedusaError> {
        let mut all_products: Vec<CommerceProduct> = Vec::new();
        let mut offset: u64 = 0;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_products_page(self.page_size, offset).await?;
            let fetched = page.products.len() as u64;
            all_products.extend(page.products);
            offset += fetched;

            tracing::debug!(fetched, offset, total = ?page.count, "fetched Medusa product page");

            if is_last_page(fetched, u64::from(self.page_size), offset, page.count) {
                return Ok(all_products);
            }
        }

        Err(MedusaError::PaginationLimit {
            max_pages: MAX_PAGES,
        })
    }
}

/// Decides whether the listing is complete after a page of `fetched` items.
fn is_last_page(fetched: u64, requested: u64, offset: u64, count: Option<u64>) -> bool {
    if fetched == 0 {
        return true;
    }
    match count {
        Some(total) => offset >= total,
        None => fetched < requested,
    }
}
