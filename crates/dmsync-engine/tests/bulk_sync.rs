//! Bulk sync runs against mocked Directus and Medusa servers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dmsync_directus::DirectusClient;
use dmsync_engine::{BulkSync, LinkStore, SyncError};
use dmsync_medusa::MedusaClient;

const COLLECTION: &str = "weframe_products";

struct Harness {
    directus: MockServer,
    medusa: MockServer,
    links: LinkStore,
}

impl Harness {
    async fn start() -> Self {
        Self {
            directus: MockServer::start().await,
            medusa: MockServer::start().await,
            links: LinkStore::memory(),
        }
    }

    fn job(&self) -> BulkSync {
        let directus = DirectusClient::new(&self.directus.uri(), "cms-token", 5).unwrap();
        let medusa = MedusaClient::new(&self.medusa.uri(), "medusa-key", 5).unwrap();
        BulkSync::new(
            Arc::new(directus),
            Arc::new(medusa),
            self.links.clone(),
            COLLECTION,
            "usd",
        )
    }

    async fn cms_rows(&self, rows: Value) {
        Mock::given(method("GET"))
            .and(path("/items/weframe_products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rows})))
            .mount(&self.directus)
            .await;
    }

    async fn commerce_products(&self, products: Value) {
        let count = products.as_array().map_or(0, Vec::len);
        Mock::given(method("GET"))
            .and(path("/admin/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": products,
                "count": count,
                "offset": 0,
                "limit": 100
            })))
            .mount(&self.medusa)
            .await;
    }
}

#[tokio::test]
async fn creates_missing_product_with_bulk_payload() {
    let h = Harness::start().await;
    h.cms_rows(json!([{"id": 1, "product_name": "Lamp", "price": 19.99}]))
        .await;
    h.commerce_products(json!([{"id": "prod_chair", "title": "Chair"}]))
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/products"))
        .and(body_partial_json(json!({
            "title": "Lamp",
            "handle": "lamp",
            "options": [{"title": "Default Option", "values": ["Default Value"]}],
            "variants": [{
                "title": "Lamp Variant",
                "prices": [{"currency_code": "usd", "amount": 1999}]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {"id": "prod_lamp", "title": "Lamp"}
        })))
        .expect(1)
        .mount(&h.medusa)
        .await;

    let report = h.job().run(false).await.expect("run succeeds");

    assert_eq!(report.scanned, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.failed, 0);
    let link = h.links.find("1").await.unwrap().expect("link recorded");
    assert_eq!(link.commerce_product_id, "prod_lamp");
}

#[tokio::test]
async fn second_run_creates_nothing() {
    let h = Harness::start().await;
    h.cms_rows(json!([{"id": 1, "product_name": "Lamp", "price": 19.99}]))
        .await;

    // First listing is empty; after the create Medusa reports the new product.
    Mock::given(method("GET"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [], "count": 0
        })))
        .up_to_n_times(1)
        .mount(&h.medusa)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": "prod_lamp", "title": "Lamp"}], "count": 1
        })))
        .mount(&h.medusa)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {"id": "prod_lamp", "title": "Lamp"}
        })))
        .expect(1)
        .mount(&h.medusa)
        .await;

    let job = h.job();
    let first = job.run(false).await.unwrap();
    let second = job.run(false).await.unwrap();

    assert_eq!(first.created, 1);
    assert_eq!(second.created, 0);
    assert_eq!(second.up_to_date, 1);
}

#[tokio::test]
async fn overlapping_runs_create_each_product_once() {
    let h = Harness::start().await;
    h.cms_rows(json!([{"id": 1, "product_name": "Lamp", "price": 19.99}]))
        .await;
    h.commerce_products(json!([])).await;
    Mock::given(method("POST"))
        .and(path("/admin/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"product": {"id": "prod_lamp", "title": "Lamp"}}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&h.medusa)
        .await;

    let job = h.job();
    let (first, second) = tokio::join!(job.run(false), job.run(false));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.created + second.created, 1);
    assert!(first.skipped ^ second.skipped, "exactly one pass is skipped");
    let skipped = if first.skipped { &first } else { &second };
    assert_eq!(skipped.scanned, 0);
    assert_eq!(skipped.to_string(), "skipped (another bulk sync is running)");

    // The lock is released once the winning pass finishes.
    Mock::given(method("GET"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": "prod_lamp", "title": "Lamp"}], "count": 1
        })))
        .with_priority(1)
        .mount(&h.medusa)
        .await;
    let third = job.run(false).await.unwrap();
    assert!(!third.skipped);
    assert_eq!(third.up_to_date, 1);
}

#[tokio::test]
async fn adopts_existing_product_with_same_title() {
    let h = Harness::start().await;
    h.cms_rows(json!([{"id": "a1", "product_name": "Chair", "price": "45.00"}]))
        .await;
    h.commerce_products(json!([{"id": "prod_chair", "title": "Chair"}]))
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.medusa)
        .await;

    let report = h.job().run(false).await.unwrap();

    assert_eq!(report.adopted, 1);
    assert_eq!(
        h.links.find("a1").await.unwrap().unwrap().commerce_product_id,
        "prod_chair"
    );
}

#[tokio::test]
async fn colliding_slugs_produce_separate_creates() {
    let h = Harness::start().await;
    h.cms_rows(json!([
        {"id": 1, "product_name": "Lamp!", "price": 1},
        {"id": 2, "product_name": "lamp", "price": 1}
    ]))
    .await;
    h.commerce_products(json!([])).await;

    Mock::given(method("POST"))
        .and(path("/admin/products"))
        .and(body_partial_json(json!({"title": "Lamp!", "handle": "lamp"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {"id": "prod_1", "title": "Lamp!"}
        })))
        .expect(1)
        .mount(&h.medusa)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/products"))
        .and(body_partial_json(json!({"title": "lamp", "handle": "lamp"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {"id": "prod_2", "title": "lamp"}
        })))
        .expect(1)
        .mount(&h.medusa)
        .await;

    let report = h.job().run(false).await.unwrap();
    assert_eq!(report.created, 2);
}

#[tokio::test]
async fn per_row_failures_do_not_stop_the_run() {
    let h = Harness::start().await;
    h.cms_rows(json!([
        {"id": 1, "product_name": "Broken", "price": 1},
        {"id": 2, "product_name": "", "price": 1},
        {"id": 3, "product_name": "Works", "price": 2}
    ]))
    .await;
    h.commerce_products(json!([])).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"title": "Broken"})))
        .respond_with(ResponseTemplate::new(422).set_body_string("handle taken"))
        .mount(&h.medusa)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"title": "Works"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {"id": "prod_3", "title": "Works"}
        })))
        .expect(1)
        .mount(&h.medusa)
        .await;

    let report = h.job().run(false).await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.invalid, 1);
    assert_eq!(report.created, 1);
    assert!(h.links.find("1").await.unwrap().is_none());
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let h = Harness::start().await;
    h.cms_rows(json!([
        {"id": 1, "product_name": "Lamp", "price": 1},
        {"id": 2, "product_name": "Chair", "price": 1}
    ]))
    .await;
    h.commerce_products(json!([{"id": "prod_chair", "title": "Chair"}]))
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.medusa)
        .await;

    let report = h.job().run(true).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.created, 1);
    assert_eq!(report.adopted, 1);
    assert!(h.links.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn commerce_listing_failure_aborts_before_reading_cms() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&h.medusa)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&h.directus)
        .await;

    let err = h.job().run(false).await.unwrap_err();
    assert!(matches!(err, SyncError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn cms_listing_failure_aborts_without_creating() {
    let h = Harness::start().await;
    h.commerce_products(json!([])).await;
    Mock::given(method("GET"))
        .and(path("/items/weframe_products"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{"message": "You don't have permission to access this."}]
        })))
        .mount(&h.directus)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.medusa)
        .await;

    let err = h.job().run(false).await.unwrap_err();
    match err {
        SyncError::Rejected {
            service,
            status,
            body,
        } => {
            assert_eq!(service, "directus");
            assert_eq!(status, 403);
            assert!(body.contains("permission"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}
