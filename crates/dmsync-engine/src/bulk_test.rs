use serde_json::json;

use super::*;

fn row(id: &str, name: &str, price: f64) -> CmsProduct {
    CmsProduct::from_value(json!({"id": id, "product_name": name, "price": price}))
        .expect("valid row")
}

fn product(id: &str, title: &str) -> CommerceProduct {
    CommerceProduct {
        id: id.to_owned(),
        title: title.to_owned(),
        handle: None,
        status: None,
    }
}

fn link(cms_key: &str, commerce_product_id: &str) -> ProductLink {
    ProductLink {
        cms_key: cms_key.to_owned(),
        commerce_product_id: commerce_product_id.to_owned(),
        title: String::new(),
    }
}

#[test]
fn unmatched_row_is_planned_for_creation() {
    let plans = plan_rows(
        &[row("1", "Lamp", 19.99)],
        &[product("prod_1", "Chair")],
        &[],
        "usd",
    );

    match &plans[..] {
        [RowPlan::Create {
            cms_key, payload, ..
        }] => {
            assert_eq!(cms_key.as_deref(), Some("1"));
            assert_eq!(payload.title, "Lamp");
            assert_eq!(payload.handle.as_deref(), Some("lamp"));
            assert_eq!(payload.primary_amount(), Some(1999));
        }
        other => panic!("expected one Create, got {other:?}"),
    }
}

#[test]
fn linked_row_with_live_product_is_up_to_date() {
    let plans = plan_rows(
        &[row("1", "Lamp (renamed)", 19.99)],
        &[product("prod_1", "Lamp")],
        &[link("1", "prod_1")],
        "usd",
    );
    assert_eq!(
        plans,
        vec![RowPlan::UpToDate {
            cms_key: Some("1".to_owned()),
            commerce_product_id: "prod_1".to_owned(),
        }]
    );
}

#[test]
fn linked_row_with_missing_product_is_recreated() {
    let plans = plan_rows(&[row("1", "Lamp", 5.0)], &[], &[link("1", "prod_gone")], "usd");
    assert!(matches!(
        &plans[..],
        [RowPlan::Create { stale_link: Some(stale), .. }] if stale == "prod_gone"
    ));
}

#[test]
fn unlinked_row_adopts_product_with_same_title() {
    let plans = plan_rows(&[row("1", "Lamp", 5.0)], &[product("prod_1", "Lamp")], &[], "usd");
    assert_eq!(
        plans,
        vec![RowPlan::Adopt {
            cms_key: "1".to_owned(),
            commerce_product_id: "prod_1".to_owned(),
            title: "Lamp".to_owned(),
        }]
    );
}

#[test]
fn product_claimed_by_another_link_is_not_adopted() {
    let plans = plan_rows(
        &[row("2", "Lamp", 5.0)],
        &[product("prod_1", "Lamp")],
        &[link("1", "prod_1")],
        "usd",
    );
    assert!(matches!(&plans[..], [RowPlan::Create { .. }]));
}

#[test]
fn one_product_is_adopted_at_most_once_per_run() {
    let plans = plan_rows(
        &[row("1", "Lamp", 5.0), row("2", "Lamp", 5.0)],
        &[product("prod_1", "Lamp")],
        &[],
        "usd",
    );
    assert!(matches!(plans[0], RowPlan::Adopt { .. }));
    assert!(matches!(plans[1], RowPlan::Create { .. }));
}

#[test]
fn title_match_is_exact() {
    let plans = plan_rows(&[row("1", "lamp", 5.0)], &[product("prod_1", "Lamp")], &[], "usd");
    assert!(matches!(&plans[..], [RowPlan::Create { .. }]));
}

#[test]
fn rows_with_colliding_slugs_are_planned_separately() {
    let plans = plan_rows(
        &[row("1", "Lamp!", 1.0), row("2", "lamp", 1.0)],
        &[],
        &[],
        "usd",
    );
    let handles: Vec<_> = plans
        .iter()
        .map(|p| match p {
            RowPlan::Create { payload, .. } => payload.handle.clone(),
            other => panic!("expected Create, got {other:?}"),
        })
        .collect();
    assert_eq!(handles, vec![Some("lamp".to_owned()), Some("lamp".to_owned())]);
}

#[test]
fn rows_without_name_or_price_are_invalid() {
    let nameless = CmsProduct::from_value(json!({"id": 3, "price": 1})).unwrap();
    let priceless = CmsProduct::from_value(json!({"id": 4, "product_name": "Rug"})).unwrap();

    let plans = plan_rows(&[nameless, priceless], &[], &[], "usd");
    assert!(
        matches!(&plans[..], [RowPlan::Invalid { cms_key: Some(a), .. }, RowPlan::Invalid { cms_key: Some(b), .. }] if a == "3" && b == "4")
    );
}

#[test]
fn report_display_flags_dry_run() {
    let report = SyncReport {
        scanned: 2,
        created: 1,
        up_to_date: 1,
        dry_run: true,
        ..SyncReport::default()
    };
    assert_eq!(
        report.to_string(),
        "scanned=2 up_to_date=1 adopted=0 created=1 invalid=0 failed=0 (dry run)"
    );
}
