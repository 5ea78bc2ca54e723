//! End-to-end tests over a small but realistic catalog: three branches,
//! three categories, and enough discard and expiry structure to exercise
//! every stage of an evaluation.

use chrono::NaiveDate;
use merma_pipeline::loader::{
    load_donations, DiscardRecord, DonationRecord, InventoryRecord, SaleRecord, SupplierRecord,
};
use merma_pipeline::{
    evaluate, filter, AlertLevel, DashboardQuery, DataCatalog, Selection,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2025, 3, 14)
}

fn sale(date_: NaiveDate, branch: &str, category: &str, product: &str, quantity: f64, unit_price: f64) -> SaleRecord {
    SaleRecord {
        date: date_,
        branch: branch.to_string(),
        category: category.to_string(),
        product: product.to_string(),
        quantity,
        unit_price,
    }
}

fn discard(branch: &str, category: &str, product: &str, quantity: f64) -> DiscardRecord {
    DiscardRecord {
        date: date(2025, 3, 12),
        branch: branch.to_string(),
        category: category.to_string(),
        product: product.to_string(),
        quantity,
    }
}

fn stock(product: &str, category: &str, branch: &str, stock: f64, expires: NaiveDate) -> InventoryRecord {
    InventoryRecord {
        product: product.to_string(),
        category: category.to_string(),
        branch: branch.to_string(),
        stock,
        expiration_date: expires,
    }
}

fn kitchen(name: &str, zone: &str, quantity: f64) -> DonationRecord {
    DonationRecord {
        name: name.to_string(),
        address: "Av. Belgrano 120".to_string(),
        zone: zone.to_string(),
        donation_quantity: quantity,
        last_shipment_date: date(2025, 3, 1),
    }
}

/// Three branches, three categories. Quantities are chosen so every
/// aggregate below is exact integer arithmetic.
fn sample_catalog() -> DataCatalog {
    DataCatalog::from_tables(
        vec![
            sale(date(2025, 3, 10), "Centro", "Dairy", "Yogurt", 40.0, 3.0),
            sale(date(2025, 3, 11), "Centro", "Dairy", "Milk", 60.0, 2.0),
            sale(date(2025, 3, 10), "Centro", "Bakery", "Baguette", 50.0, 1.5),
            sale(date(2025, 3, 12), "Norte", "Dairy", "Milk", 30.0, 2.0),
            sale(date(2025, 3, 11), "Norte", "Cleaning", "Detergent", 20.0, 5.0),
            sale(date(2025, 3, 12), "Sur", "Bakery", "Croissant", 25.0, 2.0),
        ],
        vec![
            stock("Yogurt", "Dairy", "Centro", 40.0, date(2025, 3, 16)),
            stock("Milk", "Dairy", "Centro", 30.0, date(2025, 3, 17)),
            stock("Cheese", "Dairy", "Norte", 20.0, date(2025, 3, 18)),
            stock("Baguette", "Bakery", "Centro", 25.0, date(2025, 3, 13)),
            stock("Detergent", "Cleaning", "Norte", 60.0, date(2026, 1, 1)),
            stock("Croissant", "Bakery", "Sur", 15.0, date(2025, 3, 15)),
        ],
        vec![
            discard("Centro", "Dairy", "Yogurt", 10.0),
            discard("Centro", "Bakery", "Baguette", 5.0),
            discard("Norte", "Dairy", "Milk", 8.0),
            discard("Norte", "Dairy", "Cream", 4.0),
            discard("Sur", "Bakery", "Croissant", 3.0),
        ],
        vec![
            SupplierRecord {
                name: "Lacteos del Valle".to_string(),
                category: "Dairy".to_string(),
                delivery_days: 2,
            },
            SupplierRecord {
                name: "Panificadora Sur".to_string(),
                category: "Bakery".to_string(),
                delivery_days: 1,
            },
        ],
        vec![kitchen("Comedor Esperanza", "Centro", 18.0), kitchen("Los Pinos", "Norte", 6.0)],
    )
}

// ---------------------------------------------------------------------------
// End-to-end snapshots
// ---------------------------------------------------------------------------

#[test]
fn full_snapshot_over_the_sample_catalog() {
    let catalog = sample_catalog();
    let snapshot = evaluate(&catalog, &DashboardQuery::default(), today());

    // 40 + 60 + 50 + 30 + 20 + 25 units sold.
    assert_eq!(snapshot.kpis.total_sales, 225.0);
    // 10 + 5 + 8 + 4 + 3 units discarded.
    assert_eq!(snapshot.kpis.total_discards, 30.0);
    // 120 + 120 + 75 + 60 + 100 + 50 in revenue.
    assert_eq!(snapshot.kpis.sales_value, 525.0);
    assert!((snapshot.kpis.waste_ratio - 30.0 / 225.0 * 100.0).abs() < 1e-9);
    // Yogurt (2d), Milk (3d), Baguette (expired), Croissant (1d).
    assert_eq!(snapshot.kpis.near_expiry_count, 4);
    // 24 donated against 30 discarded.
    assert!((snapshot.kpis.donation_ratio - 80.0).abs() < 1e-9);
    // Only Dairy matches the perishable keywords; Bakery and Cleaning
    // stock lands on the other side.
    assert_eq!(snapshot.kpis.perishable_stock, 90.0);
    assert_eq!(snapshot.kpis.non_perishable_stock, 100.0);

    assert_eq!(snapshot.alert, AlertLevel::Ok);
    assert_eq!(snapshot.evaluated_on, today());

    // Pass-through tables survive unfiltered.
    assert_eq!(snapshot.suppliers.len(), 2);
    assert_eq!(snapshot.donation_sites.len(), 2);

    // The KPI count and the near-expiry view describe the same rows.
    assert_eq!(snapshot.views.near_expiry.len(), snapshot.kpis.near_expiry_count);
    assert_eq!(snapshot.views.sales_by_branch.len(), 3);
    assert_eq!(snapshot.views.sales_by_date.len(), 3);
}

#[test]
fn branch_filter_narrows_every_derived_number() {
    let catalog = sample_catalog();
    let query = DashboardQuery {
        branch: Selection::only("Centro"),
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &query, today());

    assert_eq!(snapshot.kpis.total_sales, 150.0);
    assert_eq!(snapshot.kpis.total_discards, 15.0);
    assert_eq!(snapshot.kpis.sales_value, 315.0);
    assert!((snapshot.kpis.waste_ratio - 10.0).abs() < 1e-9);
    assert_eq!(snapshot.kpis.near_expiry_count, 3);
    // Donations are not branch-scoped: 24 / 15.
    assert!((snapshot.kpis.donation_ratio - 160.0).abs() < 1e-9);

    assert!(snapshot.tables.sales.iter().all(|r| r.branch == "Centro"));
    assert!(snapshot.tables.discards.iter().all(|r| r.branch == "Centro"));
    assert_eq!(snapshot.views.discards_by_branch.len(), 1);
    assert_eq!(snapshot.views.discards_by_branch[0].branch, "Centro");
}

#[test]
fn category_filter_joins_discards_through_sales_products() {
    let catalog = sample_catalog();
    let query = DashboardQuery {
        category: Selection::only("Dairy"),
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &query, today());

    // Cream is labeled Dairy in the discard table but never sold, so the
    // product join drops it: 10 Yogurt + 8 Milk remain.
    assert_eq!(snapshot.kpis.total_discards, 18.0);
    assert!(snapshot.tables.discards.iter().all(|r| r.product != "Cream"));

    let sold: Vec<&str> = snapshot.tables.sales.iter().map(|r| r.product.as_str()).collect();
    assert!(snapshot
        .tables
        .discards
        .iter()
        .all(|r| sold.contains(&r.product.as_str())));

    assert_eq!(snapshot.kpis.total_sales, 130.0);
    assert!((snapshot.kpis.waste_ratio - 18.0 / 130.0 * 100.0).abs() < 1e-9);
}

#[test]
fn unknown_branch_degrades_to_an_empty_dashboard() {
    let catalog = sample_catalog();
    let query = DashboardQuery {
        branch: Selection::only("Oeste"),
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &query, today());

    assert!(snapshot.tables.sales.is_empty());
    assert!(snapshot.tables.inventory.is_empty());
    assert!(snapshot.tables.discards.is_empty());
    assert_eq!(snapshot.kpis.total_sales, 0.0);
    assert_eq!(snapshot.kpis.waste_ratio, 0.0);
    assert_eq!(snapshot.kpis.donation_ratio, 0.0);
    assert_eq!(snapshot.alert, AlertLevel::Ok);
    assert!(snapshot.views.top_discarded_products.is_empty());
    assert!(snapshot.views.discard_pivot.is_empty());

    // Pass-through tables are not branch-scoped and stay intact.
    assert_eq!(snapshot.suppliers.len(), 2);
    assert_eq!(snapshot.donation_sites.len(), 2);
}

#[test]
fn snapshots_are_reproducible() {
    let catalog = sample_catalog();
    let query = DashboardQuery::default();
    let first = evaluate(&catalog, &query, today());
    let second = evaluate(&catalog, &query, today());
    assert_eq!(first.kpis, second.kpis);
    assert_eq!(first.views, second.views);
    assert_eq!(first.donation_sites, second.donation_sites);
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn branch_then_category_matches_the_single_pass() {
    let catalog = sample_catalog();
    let combined = DashboardQuery {
        branch: Selection::only("Centro"),
        category: Selection::only("Dairy"),
        ..DashboardQuery::default()
    };
    let single_pass = filter::apply(&catalog, &combined);

    let branch_only = DashboardQuery {
        branch: Selection::only("Centro"),
        ..DashboardQuery::default()
    };
    let narrowed = filter::apply(&catalog, &branch_only);
    let narrowed_catalog = DataCatalog::from_tables(
        narrowed.sales,
        narrowed.inventory,
        narrowed.discards,
        catalog.suppliers.clone(),
        catalog.donations.clone(),
    );
    let category_only = DashboardQuery {
        category: Selection::only("Dairy"),
        ..DashboardQuery::default()
    };
    let sequential = filter::apply(&narrowed_catalog, &category_only);

    assert_eq!(sequential, single_pass);
}

#[test]
fn combined_filters_intersect() {
    let catalog = sample_catalog();
    let query = DashboardQuery {
        branch: Selection::only("Norte"),
        category: Selection::only("Dairy"),
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &query, today());

    assert_eq!(snapshot.kpis.total_sales, 30.0);
    // Milk sells in Norte Dairy; Cream still never sells anywhere.
    assert_eq!(snapshot.kpis.total_discards, 8.0);
    assert_eq!(snapshot.kpis.near_expiry_count, 0);
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[test]
fn top_discard_ranking_caps_at_ten() {
    let discards: Vec<DiscardRecord> = (1..=12)
        .map(|i| discard("Centro", "Dairy", &format!("P{i:02}"), f64::from(i)))
        .collect();
    let catalog = DataCatalog::from_tables(vec![], vec![], discards, vec![], vec![]);
    let snapshot = evaluate(&catalog, &DashboardQuery::default(), today());

    let top = &snapshot.views.top_discarded_products;
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].product, "P12");
    assert_eq!(top[0].quantity, 12.0);
    assert!(top.iter().all(|r| r.product != "P01" && r.product != "P02"));
}

#[test]
fn pivot_grid_is_dense_and_zero_filled() {
    let catalog = sample_catalog();
    let snapshot = evaluate(&catalog, &DashboardQuery::default(), today());
    let pivot = &snapshot.views.discard_pivot;

    assert_eq!(pivot.branches, vec!["Centro", "Norte", "Sur"]);
    let categories: Vec<&str> = pivot.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["Bakery", "Dairy"]);

    assert_eq!(pivot.cell("Dairy", "Centro"), 10.0);
    assert_eq!(pivot.cell("Dairy", "Norte"), 12.0);
    assert_eq!(pivot.cell("Bakery", "Sur"), 3.0);
    // Dairy was never discarded in Sur, Bakery never in Norte: the cells
    // exist and are exactly zero.
    assert_eq!(pivot.cell("Dairy", "Sur"), 0.0);
    assert_eq!(pivot.cell("Bakery", "Norte"), 0.0);
}

#[test]
fn near_expiry_window_moves_the_cutoff() {
    let catalog = sample_catalog();

    let tight = DashboardQuery {
        near_expiry_days: 1,
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &tight, today());
    // Only the expired Baguette and the one-day Croissant.
    assert_eq!(snapshot.kpis.near_expiry_count, 2);
    let names: Vec<&str> = snapshot.views.near_expiry.iter().map(|i| i.product.as_str()).collect();
    assert_eq!(names, vec!["Baguette", "Croissant"]);

    let wide = DashboardQuery {
        near_expiry_days: 10,
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &wide, today());
    // Everything but the long-dated Detergent.
    assert_eq!(snapshot.kpis.near_expiry_count, 5);
}

#[test]
fn estimated_loss_uses_observed_prices() {
    let catalog = sample_catalog();
    let query = DashboardQuery {
        category: Selection::only("Dairy"),
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &query, today());
    // Yogurt discards price at 3.0, Milk at 2.0: 10×3 + 8×2.
    assert!((snapshot.kpis.estimated_loss_value - 46.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Alerts and thresholds
// ---------------------------------------------------------------------------

#[test]
fn heavy_discards_trip_the_critical_alert() {
    let catalog = DataCatalog::from_tables(
        vec![sale(date(2025, 3, 10), "Centro", "Dairy", "Yogurt", 100.0, 3.0)],
        vec![],
        vec![discard("Centro", "Dairy", "Yogurt", 30.0)],
        vec![],
        vec![],
    );
    let snapshot = evaluate(&catalog, &DashboardQuery::default(), today());
    assert!((snapshot.kpis.waste_ratio - 30.0).abs() < 1e-9);
    assert_eq!(snapshot.alert, AlertLevel::Critical);
}

#[test]
fn a_wall_of_expiring_stock_trips_the_warning() {
    let inventory: Vec<InventoryRecord> = (0..51)
        .map(|i| stock(&format!("Item{i}"), "Dairy", "Centro", 1.0, date(2025, 3, 15)))
        .collect();
    let catalog = DataCatalog::from_tables(
        vec![sale(date(2025, 3, 10), "Centro", "Dairy", "Yogurt", 100.0, 3.0)],
        inventory,
        vec![discard("Centro", "Dairy", "Yogurt", 10.0)],
        vec![],
        vec![],
    );
    let snapshot = evaluate(&catalog, &DashboardQuery::default(), today());
    assert_eq!(snapshot.kpis.near_expiry_count, 51);
    assert_eq!(snapshot.alert, AlertLevel::Warning);
}

// ---------------------------------------------------------------------------
// Serialization and export
// ---------------------------------------------------------------------------

#[test]
fn snapshot_serializes_to_json() {
    let catalog = sample_catalog();
    let query = DashboardQuery {
        branch: Selection::only("Centro"),
        ..DashboardQuery::default()
    };
    let snapshot = evaluate(&catalog, &query, today());
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["alert"], "ok");
    assert_eq!(json["evaluated_on"], "2025-03-14");
    assert_eq!(json["query"]["branch"]["only"], "Centro");
    assert_eq!(json["query"]["category"], "all");
    assert_eq!(json["kpis"]["total_sales"], 150.0);
    assert_eq!(json["views"]["discard_pivot"]["branches"][0], "Centro");
    assert_eq!(json["donation_sites"][0]["name"], "Comedor Esperanza");
}

#[test]
fn donation_export_reads_back_identically() {
    let catalog = sample_catalog();
    let bytes = merma_pipeline::export::donations_to_csv(&catalog.donations).unwrap();
    let reread = load_donations(bytes.as_slice()).unwrap();
    assert_eq!(reread, catalog.donations);
}

#[test]
fn catalog_builds_from_csv_text() {
    let sales_csv = "\
date,branch,category,product,quantity,unit_price
2025-03-10,Centro,Dairy,Yogurt,40,3.00
11/03/2025,Norte,Bakery,Baguette,25,1.50
";
    let discards_csv = "\
date,branch,category,product,quantity
2025-03-12,Centro,Dairy,Yogurt,4
";
    let sales = merma_pipeline::loader::load_sales(sales_csv.as_bytes()).unwrap();
    let discards = merma_pipeline::loader::load_discards(discards_csv.as_bytes()).unwrap();
    let catalog = DataCatalog::from_tables(sales, vec![], discards, vec![], vec![]);

    assert_eq!(catalog.branches(), vec!["Centro", "Norte"]);
    let snapshot = evaluate(&catalog, &DashboardQuery::default(), today());
    assert_eq!(snapshot.kpis.total_sales, 65.0);
    assert!((snapshot.kpis.waste_ratio - 4.0 / 65.0 * 100.0).abs() < 1e-9);
}
