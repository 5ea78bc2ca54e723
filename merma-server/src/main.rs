use std::env;
use std::fs;
use std::process;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use merma_pipeline::alert::{NEAR_EXPIRY_WARNING_COUNT, WASTE_RATIO_CRITICAL_PCT};
use merma_pipeline::loader::{DataCatalog, DataPaths};
use merma_pipeline::types::NEAR_EXPIRY_DEFAULT_DAYS;
use merma_pipeline::{evaluate, export, AlertLevel, DashboardQuery, DashboardSnapshot, Selection};

/// Near-expiry rows shown before the list is truncated.
const NEAR_EXPIRY_DISPLAY_LIMIT: usize = 12;

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DigestJson<'a> {
    generated_at: String,
    load_ms: u128,
    eval_ms: u128,
    #[serde(flatten)]
    snapshot: &'a DashboardSnapshot,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

/// Format a quantity with comma thousands separators. Fractions are
/// dropped for display; the JSON output keeps full precision.
fn format_amount(amount: f64) -> String {
    let whole = amount.abs() as u64;
    let sign = if amount < 0.0 { "-" } else { "" };

    if whole < 1_000 {
        return format!("{}{}", sign, whole);
    }

    let s = whole.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    format!("{}{}", sign, result.chars().rev().collect::<String>())
}

/// Proportional bar for the branch and category charts, up to 24 cells.
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * 24.0).round().max(1.0) as usize;
    "\u{2588}".repeat(cells)
}

fn alert_line(snapshot: &DashboardSnapshot) -> String {
    let kpis = &snapshot.kpis;
    match snapshot.alert {
        AlertLevel::Critical => format!(
            "!! CRITICAL  waste ratio {:.1}% exceeds the {:.0}% threshold",
            kpis.waste_ratio, WASTE_RATIO_CRITICAL_PCT
        ),
        AlertLevel::Warning => format!(
            "!  WARNING   {} products near expiry (limit {})",
            kpis.near_expiry_count, NEAR_EXPIRY_WARNING_COUNT
        ),
        AlertLevel::Ok => "   OK        waste and expiry within thresholds".to_string(),
    }
}

fn print_human(snapshot: &DashboardSnapshot, catalog: &DataCatalog, load_ms: u128, eval_ms: u128) {
    let kpis = &snapshot.kpis;
    let views = &snapshot.views;

    println!();
    println!("  \u{2554}{:\u{2550}<62}\u{2557}", "");
    println!("  \u{2551}{:^62}\u{2551}", "MERMA \u{00b7} Supermarket Waste Dashboard");
    println!("  \u{255a}{:\u{2550}<62}\u{255d}", "");
    println!();
    println!(
        "  branch: {}  \u{00b7}  category: {}  \u{00b7}  near-expiry window: {} days",
        snapshot.query.branch, snapshot.query.category, snapshot.query.near_expiry_days
    );
    println!(
        "  {} of {} sales rows in view  \u{00b7}  {} discard rows  \u{00b7}  evaluated on {}",
        snapshot.tables.sales.len(),
        catalog.sales.len(),
        snapshot.tables.discards.len(),
        snapshot.evaluated_on
    );
    println!();
    println!("  {}", alert_line(snapshot));
    println!();

    println!("  Units sold          {:>12}", format_amount(kpis.total_sales));
    println!("  Units discarded     {:>12}", format_amount(kpis.total_discards));
    println!("  Waste ratio         {:>11.1}%", kpis.waste_ratio);
    println!("  Sales value         {:>12}", format!("${}", format_amount(kpis.sales_value)));
    println!("  Estimated loss      {:>12}", format!("${}", format_amount(kpis.estimated_loss_value)));
    println!("  Donation ratio      {:>11.1}%", kpis.donation_ratio);
    println!("  Near expiry         {:>12}", kpis.near_expiry_count);
    println!("  Perishable stock    {:>12}", format_amount(kpis.perishable_stock));
    println!("  Non-perishable      {:>12}", format_amount(kpis.non_perishable_stock));

    if snapshot.tables.sales.is_empty() && snapshot.tables.discards.is_empty() {
        println!();
        println!("  No rows match the current filters.");
    }

    if !views.discards_by_branch.is_empty() {
        println!();
        println!("  Discards by branch");
        let max = views.discards_by_branch.iter().map(|r| r.quantity).fold(0.0_f64, f64::max);
        for row in &views.discards_by_branch {
            println!(
                "    {:<16} {:>9}  {}",
                row.branch,
                format_amount(row.quantity),
                bar(row.quantity, max)
            );
        }
    }

    if !views.top_discarded_products.is_empty() {
        println!();
        println!("  Top {} discarded products", views.top_discarded_products.len());
        for (i, row) in views.top_discarded_products.iter().enumerate() {
            println!("  {:>4}. {:<24} {:>9}", i + 1, row.product, format_amount(row.quantity));
        }
    }

    if !views.near_expiry.is_empty() {
        println!();
        println!("  Near-expiry stock (within {} days)", snapshot.query.near_expiry_days);
        for item in views.near_expiry.iter().take(NEAR_EXPIRY_DISPLAY_LIMIT) {
            let age = if item.days_until_expiry < 0 {
                "expired".to_string()
            } else {
                format!("{}d left", item.days_until_expiry)
            };
            println!(
                "    {:<20} {:<10} {:>7} units  {} ({})",
                item.product,
                item.branch,
                format_amount(item.stock),
                item.expiration_date,
                age
            );
        }
        if views.near_expiry.len() > NEAR_EXPIRY_DISPLAY_LIMIT {
            println!("    +{} more", views.near_expiry.len() - NEAR_EXPIRY_DISPLAY_LIMIT);
        }
    }

    if !views.discard_pivot.is_empty() {
        println!();
        println!("  Discards by category and branch");
        print!("    {:<16}", "");
        for branch in &views.discard_pivot.branches {
            print!("{:>12}", branch);
        }
        println!();
        for row in &views.discard_pivot.rows {
            print!("    {:<16}", row.category);
            for cell in &row.cells {
                print!("{:>12}", format_amount(*cell));
            }
            println!();
        }
    }

    if !views.sales_by_category.is_empty() {
        println!();
        println!("  Sales by category");
        let max = views.sales_by_category.iter().map(|r| r.quantity).fold(0.0_f64, f64::max);
        for row in &views.sales_by_category {
            println!(
                "    {:<16} {:>9}  {}",
                row.category,
                format_amount(row.quantity),
                bar(row.quantity, max)
            );
        }
    }

    if !views.sales_by_date.is_empty() {
        println!();
        println!("  Sales by day");
        let max = views.sales_by_date.iter().map(|r| r.quantity).fold(0.0_f64, f64::max);
        for row in &views.sales_by_date {
            println!(
                "    {}      {:>9}  {}",
                row.date,
                format_amount(row.quantity),
                bar(row.quantity, max)
            );
        }
    }

    if !snapshot.donation_sites.is_empty() {
        println!();
        println!("  Community kitchens");
        for site in &snapshot.donation_sites {
            println!(
                "    {:<24} {:<10} {:>7} units  ({:.4}, {:.4})",
                site.name,
                site.zone,
                format_amount(site.donation_quantity),
                site.point.lat,
                site.point.lon
            );
        }
    }

    if !snapshot.suppliers.is_empty() {
        println!();
        println!("  Suppliers");
        for supplier in &snapshot.suppliers {
            println!(
                "    {:<24} {:<14} delivers in {} day{}",
                supplier.name,
                supplier.category,
                supplier.delivery_days,
                if supplier.delivery_days == 1 { "" } else { "s" }
            );
        }
    }

    println!();
    println!(
        "  \u{23f1}  Tables loaded in {}ms \u{00b7} Evaluated in {}ms \u{00b7} Total {}ms",
        load_ms,
        eval_ms,
        load_ms + eval_ms
    );
    println!();
}

/// Point out a selection that cannot match anything. The evaluation
/// still runs and renders an empty dashboard.
fn warn_unknown_selection(what: &str, selection: &Selection, known: &[String]) {
    if let Selection::Only(name) = selection {
        if !known.iter().any(|k| k == name) {
            eprintln!(
                "Warning: {} '{}' not present in sales data; dashboard will be empty",
                what, name
            );
            eprintln!("  Available: {:?}", known);
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_default_env().init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: merma-server <data-dir> [--branch NAME] [--category NAME] [--expiry-days N] [--json] [--export-donations FILE]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --branch            Narrow the dashboard to one branch");
        eprintln!("  --category          Narrow the dashboard to one category");
        eprintln!("  --expiry-days       Near-expiry window in days, 1-10 (default: 3)");
        eprintln!("  --json              Output the snapshot as JSON instead of formatted text");
        eprintln!("  --export-donations  Write the donation table to FILE as CSV");
        eprintln!();
        eprintln!("The data directory must contain sales.csv, inventory.csv, discards.csv,");
        eprintln!("suppliers.csv and donations.csv.");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  merma-server fixtures/");
        eprintln!("  merma-server fixtures/ --branch Centro --json");
        eprintln!("  merma-server fixtures/ --category Dairy --expiry-days 5");
        process::exit(1);
    }

    let data_dir = &args[1];

    // Parse optional flags
    let mut branch = Selection::All;
    let mut category = Selection::All;
    let mut expiry_days = NEAR_EXPIRY_DEFAULT_DAYS;
    let mut json_output = false;
    let mut export_path: Option<String> = None;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--branch" => {
                if i + 1 < args.len() {
                    branch = Selection::only(args[i + 1].trim());
                    i += 2;
                } else {
                    eprintln!("Error: --branch requires a branch name");
                    process::exit(1);
                }
            }
            "--category" => {
                if i + 1 < args.len() {
                    category = Selection::only(args[i + 1].trim());
                    i += 2;
                } else {
                    eprintln!("Error: --category requires a category name");
                    process::exit(1);
                }
            }
            "--expiry-days" => {
                if i + 1 < args.len() {
                    expiry_days = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: --expiry-days requires an integer");
                        process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: --expiry-days requires a number");
                    process::exit(1);
                }
            }
            "--json" => {
                json_output = true;
                i += 1;
            }
            "--export-donations" => {
                if i + 1 < args.len() {
                    export_path = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("Error: --export-donations requires a file path");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
    }

    let query = match DashboardQuery::new(branch, category, expiry_days) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Load the five tables from the data directory
    let load_start = Instant::now();
    let catalog = match DataCatalog::load(&DataPaths::from_dir(data_dir)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading tables: {}", e);
            process::exit(1);
        }
    };
    let load_ms = load_start.elapsed().as_millis();

    warn_unknown_selection("branch", &query.branch, &catalog.branches());
    warn_unknown_selection("category", &query.category, &catalog.categories());

    log::info!(
        "query: branch={} category={} window={}d",
        query.branch,
        query.category,
        query.near_expiry_days
    );

    let today = Utc::now().date_naive();
    let eval_start = Instant::now();
    let snapshot = evaluate(&catalog, &query, today);
    let eval_ms = eval_start.elapsed().as_millis();

    if let Some(path) = export_path {
        match export::donations_to_csv(&catalog.donations) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&path, bytes) {
                    eprintln!("Error writing {}: {}", path, e);
                    process::exit(1);
                }
                eprintln!("Donation table written to {}", path);
            }
            Err(e) => {
                eprintln!("Error exporting donations: {}", e);
                process::exit(1);
            }
        }
    }

    if json_output {
        let digest = DigestJson {
            generated_at: Utc::now().to_rfc3339(),
            load_ms,
            eval_ms,
            snapshot: &snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&digest).unwrap());
    } else {
        print_human(&snapshot, &catalog, load_ms, eval_ms);
    }
}
