//! CSV loaders for the five dashboard tables.
//!
//! Each table gets a typed record, a reader-based loader and a file-path
//! convenience wrapper. Loading is fail-fast: a missing column, an
//! unparseable row or a negative quantity aborts the whole load with the
//! offending table and line number. The [`DataCatalog`] bundles the five
//! loaded tables and is held by the caller for the life of the process;
//! evaluations borrow it and never go back to disk.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Convenience alias for loader results.
pub type LoadResult<T> = Result<T, LoadError>;

/// Which of the five tables an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    Sales,
    Inventory,
    Discards,
    Suppliers,
    Donations,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Sales => "sales",
            TableKind::Inventory => "inventory",
            TableKind::Discards => "discards",
            TableKind::Suppliers => "suppliers",
            TableKind::Donations => "donations",
        };
        f.write_str(name)
    }
}

/// Errors raised while reading the source tables.
///
/// No stringly-typed errors: every failure mode gets a variant so the
/// caller can report exactly which table, column or line is broken.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {table} table at {}: {source}", .path.display())]
    Open {
        table: TableKind,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {table} header row: {source}")]
    Header { table: TableKind, source: csv::Error },

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn {
        table: TableKind,
        column: &'static str,
    },

    #[error("{table} row {line}: {source}")]
    Row {
        table: TableKind,
        line: u64,
        source: csv::Error,
    },

    #[error("{table} row {line}: '{field}' must be non-negative, got {value}")]
    NegativeValue {
        table: TableKind,
        line: u64,
        field: &'static str,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One sales transaction line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub branch: String,
    pub category: String,
    pub product: String,
    /// Units sold. Fractional values are legal (weighed goods).
    pub quantity: f64,
    pub unit_price: f64,
}

/// One stocked product at one branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product: String,
    pub category: String,
    pub branch: String,
    pub stock: f64,
    #[serde(deserialize_with = "deserialize_date")]
    pub expiration_date: NaiveDate,
}

impl InventoryRecord {
    /// Days until this item expires, relative to `today`. Negative for
    /// items already past their date. Recomputed on every evaluation,
    /// never stored.
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiration_date - today).num_days()
    }
}

/// One discarded (shrink) line: product thrown away at a branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscardRecord {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub branch: String,
    pub category: String,
    pub product: String,
    pub quantity: f64,
}

/// One supplier directory entry. Carried through to the snapshot
/// untransformed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub name: String,
    pub category: String,
    pub delivery_days: u32,
}

/// One community kitchen receiving donated goods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub name: String,
    pub address: String,
    pub zone: String,
    pub donation_quantity: f64,
    #[serde(deserialize_with = "deserialize_date")]
    pub last_shipment_date: NaiveDate,
}

/// Accepts ISO dates (`2025-03-14`) and the day-first form the source
/// exports also use (`14/03/2025`).
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| serde::de::Error::custom(format!("expected a date like 2025-03-14, got '{raw}'")))
}

// ---------------------------------------------------------------------------
// Table loaders
// ---------------------------------------------------------------------------

const SALES_COLUMNS: &[&str] = &["date", "branch", "category", "product", "quantity", "unit_price"];
const INVENTORY_COLUMNS: &[&str] = &["product", "category", "branch", "stock", "expiration_date"];
const DISCARD_COLUMNS: &[&str] = &["date", "branch", "category", "product", "quantity"];
const SUPPLIER_COLUMNS: &[&str] = &["name", "category", "delivery_days"];
const DONATION_COLUMNS: &[&str] = &["name", "address", "zone", "donation_quantity", "last_shipment_date"];

/// Shared loader core: header check, then deserialize row by row.
/// Reported line numbers are 1-based file lines; the header is line 1.
fn load_table<R, T>(
    reader: R,
    table: TableKind,
    required: &'static [&'static str],
    validate: impl Fn(&T, u64) -> LoadResult<()>,
) -> LoadResult<Vec<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| LoadError::Header { table, source })?
        .clone();
    for column in required {
        if !headers.iter().any(|header| header == *column) {
            return Err(LoadError::MissingColumn { table, column });
        }
    }

    let mut records = Vec::new();
    for (idx, row) in csv_reader.deserialize().enumerate() {
        let line = (idx + 2) as u64;
        let record: T = row.map_err(|source| LoadError::Row { table, line, source })?;
        validate(&record, line)?;
        records.push(record);
    }
    Ok(records)
}

fn non_negative(table: TableKind, line: u64, field: &'static str, value: f64) -> LoadResult<()> {
    if value < 0.0 {
        return Err(LoadError::NegativeValue { table, line, field, value });
    }
    Ok(())
}

pub fn load_sales<R: Read>(reader: R) -> LoadResult<Vec<SaleRecord>> {
    load_table(reader, TableKind::Sales, SALES_COLUMNS, |record: &SaleRecord, line| {
        non_negative(TableKind::Sales, line, "quantity", record.quantity)?;
        non_negative(TableKind::Sales, line, "unit_price", record.unit_price)
    })
}

pub fn load_inventory<R: Read>(reader: R) -> LoadResult<Vec<InventoryRecord>> {
    load_table(reader, TableKind::Inventory, INVENTORY_COLUMNS, |record: &InventoryRecord, line| {
        non_negative(TableKind::Inventory, line, "stock", record.stock)
    })
}

pub fn load_discards<R: Read>(reader: R) -> LoadResult<Vec<DiscardRecord>> {
    load_table(reader, TableKind::Discards, DISCARD_COLUMNS, |record: &DiscardRecord, line| {
        non_negative(TableKind::Discards, line, "quantity", record.quantity)
    })
}

pub fn load_suppliers<R: Read>(reader: R) -> LoadResult<Vec<SupplierRecord>> {
    load_table(reader, TableKind::Suppliers, SUPPLIER_COLUMNS, |_: &SupplierRecord, _| Ok(()))
}

pub fn load_donations<R: Read>(reader: R) -> LoadResult<Vec<DonationRecord>> {
    load_table(reader, TableKind::Donations, DONATION_COLUMNS, |record: &DonationRecord, line| {
        non_negative(TableKind::Donations, line, "donation_quantity", record.donation_quantity)
    })
}

fn open(table: TableKind, path: &Path) -> LoadResult<File> {
    File::open(path).map_err(|source| LoadError::Open {
        table,
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_sales_file(path: &Path) -> LoadResult<Vec<SaleRecord>> {
    load_sales(open(TableKind::Sales, path)?)
}

pub fn load_inventory_file(path: &Path) -> LoadResult<Vec<InventoryRecord>> {
    load_inventory(open(TableKind::Inventory, path)?)
}

pub fn load_discards_file(path: &Path) -> LoadResult<Vec<DiscardRecord>> {
    load_discards(open(TableKind::Discards, path)?)
}

pub fn load_suppliers_file(path: &Path) -> LoadResult<Vec<SupplierRecord>> {
    load_suppliers(open(TableKind::Suppliers, path)?)
}

pub fn load_donations_file(path: &Path) -> LoadResult<Vec<DonationRecord>> {
    load_donations(open(TableKind::Donations, path)?)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// File locations for the five tables.
#[derive(Clone, Debug)]
pub struct DataPaths {
    pub sales: PathBuf,
    pub inventory: PathBuf,
    pub discards: PathBuf,
    pub suppliers: PathBuf,
    pub donations: PathBuf,
}

impl DataPaths {
    /// Standard layout: `sales.csv`, `inventory.csv`, `discards.csv`,
    /// `suppliers.csv` and `donations.csv` under one directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        DataPaths {
            sales: dir.join("sales.csv"),
            inventory: dir.join("inventory.csv"),
            discards: dir.join("discards.csv"),
            suppliers: dir.join("suppliers.csv"),
            donations: dir.join("donations.csv"),
        }
    }
}

/// The five loaded tables.
///
/// This is the process-lifetime cache: load once, then pass `&DataCatalog`
/// into each evaluation. Re-filtering never re-reads disk, and nothing
/// mutates the catalog after [`DataCatalog::load`] returns.
#[derive(Clone, Debug)]
pub struct DataCatalog {
    pub sales: Vec<SaleRecord>,
    pub inventory: Vec<InventoryRecord>,
    pub discards: Vec<DiscardRecord>,
    pub suppliers: Vec<SupplierRecord>,
    pub donations: Vec<DonationRecord>,
}

impl DataCatalog {
    /// Load all five tables, failing on the first broken one.
    pub fn load(paths: &DataPaths) -> LoadResult<Self> {
        let catalog = DataCatalog {
            sales: load_sales_file(&paths.sales)?,
            inventory: load_inventory_file(&paths.inventory)?,
            discards: load_discards_file(&paths.discards)?,
            suppliers: load_suppliers_file(&paths.suppliers)?,
            donations: load_donations_file(&paths.donations)?,
        };
        log::info!(
            "catalog loaded: {} sales, {} inventory, {} discard, {} supplier, {} donation rows",
            catalog.sales.len(),
            catalog.inventory.len(),
            catalog.discards.len(),
            catalog.suppliers.len(),
            catalog.donations.len(),
        );
        Ok(catalog)
    }

    /// Build a catalog from already-loaded tables.
    pub fn from_tables(
        sales: Vec<SaleRecord>,
        inventory: Vec<InventoryRecord>,
        discards: Vec<DiscardRecord>,
        suppliers: Vec<SupplierRecord>,
        donations: Vec<DonationRecord>,
    ) -> Self {
        DataCatalog { sales, inventory, discards, suppliers, donations }
    }

    /// Sorted distinct branch names present in the sales table. These are
    /// the legal values for a branch selection.
    pub fn branches(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.sales.iter().map(|r| r.branch.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Sorted distinct category names present in the sales table.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.sales.iter().map(|r| r.category.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }
}
