use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use ladle_core::{ConfirmedInvoice, Disposition, ItemId, LineItem, Money};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use thiserror::Error;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    /// A stored row that can no longer be decoded. Surfaced rather than
    /// dropped, so a bad record never silently vanishes from the totals.
    #[error("Corrupt record in invoice {invoice_id}: {detail}")]
    Corrupt { invoice_id: i64, detail: String },
}

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS confirmed_invoices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor TEXT NOT NULL,
            invoice_date TEXT NOT NULL,
            total_cents INTEGER NOT NULL,
            confirmed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invoice_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            invoice_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            quantity TEXT NOT NULL,
            unit TEXT NOT NULL,
            unit_price_cents INTEGER NOT NULL,
            disposition TEXT NOT NULL,
            FOREIGN KEY (invoice_id) REFERENCES confirmed_invoices(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Append one confirmed invoice. The record and its items go in a single SQL
/// transaction, so a dashboard read sees either the whole invoice or none of
/// it. Returns the assigned invoice id.
pub async fn insert_confirmed_invoice(
    pool: &DbPool,
    invoice: &ConfirmedInvoice,
) -> Result<i64, StorageError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        "INSERT INTO confirmed_invoices (vendor, invoice_date, total_cents, confirmed_at) VALUES (?, ?, ?, ?) RETURNING id"
    )
    .bind(&invoice.vendor)
    .bind(invoice.invoice_date.to_string())
    .bind(invoice.confirmed_total.to_cents())
    .bind(invoice.confirmed_at.to_rfc3339())
    .fetch_one(&mut *tx)
    .await?;

    let id: i64 = row.get("id");

    for item in &invoice.items {
        sqlx::query(
            "INSERT INTO invoice_items (invoice_id, item_id, name, quantity, unit, unit_price_cents, disposition) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(id)
        .bind(item.id.0)
        .bind(&item.name)
        .bind(item.quantity.to_string())
        .bind(&item.unit)
        .bind(item.unit_price.to_cents())
        .bind(item.disposition.to_string())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(id)
}

/// Full snapshot of the collection for the aggregator. No ordering is
/// guaranteed; time-based views sort by `confirmed_at` themselves.
pub async fn get_all_confirmed_invoices(pool: &DbPool) -> Result<Vec<ConfirmedInvoice>, StorageError> {
    let invoice_rows = sqlx::query_as::<_, (i64, String, String, i64, String)>(
        "SELECT id, vendor, invoice_date, total_cents, confirmed_at FROM confirmed_invoices",
    )
    .fetch_all(pool)
    .await?;

    let item_rows = sqlx::query_as::<_, (i64, i64, String, String, String, i64, String)>(
        "SELECT invoice_id, item_id, name, quantity, unit, unit_price_cents, disposition FROM invoice_items ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let mut items_by_invoice: HashMap<i64, Vec<LineItem>> = HashMap::new();
    for (invoice_id, item_id, name, quantity, unit, unit_price_cents, disposition) in item_rows {
        let quantity = Decimal::from_str(&quantity).map_err(|e| StorageError::Corrupt {
            invoice_id,
            detail: format!("bad quantity '{quantity}': {e}"),
        })?;
        let disposition = Disposition::from_str(&disposition)
            .map_err(|e| StorageError::Corrupt { invoice_id, detail: e })?;

        items_by_invoice.entry(invoice_id).or_default().push(LineItem {
            id: ItemId(item_id),
            name,
            quantity,
            unit,
            unit_price: Money::from_cents(unit_price_cents),
            disposition,
        });
    }

    invoice_rows
        .into_iter()
        .map(|(id, vendor, invoice_date, total_cents, confirmed_at)| {
            let invoice_date = NaiveDate::parse_from_str(&invoice_date, "%Y-%m-%d").map_err(|e| {
                StorageError::Corrupt {
                    invoice_id: id,
                    detail: format!("bad invoice_date '{invoice_date}': {e}"),
                }
            })?;
            let confirmed_at = DateTime::parse_from_rfc3339(&confirmed_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StorageError::Corrupt {
                    invoice_id: id,
                    detail: format!("bad confirmed_at '{confirmed_at}': {e}"),
                })?;

            Ok(ConfirmedInvoice {
                id: Some(id),
                vendor,
                invoice_date,
                items: items_by_invoice.remove(&id).unwrap_or_default(),
                confirmed_total: Money::from_cents(total_cents),
                confirmed_at,
            })
        })
        .collect()
}
