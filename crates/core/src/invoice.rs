use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::{DataError, Disposition, ItemId, LineItem};
use super::money::Money;

/// The single in-flight invoice being reviewed by the operator.
///
/// Created from a parsed capture result, mutated in place during
/// confirmation, then consumed by `confirm`. There is never more than one
/// draft alive at a time; the workflow owns it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub vendor: String,
    pub invoice_date: NaiveDate,
    pub items: Vec<LineItem>,
}

impl InvoiceDraft {
    pub fn new(
        vendor: &str,
        invoice_date: NaiveDate,
        items: Vec<LineItem>,
    ) -> Self {
        InvoiceDraft {
            vendor: vendor.to_string(),
            invoice_date,
            items,
        }
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut LineItem, DataError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(DataError::UnknownItem(id))
    }

    /// Adjust one item's quantity by `delta` (clamped at zero).
    /// Returns the item's new quantity.
    pub fn update_quantity(&mut self, id: ItemId, delta: Decimal) -> Result<Decimal, DataError> {
        Ok(self.item_mut(id)?.adjust_quantity(delta))
    }

    pub fn set_disposition(&mut self, id: ItemId, disposition: Disposition) -> Result<(), DataError> {
        self.item_mut(id)?.disposition = disposition;
        Ok(())
    }

    /// Net amount owed under the disposition rules: Normal adds, Credited
    /// subtracts, Returned contributes nothing. A pure sum, so item order
    /// never changes the result. An empty draft totals zero.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .map(LineItem::signed_total)
            .fold(Money::zero(), |a, b| a + b)
    }

    /// One-way transition into an immutable confirmed record; the total is
    /// computed once here and frozen.
    pub fn confirm(self, confirmed_at: DateTime<Utc>) -> ConfirmedInvoice {
        let confirmed_total = self.total();
        ConfirmedInvoice {
            id: None,
            vendor: self.vendor,
            invoice_date: self.invoice_date,
            items: self.items,
            confirmed_total,
            confirmed_at,
        }
    }
}

/// A finalized invoice as it lives in the durable collection.
/// Immutable after creation; `id` is assigned by storage on append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedInvoice {
    pub id: Option<i64>,
    pub vendor: String,
    pub invoice_date: NaiveDate,
    pub items: Vec<LineItem>,
    pub confirmed_total: Money,
    pub confirmed_at: DateTime<Utc>,
}
