use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The final fate of a line item, as decided during confirmation.
///
/// A Credited item subtracts its subtotal from the amount owed; a Returned
/// item is assumed netted out by the vendor and contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Normal,
    Credited,
    Returned,
}

impl Default for Disposition {
    fn default() -> Self {
        Disposition::Normal
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Normal => write!(f, "normal"),
            Disposition::Credited => write!(f, "credited"),
            Disposition::Returned => write!(f, "returned"),
        }
    }
}

impl std::str::FromStr for Disposition {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Disposition::Normal),
            "credited" => Ok(Disposition::Credited),
            "returned" => Ok(Disposition::Returned),
            other => Err(format!("Unknown disposition: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("Item {0} has a negative quantity")]
    NegativeQuantity(ItemId),
    #[error("Item {0} has a negative unit price")]
    NegativePrice(ItemId),
    #[error("Item {0} has a quantity beyond the supported maximum")]
    QuantityOutOfRange(ItemId),
    #[error("Item {0} has a unit price beyond the supported maximum")]
    PriceOutOfRange(ItemId),
    #[error("No item with id {0} in the draft")]
    UnknownItem(ItemId),
}

/// Upper bounds on plausible invoice figures. Anything beyond these is
/// capture garbage, and keeping line totals under these caps keeps cents
/// arithmetic safely inside i64.
pub const MAX_QUANTITY: i64 = 1_000_000;
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000; // $1,000,000 per unit

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: Decimal,
    /// Unit of measure ("kg", "bottles", ...) — a display label, never interpreted.
    pub unit: String,
    pub unit_price: Money,
    pub disposition: Disposition,
}

impl LineItem {
    pub fn new(
        id: ItemId,
        name: &str,
        quantity: Decimal,
        unit: &str,
        unit_price: Money,
    ) -> Result<Self, DataError> {
        if quantity.is_sign_negative() && !quantity.is_zero() {
            return Err(DataError::NegativeQuantity(id));
        }
        if quantity > Decimal::from(MAX_QUANTITY) {
            return Err(DataError::QuantityOutOfRange(id));
        }
        if unit_price.is_negative() {
            return Err(DataError::NegativePrice(id));
        }
        if unit_price > Money::from_cents(MAX_UNIT_PRICE_CENTS) {
            return Err(DataError::PriceOutOfRange(id));
        }
        Ok(LineItem {
            id,
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            unit_price,
            disposition: Disposition::Normal,
        })
    }

    /// Face-value subtotal, shown to the operator regardless of disposition.
    pub fn line_total(&self) -> Money {
        Money::from_decimal(self.quantity * self.unit_price.to_decimal())
    }

    /// The item's contribution to the net amount owed.
    pub fn signed_total(&self) -> Money {
        match self.disposition {
            Disposition::Normal => self.line_total(),
            Disposition::Credited => -self.line_total(),
            Disposition::Returned => Money::zero(),
        }
    }

    /// Adjust quantity by `delta`, clamped so it never goes below zero.
    /// Returns the new quantity.
    pub fn adjust_quantity(&mut self, delta: Decimal) -> Decimal {
        self.quantity = (self.quantity + delta).max(Decimal::ZERO);
        self.quantity
    }
}
