pub mod analytics;
pub mod invoice;
pub mod item;
pub mod money;
pub mod window;

pub use analytics::{
    daily_spend, recent_invoices, summary_stats, top_vendors, DailyBucket, SummaryStats,
    VendorSpend,
};
pub use invoice::{ConfirmedInvoice, InvoiceDraft};
pub use item::{DataError, Disposition, ItemId, LineItem};
pub use money::Money;
pub use window::{ConfigError, DateRange, Window};
