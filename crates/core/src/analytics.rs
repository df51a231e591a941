//! Dashboard aggregation over a snapshot of the confirmed invoice
//! collection. Pure functions: the caller supplies the snapshot and "today",
//! so every output is exactly reproducible.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::invoice::ConfirmedInvoice;
use super::money::Money;
use super::window::Window;

/// One calendar day's accumulated spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSpend {
    pub vendor: String,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_amount: Money,
    pub invoice_count: u64,
    pub average_invoice: Money,
}

/// Spend per calendar day over the trailing window, ascending by date.
///
/// Always returns exactly N points for an N-day window: every day is seeded
/// to zero before any invoice is folded in, so empty days (and an empty
/// collection) still chart as zero bars. An invoice lands in at most one
/// bucket, keyed by the calendar date of its confirmation.
pub fn daily_spend(
    invoices: &[ConfirmedInvoice],
    window: Window,
    today: NaiveDate,
) -> Vec<DailyBucket> {
    let range = window.range(today);

    let mut buckets: BTreeMap<NaiveDate, Money> =
        range.iter_days().map(|d| (d, Money::zero())).collect();

    for invoice in invoices {
        let day = invoice.confirmed_at.date_naive();
        if let Some(amount) = buckets.get_mut(&day) {
            *amount = *amount + invoice.confirmed_total;
        }
    }

    buckets
        .into_iter()
        .map(|(date, amount)| DailyBucket { date, amount })
        .collect()
}

/// Total spend per vendor over the whole supplied collection, descending.
///
/// Vendor names are matched exactly (no case or whitespace normalization).
/// Ties keep first-encountered input order; the result is truncated to
/// `limit`.
pub fn top_vendors(invoices: &[ConfirmedInvoice], limit: usize) -> Vec<VendorSpend> {
    let mut totals: Vec<VendorSpend> = Vec::new();

    for invoice in invoices {
        match totals.iter_mut().find(|v| v.vendor == invoice.vendor) {
            Some(entry) => entry.total = entry.total + invoice.confirmed_total,
            None => totals.push(VendorSpend {
                vendor: invoice.vendor.clone(),
                total: invoice.confirmed_total,
            }),
        }
    }

    // sort_by is stable, so equal totals stay in first-encountered order.
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals.truncate(limit);
    totals
}

/// Totals, count and average over the same inclusive window as `daily_spend`.
/// An empty window yields all zeros, never a division by zero.
pub fn summary_stats(
    invoices: &[ConfirmedInvoice],
    window: Window,
    today: NaiveDate,
) -> SummaryStats {
    let range = window.range(today);

    let mut total_amount = Money::zero();
    let mut invoice_count: u64 = 0;
    for invoice in invoices {
        if range.contains(invoice.confirmed_at.date_naive()) {
            total_amount = total_amount + invoice.confirmed_total;
            invoice_count += 1;
        }
    }

    let average_invoice = if invoice_count > 0 {
        Money::from_decimal(total_amount.to_decimal() / rust_decimal::Decimal::from(invoice_count))
    } else {
        Money::zero()
    };

    SummaryStats {
        total_amount,
        invoice_count,
        average_invoice,
    }
}

/// The most recently confirmed invoices, newest first. The collection is not
/// stored in confirmation order, so this sorts explicitly by `confirmed_at`.
pub fn recent_invoices(invoices: &[ConfirmedInvoice], limit: usize) -> Vec<ConfirmedInvoice> {
    let mut sorted: Vec<ConfirmedInvoice> = invoices.to_vec();
    sorted.sort_by(|a, b| b.confirmed_at.cmp(&a.confirmed_at));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Days, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: NaiveDate) -> DateTime<Utc> {
        day.and_hms_opt(14, 30, 0).unwrap().and_utc()
    }

    fn invoice(vendor: &str, total_cents: i64, confirmed: NaiveDate) -> ConfirmedInvoice {
        ConfirmedInvoice {
            id: None,
            vendor: vendor.to_string(),
            invoice_date: confirmed,
            items: vec![],
            confirmed_total: Money::from_cents(total_cents),
            confirmed_at: at(confirmed),
        }
    }

    const TODAY: (i32, u32, u32) = (2024, 6, 10);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn daily_spend_has_exactly_n_zero_buckets_when_empty() {
        for (window, n) in [
            (Window::SevenDays, 7),
            (Window::ThirtyDays, 30),
            (Window::NinetyDays, 90),
        ] {
            let series = daily_spend(&[], window, today());
            assert_eq!(series.len(), n);
            assert!(series.iter().all(|b| b.amount.is_zero()));
            assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        }
    }

    #[test]
    fn daily_spend_places_invoices_in_their_day() {
        let invoices = vec![
            invoice("Acme", 1000, today()),
            invoice("Acme", 500, today() - Days::new(1)),
        ];
        let series = daily_spend(&invoices, Window::SevenDays, today());

        assert_eq!(series.len(), 7);
        assert_eq!(series[6].amount.to_cents(), 1000);
        assert_eq!(series[5].amount.to_cents(), 500);
        assert!(series[..5].iter().all(|b| b.amount.is_zero()));
    }

    #[test]
    fn daily_spend_sums_same_day_invoices_into_one_bucket() {
        let invoices = vec![
            invoice("Acme", 1000, today()),
            invoice("Barn", 250, today()),
        ];
        let series = daily_spend(&invoices, Window::SevenDays, today());
        assert_eq!(series[6].amount.to_cents(), 1250);
    }

    #[test]
    fn daily_spend_ignores_out_of_window_invoices() {
        let invoices = vec![
            invoice("Acme", 1000, today() - Days::new(7)), // one day too old for 7d
            invoice("Acme", 500, today() + Days::new(1)),  // future
        ];
        let series = daily_spend(&invoices, Window::SevenDays, today());
        assert!(series.iter().all(|b| b.amount.is_zero()));
    }

    #[test]
    fn daily_spend_conserves_in_window_total() {
        let invoices = vec![
            invoice("Acme", 1000, today()),
            invoice("Barn", 500, today() - Days::new(3)),
            invoice("Cask", 750, today() - Days::new(6)),
            invoice("Dray", 9999, today() - Days::new(10)), // outside 7d
        ];
        let series = daily_spend(&invoices, Window::SevenDays, today());
        let bucket_sum: i64 = series.iter().map(|b| b.amount.to_cents()).sum();
        assert_eq!(bucket_sum, 1000 + 500 + 750);
    }

    #[test]
    fn window_boundary_days_are_inclusive() {
        let invoices = vec![
            invoice("Acme", 100, today() - Days::new(6)), // oldest in-window day
            invoice("Acme", 200, today()),
        ];
        let series = daily_spend(&invoices, Window::SevenDays, today());
        assert_eq!(series[0].amount.to_cents(), 100);
        assert_eq!(series[6].amount.to_cents(), 200);
    }

    #[test]
    fn top_vendors_ranks_descending_and_truncates() {
        let invoices = vec![
            invoice("Greens", 500, today()),
            invoice("Dairy", 2000, today()),
            invoice("Greens", 700, today()),
            invoice("Fish", 300, today()),
        ];
        let top = top_vendors(&invoices, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].vendor, "Dairy");
        assert_eq!(top[0].total.to_cents(), 2000);
        assert_eq!(top[1].vendor, "Greens");
        assert_eq!(top[1].total.to_cents(), 1200);
    }

    #[test]
    fn top_vendors_ties_keep_first_encountered_order() {
        // B encountered first, A reaches the same total across two invoices.
        let invoices = vec![
            invoice("B", 3000, today()),
            invoice("A", 2000, today()),
            invoice("A", 1000, today()),
        ];
        let top = top_vendors(&invoices, 5);
        assert_eq!(top[0].vendor, "B");
        assert_eq!(top[1].vendor, "A");
    }

    #[test]
    fn top_vendors_matches_names_exactly() {
        let invoices = vec![
            invoice("Acme", 100, today()),
            invoice("acme", 100, today()),
            invoice("Acme ", 100, today()),
        ];
        assert_eq!(top_vendors(&invoices, 5).len(), 3);
    }

    #[test]
    fn top_vendors_empty_collection() {
        assert!(top_vendors(&[], 5).is_empty());
    }

    #[test]
    fn summary_stats_zero_invoice_safety() {
        let stats = summary_stats(&[], Window::ThirtyDays, today());
        assert!(stats.total_amount.is_zero());
        assert_eq!(stats.invoice_count, 0);
        assert!(stats.average_invoice.is_zero());
    }

    #[test]
    fn summary_stats_example_scenario() {
        // Two Acme invoices, $10 today and $5 yesterday, 7d window.
        let invoices = vec![
            invoice("Acme", 1000, today()),
            invoice("Acme", 500, today() - Days::new(1)),
        ];
        let stats = summary_stats(&invoices, Window::SevenDays, today());
        assert_eq!(stats.total_amount.to_cents(), 1500);
        assert_eq!(stats.invoice_count, 2);
        assert_eq!(stats.average_invoice.to_cents(), 750);
    }

    #[test]
    fn summary_stats_scopes_to_window() {
        let invoices = vec![
            invoice("Acme", 1000, today()),
            invoice("Acme", 9999, today() - Days::new(45)), // in 90d, out of 30d
        ];
        let stats30 = summary_stats(&invoices, Window::ThirtyDays, today());
        assert_eq!(stats30.total_amount.to_cents(), 1000);
        assert_eq!(stats30.invoice_count, 1);

        let stats90 = summary_stats(&invoices, Window::NinetyDays, today());
        assert_eq!(stats90.total_amount.to_cents(), 10999);
        assert_eq!(stats90.invoice_count, 2);
    }

    #[test]
    fn summary_average_rounds_to_cents() {
        let invoices = vec![
            invoice("Acme", 100, today()),
            invoice("Acme", 100, today()),
            invoice("Acme", 101, today()),
        ];
        let stats = summary_stats(&invoices, Window::SevenDays, today());
        // 301 / 3 = 100.333... rounds to 100 cents
        assert_eq!(stats.average_invoice.to_cents(), 100);
    }

    #[test]
    fn recent_invoices_sorts_newest_first() {
        let invoices = vec![
            invoice("Old", 100, today() - Days::new(5)),
            invoice("New", 200, today()),
            invoice("Mid", 300, today() - Days::new(2)),
        ];
        let recent = recent_invoices(&invoices, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].vendor, "New");
        assert_eq!(recent[1].vendor, "Mid");
    }
}
