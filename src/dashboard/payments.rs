use crate::model::{Payment, PaymentStatus, SplitType};
use crate::util::time;
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeWindow {
    #[default]
    All,
    /// since midnight UTC
    Today,
    Week,
    Month,
}

impl TimeWindow {
    /// earliest timestamp inside the window
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            TimeWindow::Week => Some(now - TimeDelta::days(7)),
            TimeWindow::Month => Some(now - TimeDelta::days(30)),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            s => Err(format!("Invalid time window: {s}")),
        }
    }
}

/// Case-insensitive substring match over customer name, table number and transaction id.
pub fn matches_search(payment: &Payment, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    payment.customer_name.to_lowercase().contains(&query)
        || payment.table_number.to_string().contains(&query)
        || payment.transaction_id.to_lowercase().contains(&query)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilter {
    pub window: TimeWindow,
    /// `None` shows every status
    pub status: Option<PaymentStatus>,
    pub search: String,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment, now: DateTime<Utc>) -> bool {
        self.window
            .since(now)
            .map_or(true, |since| payment.timestamp >= since)
            && self.status.map_or(true, |status| payment.status == status)
            && matches_search(payment, &self.search)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentSummary {
    pub count: usize,
    pub completed: Decimal,
    pub pending: Decimal,
    pub failed: usize,
    pub item_splits: usize,
}

/// Payment monitor view: filters, search and the detail modal.
#[derive(Debug, Default)]
pub struct PaymentMonitor {
    pub filter: PaymentFilter,
    selected: Option<u64>,
}

impl PaymentMonitor {
    pub fn new(filter: PaymentFilter) -> Self {
        Self {
            filter,
            selected: None,
        }
    }

    /// Payments passing the current filter, newest first.
    pub fn visible<'a>(&self, payments: &'a [Payment]) -> Vec<&'a Payment> {
        let now = time::helper::get_utc_now();
        let mut visible = payments
            .iter()
            .filter(|p| self.filter.matches(p, now))
            .collect::<Vec<_>>();
        visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        visible
    }

    pub fn summary(visible: &[&Payment]) -> PaymentSummary {
        visible.iter().fold(
            PaymentSummary {
                count: visible.len(),
                ..Default::default()
            },
            |mut summary, p| {
                match p.status {
                    PaymentStatus::Completed => summary.completed += p.amount,
                    PaymentStatus::Pending => summary.pending += p.amount,
                    PaymentStatus::Failed => summary.failed += 1,
                }
                if p.split_type == SplitType::Items {
                    summary.item_splits += 1;
                }
                summary
            },
        )
    }

    pub fn open_details(&mut self, payment_id: u64) {
        self.selected = Some(payment_id);
    }

    pub fn close_details(&mut self) {
        self.selected = None;
    }

    pub fn selected<'a>(&self, payments: &'a [Payment]) -> Option<&'a Payment> {
        self.selected
            .and_then(|id| payments.iter().find(|p| p.id == id))
    }

    pub fn render(&self, payments: &[Payment]) -> String {
        let visible = self.visible(payments);
        let summary = Self::summary(&visible);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} payments | completed {:.2} | pending {:.2} | failed {}",
            summary.count, summary.completed, summary.pending, summary.failed
        );
        for p in &visible {
            let _ = writeln!(
                out,
                "{} table {:>3} {:<20} {:>10.2} {:?}/{:?} {:?} {}",
                p.timestamp.format("%Y-%m-%d %H:%M"),
                p.table_number,
                p.customer_name,
                p.amount,
                p.method,
                p.split_type,
                p.status,
                p.transaction_id
            );
        }
        if let Some(p) = self.selected(payments) {
            let _ = writeln!(out, "--- payment {} ---", p.id);
            let _ = writeln!(
                out,
                "customer {} {}",
                p.customer_name,
                p.customer_phone.as_deref().unwrap_or("-")
            );
            let _ = writeln!(out, "qr {}", p.qr_id);
            for item in &p.items {
                let _ = writeln!(out, "  * {item}");
            }
        }
        out
    }
}
