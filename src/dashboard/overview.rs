use crate::model::{AccountStatus, Overview, PaymentStatus, TableStatus};
use rust_decimal::Decimal;
use std::fmt::Write;

/// Headline numbers of the overview view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverviewStats {
    pub tables: usize,
    pub occupied_tables: usize,
    pub open_accounts: usize,
    pub billed: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub completed_payments: usize,
    pub pending_payments: usize,
    pub failed_payments: usize,
    pub revenue: Decimal,
}

impl From<&Overview> for OverviewStats {
    fn from(overview: &Overview) -> Self {
        let mut stats = OverviewStats {
            tables: overview.tables.len(),
            occupied_tables: overview
                .tables
                .iter()
                .filter(|t| t.status == TableStatus::Occupied)
                .count(),
            ..Default::default()
        };
        for account in &overview.accounts {
            if account.status != AccountStatus::Paid {
                stats.open_accounts += 1;
            }
            stats.billed += account.total;
            stats.paid += account.paid;
            stats.pending += account.outstanding();
        }
        for payment in &overview.payments {
            match payment.status {
                PaymentStatus::Completed => {
                    stats.completed_payments += 1;
                    stats.revenue += payment.amount;
                }
                PaymentStatus::Pending => stats.pending_payments += 1,
                PaymentStatus::Failed => stats.failed_payments += 1,
            }
        }
        stats
    }
}

impl OverviewStats {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "tables        {} ({} occupied)", self.tables, self.occupied_tables);
        let _ = writeln!(out, "open accounts {}", self.open_accounts);
        let _ = writeln!(
            out,
            "billed {:.2} | paid {:.2} | pending {:.2}",
            self.billed, self.paid, self.pending
        );
        let _ = writeln!(
            out,
            "payments      {} completed, {} pending, {} failed | revenue {:.2}",
            self.completed_payments, self.pending_payments, self.failed_payments, self.revenue
        );
        out
    }
}
