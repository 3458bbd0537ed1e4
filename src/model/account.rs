use crate::model::item::LineItem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Open,
    Partial,
    #[serde(alias = "closed")]
    Paid,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AccountStatus::Open => "open",
            AccountStatus::Partial => "partial",
            AccountStatus::Paid => "paid",
        })
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "partial" => Ok(Self::Partial),
            "paid" | "closed" => Ok(Self::Paid),
            s => Err(format!("Invalid account status: {s}")),
        }
    }
}

/// A bill opened against one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub table_id: u32,
    pub table_number: u32,
    pub qr_id: String,
    pub total: Decimal,
    pub paid: Decimal,
    /// as reported by the backend; display code uses [`Account::outstanding`]
    pub pending: Decimal,
    pub item_count: u32,
    pub status: AccountStatus,
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Amount still owed, always `total - paid`.
    pub fn outstanding(&self) -> Decimal {
        self.total - self.paid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub account: Account,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrLink {
    pub qr_id: String,
    pub url: String,
}

/// Result of resolving a QR identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrLookup {
    pub account: Account,
    pub table_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_status_decodes_as_paid() {
        let status: AccountStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(status, AccountStatus::Paid);
        assert_eq!("closed".parse::<AccountStatus>(), Ok(AccountStatus::Paid));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"paid\"");
    }
}
