//! Records exchanged with the SplitQR backend.
//!
//! The dashboard does not own their lifecycle; they arrive verbatim from the backend
//! and are only displayed or mutated through gateway calls.

use serde::{Deserialize, Serialize};

pub mod account;
pub mod config;
pub mod item;
pub mod payment;
pub mod table;

pub use account::{Account, AccountDetail, AccountStatus, QrLink, QrLookup};
pub use item::{LineItem, NewItem};
pub use payment::{Payment, PaymentMethod, PaymentStatus, SplitType};
pub use table::{Table, TableStatus};

/// Snapshot returned by the overview endpoint and polled by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Overview {
    /// open account bound to the given table, if any
    pub fn account_for_table(&self, table_id: u32) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.table_id == table_id && a.status != AccountStatus::Paid)
    }
}

/// Image formats the QR rendering endpoint produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    Png,
    Svg,
}

impl QrFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            QrFormat::Png => "png",
            QrFormat::Svg => "svg",
        }
    }
}

impl std::fmt::Display for QrFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for QrFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            s => Err(format!("Invalid QR format: {s}")),
        }
    }
}

/// Query string of the QR image endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QrImageParams {
    pub format: QrFormat,
    pub size: u32,
}
