use crate::dashboard::notice::{Notice, NoticeSlot};
use crate::dashboard::Refresher;
use crate::gateway::{self, SplitQrApi};
use crate::model::{Account, AccountStatus, Overview, QrFormat, QrImageParams, QrLink, Table};
use log::info;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_QR_SIZE: u32 = 300;

/// A table together with its open account, if it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub table: Table,
    pub account: Option<Account>,
}

/// QR generator view.
///
/// Keeps its own copy of the account list so that a freshly opened account shows up
/// before the next overview snapshot lands.
pub struct QrGenerator<G: SplitQrApi> {
    gateway: Arc<G>,
    pub search: String,
    accounts: Vec<Account>,
    last_link: Option<QrLink>,
    busy: bool,
    notices: NoticeSlot,
}

impl<G: SplitQrApi> QrGenerator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            search: String::new(),
            accounts: vec![],
            last_link: None,
            busy: false,
            notices: NoticeSlot::default(),
        }
    }

    /// Replace the local account list with the one from a new snapshot.
    pub fn sync(&mut self, overview: &Overview) {
        self.accounts = overview.accounts.clone();
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn last_link(&self) -> Option<&QrLink> {
        self.last_link.as_ref()
    }

    pub fn notice(&mut self) -> Option<&Notice> {
        self.notices.current()
    }

    pub fn rows(&self, overview: &Overview) -> Vec<TableRow> {
        let query = self.search.trim();
        overview
            .tables
            .iter()
            .filter(|t| query.is_empty() || t.number.to_string().contains(query))
            .map(|table| TableRow {
                table: table.clone(),
                account: self
                    .accounts
                    .iter()
                    .find(|a| a.table_id == table.id && a.status != AccountStatus::Paid)
                    .cloned(),
            })
            .collect()
    }

    pub async fn open_account<R: Refresher>(&mut self, table_id: u32, refresher: &R) -> Option<Account> {
        self.busy = true;
        let result = self.gateway.open_account(table_id).await;
        self.busy = false;
        match result {
            Ok(account) => {
                info!("opened account={} on table={}", account.id, table_id);
                self.accounts.push(account.clone());
                self.notices.show(Notice::success(format!(
                    "account opened for table {}, QR {}",
                    account.table_number, account.qr_id
                )));
                refresher.request_refresh().await;
                Some(account)
            }
            Err(e) => {
                self.notices.show(Notice::error(e.to_string()));
                None
            }
        }
    }

    pub async fn regenerate<R: Refresher>(&mut self, account_id: u64, refresher: &R) -> Option<Account> {
        self.busy = true;
        let result = self.gateway.regenerate_qr(account_id).await;
        self.busy = false;
        match result {
            Ok(account) => {
                info!("regenerated QR of account={}", account_id);
                self.last_link = None;
                self.notices
                    .show(Notice::success(format!("new QR {}", account.qr_id)));
                refresher.request_refresh().await;
                Some(account)
            }
            Err(e) => {
                self.notices.show(Notice::error(e.to_string()));
                None
            }
        }
    }

    pub async fn show_link(&mut self, account_id: u64) -> Option<QrLink> {
        match self.gateway.qr_url(account_id).await {
            Ok(link) => {
                self.last_link = Some(link.clone());
                Some(link)
            }
            Err(e) => {
                self.notices.show(Notice::error(e.to_string()));
                None
            }
        }
    }

    pub async fn download(
        &mut self,
        account_id: u64,
        format: QrFormat,
        size: u32,
        dir: &Path,
    ) -> Option<PathBuf> {
        self.busy = true;
        let params = QrImageParams { format, size };
        let result = gateway::download_qr(self.gateway.as_ref(), account_id, params, dir).await;
        self.busy = false;
        match result {
            Ok(path) => {
                self.notices
                    .show(Notice::success(format!("saved {}", path.display())));
                Some(path)
            }
            Err(e) => {
                self.notices.show(Notice::error(e.to_string()));
                None
            }
        }
    }

    pub fn render(&mut self, overview: &Overview) -> String {
        let mut out = String::new();
        for row in self.rows(overview) {
            let account = match &row.account {
                Some(a) => format!("account {} qr {}", a.id, a.qr_id),
                None => "no open account".to_string(),
            };
            let _ = writeln!(
                out,
                "table {:>3} seats {:>2} {:<9} {}",
                row.table.number,
                row.table.capacity,
                format!("{:?}", row.table.status).to_lowercase(),
                account
            );
        }
        if let Some(link) = &self.last_link {
            let _ = writeln!(out, "link {} -> {}", link.qr_id, link.url);
        }
        if self.busy {
            let _ = writeln!(out, "working...");
        }
        if let Some(notice) = self.notices.current() {
            let _ = writeln!(out, "{notice}");
        }
        out
    }
}
