//! In-memory gateway used by the dashboard tests.

use crate::gateway::{ApiResult, GatewayError, SplitQrApi};
use crate::model::{
    Account, AccountDetail, AccountStatus, LineItem, NewItem, Overview, QrImageParams, QrLink,
    QrLookup,
};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub(crate) struct MockGateway {
    /// queued overview results, the default overview is served once drained
    pub overviews: Mutex<VecDeque<Result<Overview, String>>>,
    pub overview_delay: Duration,
    pub accounts: Mutex<Vec<Account>>,
    pub items: Mutex<HashMap<u64, Vec<LineItem>>>,
    /// per table delay applied to `fetch_account`
    pub detail_delays: Mutex<HashMap<u32, Duration>>,
    pub overview_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub call_log: Mutex<Vec<String>>,
}

pub(crate) fn account(id: u64, table_id: u32, total: i64, paid: i64) -> Account {
    let (total, paid) = (Decimal::new(total, 2), Decimal::new(paid, 2));
    Account {
        id,
        table_id,
        table_number: table_id,
        qr_id: format!("qr-{id}"),
        total,
        paid,
        pending: total - paid,
        item_count: 0,
        status: if paid.is_zero() {
            AccountStatus::Open
        } else if paid < total {
            AccountStatus::Partial
        } else {
            AccountStatus::Paid
        },
        opened_at: None,
    }
}

fn not_found(what: String) -> GatewayError {
    GatewayError::Http {
        status: StatusCode::NOT_FOUND,
        message: what,
    }
}

impl MockGateway {
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            ..Default::default()
        }
    }

    pub fn push_overview(&self, result: Result<Overview, String>) {
        self.overviews.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.call_log.lock().unwrap().push(call);
    }

    fn find(&self, predicate: impl Fn(&Account) -> bool) -> Option<Account> {
        self.accounts.lock().unwrap().iter().find(|a| predicate(a)).cloned()
    }

    fn detail(&self, account: Account) -> AccountDetail {
        let items = self
            .items
            .lock()
            .unwrap()
            .get(&account.id)
            .cloned()
            .unwrap_or_default();
        AccountDetail { account, items }
    }
}

impl SplitQrApi for MockGateway {
    async fn fetch_overview(&self) -> ApiResult<Overview> {
        self.overview_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.overview_delay.is_zero() {
            tokio::time::sleep(self.overview_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.overviews.lock().unwrap().pop_front();
        match next {
            Some(Ok(overview)) => Ok(overview),
            Some(Err(message)) => Err(GatewayError::Http {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message,
            }),
            None => Ok(Overview {
                accounts: self.accounts.lock().unwrap().clone(),
                ..Default::default()
            }),
        }
    }

    async fn open_account(&self, table_id: u32) -> ApiResult<Account> {
        self.record(format!("open_account {table_id}"));
        if self.find(|a| a.table_id == table_id && a.status != AccountStatus::Paid).is_some() {
            return Err(GatewayError::Http {
                status: StatusCode::BAD_REQUEST,
                message: format!("table {table_id} already has an open account"),
            });
        }
        let mut accounts = self.accounts.lock().unwrap();
        let created = account(accounts.len() as u64 + 100, table_id, 0, 0);
        accounts.push(created.clone());
        Ok(created)
    }

    async fn fetch_account(&self, table_id: u32) -> ApiResult<AccountDetail> {
        self.record(format!("fetch_account {table_id}"));
        let delay = self.detail_delays.lock().unwrap().get(&table_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.find(|a| a.table_id == table_id && a.status != AccountStatus::Paid)
            .map(|a| self.detail(a))
            .ok_or_else(|| not_found(format!("no account for table {table_id}")))
    }

    async fn add_item(&self, account_id: u64, item: &NewItem) -> ApiResult<AccountDetail> {
        self.record(format!("add_item {account_id} {}", item.name));
        let account = {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .iter_mut()
                .find(|a| a.id == account_id)
                .ok_or_else(|| not_found(format!("account {account_id}")))?;
            account.total += item.unit_price * Decimal::from(item.quantity);
            account.pending = account.total - account.paid;
            account.item_count += 1;
            account.clone()
        };
        let mut items = self.items.lock().unwrap();
        let list = items.entry(account_id).or_default();
        list.push(LineItem {
            id: list.len() as u64 + 1,
            name: item.name.clone(),
            category: item.category.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
        });
        drop(items);
        Ok(self.detail(account))
    }

    async fn regenerate_qr(&self, account_id: u64) -> ApiResult<Account> {
        self.record(format!("regenerate_qr {account_id}"));
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| not_found(format!("account {account_id}")))?;
        account.qr_id = format!("{}-r", account.qr_id);
        Ok(account.clone())
    }

    async fn qr_url(&self, account_id: u64) -> ApiResult<QrLink> {
        self.record(format!("qr_url {account_id}"));
        let account = self
            .find(|a| a.id == account_id)
            .ok_or_else(|| not_found(format!("account {account_id}")))?;
        Ok(QrLink {
            url: format!("https://pay.example/{}", account.qr_id),
            qr_id: account.qr_id,
        })
    }

    async fn qr_image(&self, account_id: u64, params: QrImageParams) -> ApiResult<Vec<u8>> {
        self.record(format!("qr_image {account_id} {}", params.format));
        Ok(b"<svg/>".to_vec())
    }

    async fn close_account(&self, account_id: u64) -> ApiResult<Account> {
        self.record(format!("close_account {account_id}"));
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| not_found(format!("account {account_id}")))?;
        account.status = AccountStatus::Paid;
        Ok(account.clone())
    }

    async fn lookup_qr(&self, qr_id: &str) -> ApiResult<QrLookup> {
        self.record(format!("lookup_qr {qr_id}"));
        self.find(|a| a.qr_id == qr_id)
            .map(|account| QrLookup {
                table_number: account.table_number,
                account,
            })
            .ok_or_else(|| not_found(format!("unknown QR id {qr_id}")))
    }
}
