use crate::model::{
    Account, AccountDetail, AccountStatus, LineItem, NewItem, Overview, Payment, PaymentMethod,
    PaymentStatus, QrLookup, SplitType, Table, TableStatus,
};
use crate::sandbox::controller::error::SandboxError;
use chrono::{DateTime, TimeDelta, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

const QR_ID_LEN: usize = 10;

/// Guest payment posted against a QR id.
#[derive(Debug, Clone, Deserialize)]
pub struct GuestPayment {
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub split_type: SplitType,
    #[serde(default)]
    pub items: Vec<String>,
}

/// In-memory backend state. Enforces what the real backend guarantees: pending is
/// always `total - paid`, QR ids are unique among active accounts and a table has at
/// most one open account.
#[derive(Debug, Default)]
pub struct Store {
    tables: Vec<Table>,
    accounts: Vec<Account>,
    items: HashMap<u64, Vec<LineItem>>,
    payments: Vec<Payment>,
    next_account_id: u64,
    next_item_id: u64,
    next_payment_id: u64,
}

fn is_active(account: &Account) -> bool {
    account.status != AccountStatus::Paid
}

impl Store {
    pub fn new(table_count: u32) -> Self {
        const CAPACITIES: [u16; 4] = [2, 4, 4, 6];
        let tables = (1..=table_count)
            .map(|n| Table {
                id: n,
                number: n,
                capacity: CAPACITIES[(n as usize - 1) % CAPACITIES.len()],
                status: TableStatus::Available,
                has_open_account: false,
            })
            .collect();
        Self {
            tables,
            next_account_id: 1,
            next_item_id: 1,
            next_payment_id: 1,
            ..Default::default()
        }
    }

    /// Store with a few tables in service and some payment history.
    pub fn seeded(table_count: u32, now: DateTime<Utc>) -> Self {
        let mut store = Self::new(table_count);
        let menu = [
            ("Picanha", "mains", Decimal::new(8990, 2), 2),
            ("Caipirinha", "drinks", Decimal::new(2400, 2), 3),
            ("Pao de queijo", "starters", Decimal::new(1850, 2), 1),
        ];
        let seed = |store: &mut Store, table_id: u32, dishes: usize| -> Result<u64, SandboxError> {
            let account = store.open_account(table_id, now - TimeDelta::minutes(45))?;
            for (name, category, unit_price, quantity) in menu.iter().take(dishes) {
                store.add_item(
                    account.id,
                    &NewItem {
                        name: name.to_string(),
                        category: category.to_string(),
                        unit_price: *unit_price,
                        quantity: *quantity,
                    },
                )?;
            }
            Ok(account.id)
        };

        if table_count >= 4 {
            let seeded = seed(&mut store, 1, 3)
                .and_then(|_| seed(&mut store, 2, 2))
                .and_then(|closed| {
                    let qr_id = store.account(closed)?.qr_id.clone();
                    store.record_payment(&qr_id, GuestPayment {
                        customer_name: "Marina Costa".to_string(),
                        customer_phone: Some("+55 11 98888-1234".to_string()),
                        amount: Decimal::new(25180, 2),
                        method: PaymentMethod::Pix,
                        split_type: SplitType::Even,
                        items: vec![],
                    }, now - TimeDelta::minutes(20))?;
                    store.close_account(closed)
                })
                .and_then(|_| seed(&mut store, 4, 1))
                .and_then(|partial| {
                    let qr_id = store.account(partial)?.qr_id.clone();
                    store.record_payment(&qr_id, GuestPayment {
                        customer_name: "Joao Pereira".to_string(),
                        customer_phone: None,
                        amount: Decimal::new(8990, 2),
                        method: PaymentMethod::Card,
                        split_type: SplitType::Items,
                        items: vec!["1x Picanha".to_string()],
                    }, now - TimeDelta::minutes(5))
                });
            if let Err(e) = seeded {
                log::warn!("failed to seed sandbox store, {}", e);
            }
            if let Some(table) = store.tables.get_mut(2) {
                table.status = TableStatus::Reserved;
            }
        }
        store
    }

    pub fn overview(&self) -> Overview {
        Overview {
            tables: self.tables.clone(),
            accounts: self.accounts.clone(),
            payments: self.payments.clone(),
        }
    }

    fn table_mut(&mut self, table_id: u32) -> Result<&mut Table, SandboxError> {
        self.tables
            .iter_mut()
            .find(|t| t.id == table_id)
            .ok_or_else(|| SandboxError::not_found(format!("table {table_id} does not exist")))
    }

    pub fn account(&self, account_id: u64) -> Result<&Account, SandboxError> {
        self.accounts
            .iter()
            .find(|a| a.id == account_id)
            .ok_or_else(|| SandboxError::not_found(format!("account {account_id} does not exist")))
    }

    fn account_mut(&mut self, account_id: u64) -> Result<&mut Account, SandboxError> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| SandboxError::not_found(format!("account {account_id} does not exist")))
    }

    fn active_account_mut(&mut self, account_id: u64) -> Result<&mut Account, SandboxError> {
        let account = self.account_mut(account_id)?;
        if !is_active(account) {
            return Err(SandboxError::conflict(format!("account {account_id} is already closed")));
        }
        Ok(account)
    }

    fn detail(&self, account: &Account) -> AccountDetail {
        AccountDetail {
            account: account.clone(),
            items: self.items.get(&account.id).cloned().unwrap_or_default(),
        }
    }

    fn fresh_qr_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let candidate: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(QR_ID_LEN)
                .map(char::from)
                .collect();
            if !self
                .accounts
                .iter()
                .any(|a| is_active(a) && a.qr_id == candidate)
            {
                return candidate;
            }
        }
    }

    pub fn open_account(&mut self, table_id: u32, now: DateTime<Utc>) -> Result<Account, SandboxError> {
        let table = self.table_mut(table_id)?;
        if table.has_open_account {
            return Err(SandboxError::bad_request(format!(
                "table {} already has an open account",
                table.number
            )));
        }
        let table_number = table.number;
        table.has_open_account = true;
        table.status = TableStatus::Occupied;

        let account = Account {
            id: self.next_account_id,
            table_id,
            table_number,
            qr_id: self.fresh_qr_id(),
            total: Decimal::ZERO,
            paid: Decimal::ZERO,
            pending: Decimal::ZERO,
            item_count: 0,
            status: AccountStatus::Open,
            opened_at: Some(now),
        };
        self.next_account_id += 1;
        self.accounts.push(account.clone());
        Ok(account)
    }

    pub fn table_account(&self, table_id: u32) -> Result<AccountDetail, SandboxError> {
        self.accounts
            .iter()
            .rev()
            .find(|a| a.table_id == table_id && is_active(a))
            .map(|a| self.detail(a))
            .ok_or_else(|| SandboxError::not_found(format!("table {table_id} has no open account")))
    }

    pub fn add_item(&mut self, account_id: u64, item: &NewItem) -> Result<AccountDetail, SandboxError> {
        item.validate().map_err(SandboxError::bad_request)?;
        self.active_account_mut(account_id)?;

        let line = LineItem {
            id: self.next_item_id,
            name: item.name.trim().to_string(),
            category: item.category.trim().to_string(),
            unit_price: item.unit_price,
            quantity: item.quantity,
        };
        self.next_item_id += 1;
        let items = self.items.entry(account_id).or_default();
        items.push(line);
        let (total, count) = (
            items.iter().map(LineItem::subtotal).sum::<Decimal>(),
            items.len() as u32,
        );

        let account = self.account_mut(account_id)?;
        account.total = total;
        account.item_count = count;
        settle(account);
        let account = account.clone();
        Ok(self.detail(&account))
    }

    pub fn regenerate_qr(&mut self, account_id: u64) -> Result<Account, SandboxError> {
        self.active_account_mut(account_id)?;
        let qr_id = self.fresh_qr_id();
        let account = self.account_mut(account_id)?;
        account.qr_id = qr_id;
        Ok(account.clone())
    }

    /// Close an account regardless of the amount still outstanding.
    pub fn close_account(&mut self, account_id: u64) -> Result<Account, SandboxError> {
        let account = self.active_account_mut(account_id)?;
        account.status = AccountStatus::Paid;
        let closed = account.clone();
        let table = self.table_mut(closed.table_id)?;
        table.has_open_account = false;
        table.status = TableStatus::Available;
        Ok(closed)
    }

    pub fn lookup_qr(&self, qr_id: &str) -> Result<QrLookup, SandboxError> {
        self.accounts
            .iter()
            .find(|a| is_active(a) && a.qr_id == qr_id)
            .map(|account| QrLookup {
                table_number: account.table_number,
                account: account.clone(),
            })
            .ok_or_else(|| SandboxError::not_found(format!("QR {qr_id} is not active")))
    }

    pub fn record_payment(
        &mut self,
        qr_id: &str,
        payment: GuestPayment,
        now: DateTime<Utc>,
    ) -> Result<Payment, SandboxError> {
        if payment.amount <= Decimal::ZERO {
            return Err(SandboxError::bad_request("payment amount must be positive"));
        }
        let account_id = self.lookup_qr(qr_id)?.account.id;
        let account = self.account_mut(account_id)?;
        if payment.amount > account.outstanding() {
            return Err(SandboxError::bad_request(format!(
                "payment of {} exceeds pending amount {}",
                payment.amount,
                account.outstanding()
            )));
        }
        account.paid += payment.amount;
        settle(account);
        let table_number = account.table_number;

        let recorded = Payment {
            id: self.next_payment_id,
            table_number,
            customer_name: payment.customer_name,
            customer_phone: payment.customer_phone,
            amount: payment.amount,
            method: payment.method,
            split_type: payment.split_type,
            status: PaymentStatus::Completed,
            timestamp: now,
            transaction_id: format!("TXN-{:06}", self.next_payment_id),
            qr_id: qr_id.to_string(),
            items: payment.items,
        };
        self.next_payment_id += 1;
        self.payments.push(recorded.clone());
        Ok(recorded)
    }
}

/// Recompute pending and the open/partial status. A fully paid account stays
/// `Partial` with nothing pending until staff close it, which frees the table.
fn settle(account: &mut Account) {
    account.pending = account.outstanding();
    if is_active(account) {
        account.status = if account.paid.is_zero() {
            AccountStatus::Open
        } else {
            AccountStatus::Partial
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    fn item(name: &str, cents: i64, quantity: u32) -> NewItem {
        NewItem {
            name: name.to_string(),
            category: "food".to_string(),
            unit_price: Decimal::new(cents, 2),
            quantity,
        }
    }

    fn pay(amount: i64) -> GuestPayment {
        GuestPayment {
            customer_name: "Rita".to_string(),
            customer_phone: None,
            amount: Decimal::new(amount, 2),
            method: PaymentMethod::Cash,
            split_type: SplitType::Even,
            items: vec![],
        }
    }

    #[test]
    fn one_open_account_per_table() {
        let mut store = Store::new(3);
        let account = store.open_account(2, now()).unwrap();
        assert_eq!(account.table_number, 2);
        assert_eq!(account.qr_id.len(), QR_ID_LEN);
        assert!(matches!(
            store.open_account(2, now()),
            Err(SandboxError::BadRequest { .. })
        ));
        assert!(matches!(
            store.open_account(9, now()),
            Err(SandboxError::NotFound { .. })
        ));

        store.close_account(account.id).unwrap();
        assert!(store.open_account(2, now()).is_ok());
    }

    #[test]
    fn pending_tracks_items_and_payments() {
        let mut store = Store::new(1);
        let account = store.open_account(1, now()).unwrap();
        store.add_item(account.id, &item("Feijoada", 5500, 2)).unwrap();
        let detail = store.add_item(account.id, &item("Guarana", 700, 1)).unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.account.total, Decimal::new(11700, 2));
        assert_eq!(detail.account.pending, Decimal::new(11700, 2));

        let qr_id = detail.account.qr_id.clone();
        store.record_payment(&qr_id, pay(5000), now()).unwrap();
        let account = store.account(account.id).unwrap();
        assert_eq!(account.status, AccountStatus::Partial);
        assert_eq!(account.pending, Decimal::new(6700, 2));
        assert_eq!(account.pending, account.total - account.paid);

        assert!(store.record_payment(&qr_id, pay(9999), now()).is_err());
    }

    #[test]
    fn fully_paid_account_waits_for_explicit_close() {
        let mut store = Store::new(1);
        let account = store.open_account(1, now()).unwrap();
        let detail = store.add_item(account.id, &item("Feijoada", 5500, 1)).unwrap();
        store.record_payment(&detail.account.qr_id, pay(5500), now()).unwrap();

        let settled = store.account(account.id).unwrap();
        assert_eq!(settled.status, AccountStatus::Partial);
        assert_eq!(settled.pending, Decimal::ZERO);
        assert!(store.overview().tables[0].has_open_account);
        assert!(store.table_account(1).is_ok());

        assert_eq!(store.close_account(account.id).unwrap().status, AccountStatus::Paid);
        assert!(!store.overview().tables[0].has_open_account);
    }

    #[test]
    fn close_with_outstanding_amount_is_allowed() {
        let mut store = Store::new(1);
        let account = store.open_account(1, now()).unwrap();
        store.add_item(account.id, &item("Feijoada", 5500, 1)).unwrap();

        let closed = store.close_account(account.id).unwrap();
        assert_eq!(closed.status, AccountStatus::Paid);
        assert_eq!(closed.pending, Decimal::new(5500, 2));
        assert!(!store.overview().tables[0].has_open_account);
        assert!(matches!(
            store.close_account(account.id),
            Err(SandboxError::Conflict { .. })
        ));
        assert!(store.lookup_qr(&closed.qr_id).is_err());
    }

    #[test]
    fn regenerated_qr_replaces_the_old_one() {
        let mut store = Store::new(1);
        let account = store.open_account(1, now()).unwrap();
        let renewed = store.regenerate_qr(account.id).unwrap();
        assert_ne!(renewed.qr_id, account.qr_id);
        assert!(store.lookup_qr(&account.qr_id).is_err());
        assert_eq!(store.lookup_qr(&renewed.qr_id).unwrap().account.id, account.id);
    }

    #[test]
    fn invalid_items_are_rejected() {
        let mut store = Store::new(1);
        let account = store.open_account(1, now()).unwrap();
        assert!(matches!(
            store.add_item(account.id, &item("", 100, 1)),
            Err(SandboxError::BadRequest { .. })
        ));
    }

    #[test]
    fn seeded_store_has_history() {
        let store = Store::seeded(8, now());
        let overview = store.overview();
        assert_eq!(overview.tables.len(), 8);
        assert_eq!(overview.accounts.len(), 3);
        assert_eq!(overview.payments.len(), 2);
        assert_eq!(overview.tables[2].status, TableStatus::Reserved);
        assert!(overview
            .accounts
            .iter()
            .all(|a| a.pending == a.total - a.paid));
    }
}
