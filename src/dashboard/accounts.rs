use crate::dashboard::notice::{Notice, NoticeSlot};
use crate::dashboard::Refresher;
use crate::gateway::{ApiResult, SplitQrApi};
use crate::model::{Account, AccountDetail, AccountStatus, NewItem, Overview};
use log::{debug, info};
use rust_decimal::Decimal;
use std::fmt::Write;
use std::sync::Arc;

/// One rendered line of the account list.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub id: u64,
    pub table_id: u32,
    pub table_number: u32,
    pub qr_id: String,
    pub total: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub item_count: u32,
    pub status: AccountStatus,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            table_id: account.table_id,
            table_number: account.table_number,
            qr_id: account.qr_id.clone(),
            total: account.total,
            paid: account.paid,
            pending: account.outstanding(),
            item_count: account.item_count,
            status: account.status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilter {
    pub status: Option<AccountStatus>,
    /// exact table, unlike the substring search
    pub table_id: Option<u32>,
    /// matched against table number and QR id
    pub search: String,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        if self.status.is_some_and(|status| account.status != status)
            || self.table_id.is_some_and(|table_id| account.table_id != table_id)
        {
            return false;
        }
        let query = self.search.trim().to_lowercase();
        query.is_empty()
            || account.table_number.to_string().contains(&query)
            || account.qr_id.to_lowercase().contains(&query)
    }
}

/// Handle for an account-detail fetch; only the latest one is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    generation: u64,
    table_id: u32,
}

#[derive(Debug)]
struct Selection {
    ticket: DetailTicket,
    detail: Option<AccountDetail>,
}

/// Account manager view.
pub struct AccountManager<G: SplitQrApi> {
    gateway: Arc<G>,
    pub filter: AccountFilter,
    generation: u64,
    selection: Option<Selection>,
    /// add-item modal, holding the draft while open
    modal: Option<NewItem>,
    busy: bool,
    notices: NoticeSlot,
}

impl<G: SplitQrApi> AccountManager<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            filter: AccountFilter::default(),
            generation: 0,
            selection: None,
            modal: None,
            busy: false,
            notices: NoticeSlot::default(),
        }
    }

    pub fn rows(&self, overview: &Overview) -> Vec<AccountRow> {
        overview
            .accounts
            .iter()
            .filter(|a| self.filter.matches(a))
            .map(AccountRow::from)
            .collect()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&mut self) -> Option<&Notice> {
        self.notices.current()
    }

    pub fn selected(&self) -> Option<&AccountDetail> {
        self.selection.as_ref().and_then(|s| s.detail.as_ref())
    }

    /// Mark `table_id` as selected and hand out the ticket its fetch must present.
    pub fn begin_select(&mut self, table_id: u32) -> DetailTicket {
        self.generation += 1;
        let ticket = DetailTicket {
            generation: self.generation,
            table_id,
        };
        self.selection = Some(Selection {
            ticket,
            detail: None,
        });
        ticket
    }

    /// Apply a detail response; returns false when a newer selection superseded it.
    pub fn apply_detail(&mut self, ticket: DetailTicket, result: ApiResult<AccountDetail>) -> bool {
        let Some(selection) = self.selection.as_mut().filter(|s| s.ticket == ticket) else {
            debug!("discarding stale detail of table={}", ticket.table_id);
            return false;
        };
        match result {
            Ok(detail) => selection.detail = Some(detail),
            Err(e) => self.notices.show(Notice::error(e.to_string())),
        }
        true
    }

    /// Select the open account of a table and load its items.
    pub async fn select(&mut self, table_id: u32) {
        let ticket = self.begin_select(table_id);
        let result = self.gateway.fetch_account(table_id).await;
        self.apply_detail(ticket, result);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.modal = None;
    }

    pub fn open_item_modal(&mut self) {
        if self.selected().is_some() {
            self.modal = Some(NewItem {
                quantity: 1,
                ..Default::default()
            });
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut NewItem> {
        self.modal.as_mut()
    }

    pub fn cancel_item_modal(&mut self) {
        self.modal = None;
    }

    /// Submit the modal draft to the selected account.
    ///
    /// Validation failures keep the modal open with an error notice.
    pub async fn submit_item<R: Refresher>(&mut self, refresher: &R) -> bool {
        let (Some(draft), Some(account_id)) =
            (self.modal.clone(), self.selected().map(|d| d.account.id))
        else {
            return false;
        };
        if let Err(reason) = draft.validate() {
            self.notices.show(Notice::error(reason));
            return false;
        }

        self.busy = true;
        let result = self.gateway.add_item(account_id, &draft).await;
        self.busy = false;
        match result {
            Ok(detail) => {
                info!("added {} x{} to account={}", draft.name, draft.quantity, account_id);
                if let Some(selection) = self.selection.as_mut() {
                    selection.detail = Some(detail);
                }
                self.modal = None;
                self.notices.show(Notice::success(format!("{} added", draft.name)));
                refresher.request_refresh().await;
                true
            }
            Err(e) => {
                self.notices.show(Notice::error(e.to_string()));
                false
            }
        }
    }

    /// Close an account. Outstanding amounts do not block the request.
    pub async fn close_account<R: Refresher>(&mut self, account_id: u64, refresher: &R) -> bool {
        self.busy = true;
        let result = self.gateway.close_account(account_id).await;
        self.busy = false;
        match result {
            Ok(account) => {
                info!("closed account={} with {} outstanding", account.id, account.outstanding());
                if self
                    .selected()
                    .is_some_and(|d| d.account.id == account_id)
                {
                    self.clear_selection();
                }
                self.notices
                    .show(Notice::success(format!("account of table {} closed", account.table_number)));
                refresher.request_refresh().await;
                true
            }
            Err(e) => {
                self.notices.show(Notice::error(e.to_string()));
                false
            }
        }
    }

    pub fn render(&mut self, overview: &Overview) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>5} {:<14} {:>10} {:>10} {:>10} {:>5} status",
            "table", "qr", "total", "paid", "pending", "items"
        );
        for row in self.rows(overview) {
            let _ = writeln!(
                out,
                "{:>5} {:<14} {:>10.2} {:>10.2} {:>10.2} {:>5} {}",
                row.table_number, row.qr_id, row.total, row.paid, row.pending, row.item_count, row.status
            );
        }
        if let Some(detail) = self.selected() {
            let _ = writeln!(out, "--- table {} ---", detail.account.table_number);
            for item in &detail.items {
                let _ = writeln!(
                    out,
                    "{:>3} x {:<24} {:<10} {:>8.2}",
                    item.quantity,
                    item.name,
                    item.category,
                    item.subtotal()
                );
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_util::CountingRefresher;
    use crate::gateway::mock::{account, MockGateway};
    use std::time::Duration;

    fn manager() -> (Arc<MockGateway>, AccountManager<MockGateway>) {
        let gateway = Arc::new(MockGateway::with_accounts(vec![
            account(1, 1, 12000, 0),
            account(2, 2, 9000, 4500),
            account(3, 12, 3000, 3000),
        ]));
        (gateway.clone(), AccountManager::new(gateway))
    }

    fn overview(gateway: &MockGateway) -> Overview {
        Overview {
            accounts: gateway.accounts.lock().unwrap().clone(),
            ..Default::default()
        }
    }

    #[test]
    fn rows_display_pending_as_total_minus_paid() {
        let (gateway, manager) = manager();
        let mut overview = overview(&gateway);
        // backend reporting an inconsistent pending value
        overview.accounts[1].pending = Decimal::new(1, 0);
        for row in manager.rows(&overview) {
            assert_eq!(row.pending, row.total - row.paid);
        }
        assert_eq!(manager.rows(&overview)[1].pending, Decimal::new(4500, 2));
    }

    #[test]
    fn filter_by_status_and_search() {
        let (gateway, mut manager) = manager();
        let overview = overview(&gateway);

        manager.filter.status = Some(AccountStatus::Partial);
        let rows = manager.rows(&overview);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);

        manager.filter.status = None;
        manager.filter.search = "1".to_string();
        let rows = manager.rows(&overview);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);

        manager.filter.search = "QR-2".to_string();
        let rows = manager.rows(&overview);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn table_filter_matches_exactly() {
        let (gateway, mut manager) = manager();
        let overview = overview(&gateway);

        manager.filter.table_id = Some(1);
        let rows = manager.rows(&overview);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);

        manager.filter.table_id = Some(7);
        assert!(manager.rows(&overview).is_empty());
    }

    #[tokio::test]
    async fn closed_account_is_not_selectable() {
        let (gateway, mut manager) = manager();
        manager.select(12).await;
        assert!(manager.selected().is_none());
        assert!(manager.notice().is_some());
        assert!(gateway.calls().contains(&"fetch_account 12".to_string()));
    }

    #[tokio::test]
    async fn close_account_with_outstanding_amount_is_sent() {
        let (gateway, mut manager) = manager();
        let refresher = CountingRefresher::default();
        manager.select(1).await;

        assert!(manager.close_account(1, &refresher).await);
        assert!(gateway.calls().contains(&"close_account 1".to_string()));
        assert_eq!(refresher.count(), 1);
        assert!(manager.selected().is_none());
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_backend() {
        let (gateway, mut manager) = manager();
        let refresher = CountingRefresher::default();
        manager.select(2).await;
        manager.open_item_modal();
        manager.draft_mut().unwrap().name = "Moqueca".to_string();

        assert!(!manager.submit_item(&refresher).await);
        assert!(manager.draft_mut().is_some(), "modal stays open");
        assert!(manager.notice().is_some());
        assert!(!gateway.calls().iter().any(|c| c.starts_with("add_item")));
        assert_eq!(refresher.count(), 0);
    }

    #[tokio::test]
    async fn valid_draft_updates_detail_and_refreshes() {
        let (gateway, mut manager) = manager();
        let refresher = CountingRefresher::default();
        manager.select(2).await;
        manager.open_item_modal();
        *manager.draft_mut().unwrap() = NewItem {
            name: "Moqueca".to_string(),
            category: "mains".to_string(),
            unit_price: Decimal::new(8900, 2),
            quantity: 1,
        };

        assert!(manager.submit_item(&refresher).await);
        assert!(manager.draft_mut().is_none());
        let detail = manager.selected().unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.account.total, Decimal::new(17900, 2));
        assert_eq!(refresher.count(), 1);
        assert!(gateway.calls().contains(&"add_item 2 Moqueca".to_string()));
    }

    #[tokio::test]
    async fn stale_detail_response_is_discarded() {
        let (gateway, mut manager) = manager();
        gateway
            .detail_delays
            .lock()
            .unwrap()
            .insert(1, Duration::from_millis(80));

        let slow = manager.begin_select(1);
        let slow_fetch = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.fetch_account(1).await })
        };
        manager.select(2).await;
        assert_eq!(manager.selected().unwrap().account.id, 2);

        let late = slow_fetch.await.unwrap();
        assert!(!manager.apply_detail(slow, late));
        assert_eq!(manager.selected().unwrap().account.id, 2);
    }
}
