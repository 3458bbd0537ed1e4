use crate::sandbox::store::Store;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Store>>,
    public_url: String,
}

impl AppState {
    pub fn new(store: Store, public_url: impl Into<String>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &Mutex<Store> {
        &self.store
    }

    /// guest payment page encoded into the QR
    pub fn payment_url(&self, qr_id: &str) -> String {
        format!("{}/pay/{}", self.public_url, qr_id)
    }
}
