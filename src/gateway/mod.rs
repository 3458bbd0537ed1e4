//! Remote data gateway for the SplitQR backend.
//!
//! Every call is a stateless request/response pair: no retry, no timeout override,
//! failures come back as [`GatewayError`] with the HTTP status or the network error.

mod error;
#[cfg(test)]
pub(crate) mod mock;

pub use error::{ApiResult, GatewayError};

use crate::model::{
    Account, AccountDetail, NewItem, Overview, QrImageParams, QrLink, QrLookup,
};
use log::{debug, warn};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Smallest and largest QR image the rendering endpoint accepts, in pixels.
pub const QR_SIZE_RANGE: std::ops::RangeInclusive<u32> = 100..=1000;

/// Operations the dashboard issues against the backend.
pub trait SplitQrApi: Send + Sync + 'static {
    fn fetch_overview(&self) -> impl Future<Output = ApiResult<Overview>> + Send;

    fn open_account(&self, table_id: u32) -> impl Future<Output = ApiResult<Account>> + Send;

    /// open account of a table together with its line items
    fn fetch_account(&self, table_id: u32)
        -> impl Future<Output = ApiResult<AccountDetail>> + Send;

    fn add_item(
        &self,
        account_id: u64,
        item: &NewItem,
    ) -> impl Future<Output = ApiResult<AccountDetail>> + Send;

    fn regenerate_qr(&self, account_id: u64) -> impl Future<Output = ApiResult<Account>> + Send;

    fn qr_url(&self, account_id: u64) -> impl Future<Output = ApiResult<QrLink>> + Send;

    fn qr_image(
        &self,
        account_id: u64,
        params: QrImageParams,
    ) -> impl Future<Output = ApiResult<Vec<u8>>> + Send;

    fn close_account(&self, account_id: u64) -> impl Future<Output = ApiResult<Account>> + Send;

    fn lookup_qr(&self, qr_id: &str) -> impl Future<Output = ApiResult<QrLookup>> + Send;
}

/// Download a QR image and save it as `<dir>/<account_id>.<format>`.
pub async fn download_qr<G: SplitQrApi>(
    api: &G,
    account_id: u64,
    params: QrImageParams,
    dir: &Path,
) -> ApiResult<PathBuf> {
    if !QR_SIZE_RANGE.contains(&params.size) {
        return Err(GatewayError::validation(format!(
            "QR size must be between {} and {} pixels",
            QR_SIZE_RANGE.start(),
            QR_SIZE_RANGE.end()
        )));
    }
    let bytes = api.qr_image(account_id, params).await?;
    let path = dir.join(format!("{}.{}", account_id, params.format.extension()));
    tokio::fs::write(&path, &bytes).await?;
    debug!("saved QR image of account={} to {}", account_id, path.display());
    Ok(path)
}

/// reqwest-backed gateway bound to one base url
#[derive(Debug, Clone)]
pub struct Gateway {
    client: Client,
    base_url: Url,
}

impl Gateway {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::validation(format!("invalid base url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::validation(format!(
                "base url {base_url} cannot carry a path"
            )));
        }
        let client = Client::builder().build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/splitqr/<segments...>`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("splitqr").extend(segments);
        }
        url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response> {
        debug!("{} {}", method, url);
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| {
            warn!("{} {} failed, {}", method, url, e);
            GatewayError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("{} {} returned {}", method, url, status);
            let message = match text.trim() {
                "" => status.canonical_reason().unwrap_or("unknown error").to_string(),
                text => text.to_string(),
            };
            return Err(GatewayError::Http { status, message });
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let response = self.send::<()>(Method::GET, url, None).await?;
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let response = self.send(Method::POST, url, body).await?;
        Ok(response.json().await?)
    }
}

impl SplitQrApi for Gateway {
    async fn fetch_overview(&self) -> ApiResult<Overview> {
        self.get(self.endpoint(&["tables", "overview"])).await
    }

    async fn open_account(&self, table_id: u32) -> ApiResult<Account> {
        let url = self.endpoint(&["tables", &table_id.to_string(), "account"]);
        self.post::<_, ()>(url, None).await
    }

    async fn fetch_account(&self, table_id: u32) -> ApiResult<AccountDetail> {
        self.get(self.endpoint(&["tables", &table_id.to_string(), "account"]))
            .await
    }

    async fn add_item(&self, account_id: u64, item: &NewItem) -> ApiResult<AccountDetail> {
        let url = self.endpoint(&["accounts", &account_id.to_string(), "items"]);
        self.post(url, Some(item)).await
    }

    async fn regenerate_qr(&self, account_id: u64) -> ApiResult<Account> {
        let url = self.endpoint(&["accounts", &account_id.to_string(), "qr", "regenerate"]);
        self.post::<_, ()>(url, None).await
    }

    async fn qr_url(&self, account_id: u64) -> ApiResult<QrLink> {
        self.get(self.endpoint(&["accounts", &account_id.to_string(), "qr", "url"]))
            .await
    }

    async fn qr_image(&self, account_id: u64, params: QrImageParams) -> ApiResult<Vec<u8>> {
        let mut url = self.endpoint(&["accounts", &account_id.to_string(), "qr", "image"]);
        url.query_pairs_mut()
            .append_pair("format", params.format.extension())
            .append_pair("size", &params.size.to_string());
        let response = self.send::<()>(Method::GET, url, None).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn close_account(&self, account_id: u64) -> ApiResult<Account> {
        let url = self.endpoint(&["accounts", &account_id.to_string(), "close"]);
        self.post::<_, ()>(url, None).await
    }

    async fn lookup_qr(&self, qr_id: &str) -> ApiResult<QrLookup> {
        self.get(self.endpoint(&["qr", qr_id])).await
    }
}
