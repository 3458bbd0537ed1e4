use crate::model::NewItem;
use crate::sandbox::controller::error::SandboxError;
use crate::sandbox::state::AppState;
use actix_web::{post, web, Responder};
use log::info;

#[post("/splitqr/accounts/{id}/items")]
/// add one line item to an account
pub(crate) async fn post_account_items(
    id: web::Path<u64>,
    body: web::Json<NewItem>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let account_id = id.into_inner();
    let detail = data.store().lock().await.add_item(account_id, &body)?;
    info!(
        "added {} x{} to account={}, total={}",
        body.name, body.quantity, account_id, detail.account.total
    );
    Ok(web::Json(detail))
}

#[post("/splitqr/accounts/{id}/close")]
/// close an account, whatever is still pending
pub(crate) async fn post_account_close(
    id: web::Path<u64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let account = data.store().lock().await.close_account(id.into_inner())?;
    info!("closed account={} pending={}", account.id, account.pending);
    Ok(web::Json(account))
}
