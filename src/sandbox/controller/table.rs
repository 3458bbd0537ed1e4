use crate::sandbox::controller::error::SandboxError;
use crate::sandbox::state::AppState;
use crate::util::time;
use actix_web::{get, post, web, HttpResponse, Responder};
use log::info;

#[get("/splitqr/tables/overview")]
/// tables, accounts and payments in one snapshot
pub(crate) async fn get_overview(data: web::Data<AppState>) -> impl Responder {
    web::Json(data.store().lock().await.overview())
}

#[post("/splitqr/tables/{id}/account")]
/// open an account for a table
pub(crate) async fn post_table_account(
    id: web::Path<u32>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let table_id = id.into_inner();
    let account = data
        .store()
        .lock()
        .await
        .open_account(table_id, time::helper::get_utc_now())?;
    info!("opened account={} for table={}, qr={}", account.id, table_id, account.qr_id);
    Ok(HttpResponse::Created().json(account))
}

#[get("/splitqr/tables/{id}/account")]
/// open account of a table with its items
pub(crate) async fn get_table_account(
    id: web::Path<u32>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let detail = data.store().lock().await.table_account(id.into_inner())?;
    Ok(web::Json(detail))
}
