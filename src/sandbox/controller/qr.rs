use crate::gateway::QR_SIZE_RANGE;
use crate::model::{QrFormat, QrImageParams, QrLink};
use crate::sandbox::controller::error::SandboxError;
use crate::sandbox::state::AppState;
use crate::sandbox::store::GuestPayment;
use crate::util::time;
use actix_web::{get, post, web, HttpResponse, Responder};
use log::info;

#[post("/splitqr/accounts/{id}/qr/regenerate")]
/// replace the QR id of an account, invalidating the printed one
pub(crate) async fn post_qr_regenerate(
    id: web::Path<u64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let account = data.store().lock().await.regenerate_qr(id.into_inner())?;
    info!("account={} has new qr={}", account.id, account.qr_id);
    Ok(web::Json(account))
}

#[get("/splitqr/accounts/{id}/qr/url")]
pub(crate) async fn get_qr_url(
    id: web::Path<u64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let qr_id = data.store().lock().await.account(id.into_inner())?.qr_id.clone();
    Ok(web::Json(QrLink {
        url: data.payment_url(&qr_id),
        qr_id,
    }))
}

/// Placeholder artwork: three finder squares and the payment url as text.
fn placeholder_svg(size: u32, url: &str) -> String {
    let finder = |x: u32, y: u32| {
        format!(
            r##"<rect x="{x}" y="{y}" width="24" height="24"/><rect x="{}" y="{}" width="16" height="16" fill="#fff"/><rect x="{}" y="{}" width="8" height="8"/>"##,
            x + 4,
            y + 4,
            x + 8,
            y + 8
        )
    };
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 100 100"><rect width="100" height="100" fill="#fff"/>{}{}{}<text x="50" y="62" font-size="4" text-anchor="middle">{}</text></svg>"##,
        finder(4, 4),
        finder(72, 4),
        finder(4, 72),
        url.replace('&', "&amp;").replace('<', "&lt;")
    )
}

#[get("/splitqr/accounts/{id}/qr/image")]
/// QR image; only svg placeholders are rendered here
pub(crate) async fn get_qr_image(
    id: web::Path<u64>,
    params: web::Query<QrImageParams>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let QrImageParams { format, size } = params.into_inner();
    if !QR_SIZE_RANGE.contains(&size) {
        return Err(SandboxError::bad_request(format!("unsupported QR size {size}")));
    }
    let qr_id = data.store().lock().await.account(id.into_inner())?.qr_id.clone();
    match format {
        QrFormat::Svg => Ok(HttpResponse::Ok()
            .content_type("image/svg+xml")
            .body(placeholder_svg(size, &data.payment_url(&qr_id)))),
        QrFormat::Png => Err(SandboxError::bad_request(
            "png rendering is not available in the sandbox, request svg",
        )),
    }
}

#[get("/splitqr/qr/{qr_id}")]
/// resolve a QR id to its active account
pub(crate) async fn get_qr_lookup(
    qr_id: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let lookup = data.store().lock().await.lookup_qr(&qr_id)?;
    Ok(web::Json(lookup))
}

#[post("/splitqr/qr/{qr_id}/payments")]
/// guest payment as the payment page would post it
pub(crate) async fn post_qr_payment(
    qr_id: web::Path<String>,
    body: web::Json<GuestPayment>,
    data: web::Data<AppState>,
) -> Result<impl Responder, SandboxError> {
    let payment = data.store().lock().await.record_payment(
        &qr_id,
        body.into_inner(),
        time::helper::get_utc_now(),
    )?;
    info!("payment {} of {} via qr={}", payment.transaction_id, payment.amount, payment.qr_id);
    Ok(HttpResponse::Created().json(payment))
}
