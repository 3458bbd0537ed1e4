//! In-memory SplitQR backend for local development and tests.

pub mod controller;
pub mod state;
pub mod store;

use crate::model::config::SandboxConfig;
use crate::sandbox::controller::{account, qr, table};
use crate::sandbox::state::AppState;
use crate::sandbox::store::Store;
use crate::util::time;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

/// Prefix every endpoint is mounted under, matching the default gateway base url.
pub const API_PREFIX: &str = "/api";

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(API_PREFIX)
            .service(table::get_overview)
            .service(table::post_table_account)
            .service(table::get_table_account)
            .service(account::post_account_items)
            .service(account::post_account_close)
            .service(qr::post_qr_regenerate)
            .service(qr::get_qr_url)
            .service(qr::get_qr_image)
            .service(qr::get_qr_lookup)
            .service(qr::post_qr_payment),
    );
}

/// Serve the sandbox on an already bound listener.
pub fn serve(listener: TcpListener, state: AppState) -> std::io::Result<Server> {
    let data = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(routes)
    })
    .listen(listener)?
    .run())
}

/// Run the sandbox server
pub async fn run(
    SandboxConfig {
        addr,
        public_url,
        table_count,
    }: SandboxConfig,
) -> std::io::Result<()> {
    let store = Store::seeded(table_count, time::helper::get_utc_now());
    let listener = TcpListener::bind(addr)?;
    serve(listener, AppState::new(store, public_url))?.await
}
