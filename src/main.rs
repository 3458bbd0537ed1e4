//! sandbox backend entry point

use log::{info, warn};
use splitqr::model::config::{bootstrap_env, SandboxConfig};

#[actix_web::main()]
async fn main() -> anyhow::Result<()> {
    // bootstrap
    // a. env
    let (env, dotenv_err) = bootstrap_env();

    // b. logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Some(e) = dotenv_err {
        warn!("failed to load envs from .env.dev, using process env only, {}", e);
    }

    // c. run app
    let config = SandboxConfig::from_env()?;
    info!(
        "Sandbox is starting in env={} on {} with {} tables",
        env, config.addr, config.table_count
    );

    splitqr::sandbox::run(config).await?;
    Ok(())
}
