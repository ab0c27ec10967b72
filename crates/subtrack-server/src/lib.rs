//! Subtrack Server — HTTP API, configuration and operator commands.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use subtrack_core::clock::SystemClock;
use subtrack_core::models::user::Role;
use subtrack_db::DbManager;
use tracing::info;

pub use config::Config;
pub use error::{ApiError, StartupError};
pub use state::AppState;

async fn build_state(config: &Config) -> Result<web::Data<AppState>, StartupError> {
    let db = DbManager::connect(&config.db_config()).await?;
    let state = AppState::new(
        &db,
        config.auth_config(),
        config.billing.default_currency.clone(),
        Arc::new(SystemClock),
    )?;
    Ok(web::Data::new(state))
}

/// Connect to the store and serve the API until shutdown.
pub async fn serve(config: Config) -> Result<(), StartupError> {
    let state = build_state(&config).await?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting subtrack server"
    );

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| api::configure(cfg, state))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    info!("Subtrack server stopped");
    Ok(())
}

/// Promote an existing account to admin. Operator-only; there is no
/// HTTP route for this.
pub async fn grant_admin(config: &Config, email: &str) -> Result<(), StartupError> {
    let state = build_state(config).await?;
    let user = state.auth.assign_role(email, Role::Admin).await?;
    info!(user_id = %user.id, "Granted admin role");
    Ok(())
}
