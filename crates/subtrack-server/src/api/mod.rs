//! HTTP routes.

pub mod health;
pub mod subscriptions;
pub mod users;

use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{HttpRequest, web};
use subtrack_core::error::SubtrackError;

use crate::error::ApiError;
use crate::middleware::VerifyBearer;
use crate::state::AppState;

/// Register every route. Used by the binary and by the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let verify = VerifyBearer::new(state.auth.tokens().clone());

    cfg.app_data(state)
        .app_data(web::JsonConfig::default().error_handler(json_error))
        .service(web::resource("/health").route(web::get().to(health::health)))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/users")
                        .service(web::resource("/register").route(web::post().to(users::register)))
                        .service(web::resource("/login").route(web::post().to(users::login)))
                        .service(
                            web::resource("/profile")
                                .wrap(verify.clone())
                                .route(web::get().to(users::profile)),
                        )
                        .service(
                            web::resource("")
                                .wrap(verify.clone())
                                .route(web::get().to(users::list)),
                        ),
                )
                .service(
                    web::scope("/subscriptions")
                        .wrap(verify)
                        .app_data(web::PathConfig::default().error_handler(path_error))
                        .service(
                            web::resource("")
                                .route(web::get().to(subscriptions::list))
                                .route(web::post().to(subscriptions::create)),
                        )
                        // Fixed segments before `{id}`.
                        .service(
                            web::resource("/summary").route(web::get().to(subscriptions::summary)),
                        )
                        .service(
                            web::resource("/admin/all")
                                .route(web::get().to(subscriptions::list_all)),
                        )
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(subscriptions::get))
                                .route(web::put().to(subscriptions::update))
                                .route(web::delete().to(subscriptions::cancel)),
                        ),
                ),
        );
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::from(SubtrackError::validation(format!("invalid request body: {err}"))).into()
}

/// A malformed id cannot name an existing record.
fn path_error(_err: PathError, req: &HttpRequest) -> actix_web::Error {
    let id = req.match_info().get("id").unwrap_or_default();
    ApiError::from(SubtrackError::not_found("subscription", id)).into()
}
