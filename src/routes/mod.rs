pub mod auth;
pub mod clients;
pub mod health;
pub mod users;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::error::AppError;

/// Images travel inline as base64, so request bodies may be large.
pub const JSON_LIMIT: usize = 25 * 1024 * 1024;

/// Routes mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::index)
        .service(
            web::scope("/user")
                .service(auth::login)
                .service(users::find_users)
                .service(users::find_user)
                .service(users::create_user)
                .service(users::update_user)
                .service(users::delete_user),
        )
        .service(
            web::scope("/client")
                .service(clients::find_clients)
                .service(clients::find_client)
                .service(clients::create_client)
                .service(clients::update_client)
                .service(clients::delete_client),
        );
}

/// JSON extractor settings: raised size limit and envelope-shaped errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            AppError::BadRequest(err.to_string()).into()
        })
}

/// Malformed ids are reported as missing entities.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
