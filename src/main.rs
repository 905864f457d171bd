use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

use clientdesk::auth::AuthMiddleware;
use clientdesk::config::Config;
use clientdesk::images::ImageKitClient;
use clientdesk::routes::{self, health};
use clientdesk::state::AppState;
use clientdesk::store::{self, PgStore};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;

    let images = ImageKitClient::new(&config.imagekit)
        .map_err(|e| startup_error("Failed to build image store client", e))?;

    let pg = Arc::new(PgStore::new(pool));
    let state = AppState::new(
        pg.clone(),
        pg.clone(),
        Arc::new(images),
        config.auth.clone(),
        config.environment.clone(),
    );

    if let Some(seed) = &config.admin {
        store::ensure_admin(state.users.as_ref(), seed, config.auth.bcrypt_cost)
            .await
            .map_err(|e| startup_error("Failed to seed admin account", e))?;
    }

    log::info!(
        "Starting server at {} ({})",
        config.server_url(),
        config.environment
    );

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(routes::json_config())
            .app_data(routes::path_config())
            .app_data(routes::query_config())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
