mod config;
mod errors;
mod imaging;
mod model;
mod routes;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use config::Settings;
use model::ModelRegistry;
use routes::{configure_routes, error_handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    log::info!(
        "Preprocessing: target {}x{}, max dimension {:?}, upload limit {}",
        settings.image.target_size[0],
        settings.image.target_size[1],
        settings.image.max_dimension,
        settings.max_content_label()
    );

    // Loaded before binding so no request ever sees an empty registry.
    let registry = web::Data::new(ModelRegistry::preloaded());
    let bind_address = settings.bind_address();
    let settings = web::Data::new(settings);

    log::info!("Starting {} on {}", settings.service_name, bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(error_handlers())
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(registry.clone())
            .app_data(settings.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
