use actix_web::{middleware::Logger, web, App, HttpServer};
use rgen_studio::{logger, server, GatewayConfig, ImageGateway};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(logger::LoggerConfig::from_env())?;
    if env_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = GatewayConfig::from_env()?;
    logger::log_config_info(&config);

    let gateway = ImageGateway::new(&config);
    if let Err(e) = gateway.provider().check_configuration() {
        log::warn!("⚠️  {}; requests will fail until this is fixed", e);
    }

    let port = config.port();
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), port);

    let data = web::Data::new(gateway);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::new("%r %s %Dms"))
            .configure(server::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
