use std::sync::Arc;

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use nurture_chat::config::ProxySettings;
use nurture_chat::model::GroqModel;
use nurture_chat::web::{self, routes};
use nurture_chat::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting chat proxy");

    let settings = match ProxySettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // The provider client is built once and shared by every worker
    let provider = match GroqModel::new(&settings) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            error!("Failed to initialize upstream client: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = Data::new(AppState::new(provider, (&settings).into()));

    info!("Listening on {}:{}", settings.host, settings.port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(web::cors())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
