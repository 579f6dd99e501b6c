use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod ai;
mod channels;
mod config;
mod controllers;
mod db;
mod files;
mod ids;
mod models;
mod pages;
mod pipeline;
mod provisioning;
mod resolver;

use ai::{GenerationWorkflow, OpenAiWorkflow};
use channels::{TelegramClient, TwitterClient};
use config::Config;
use db::Database;
use files::{FileStorage, PinataClient, UrlCache};
use pages::PageRenderer;
use pipeline::AskPipeline;
use provisioning::ProvisioningService;
use resolver::Resolver;

pub struct AppState {
    pub db: Arc<Database>,
    pub resolver: Arc<Resolver>,
    pub pages: Arc<PageRenderer>,
    pub pipeline: Arc<AskPipeline>,
    pub provisioning: Arc<ProvisioningService>,
    pub workflow: Arc<dyn GenerationWorkflow>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_path);
    let db = Database::new(&config.database_path).expect("Failed to initialize database");
    let db = Arc::new(db);

    let workflow: Arc<dyn GenerationWorkflow> = Arc::new(
        OpenAiWorkflow::new(&config.openai_api_key, &config.openai_model)
            .expect("Failed to initialize generation workflow"),
    );

    let pinata = PinataClient::new(&config.pinata_jwt, &config.pinata_gateway_url)
        .expect("Failed to initialize file storage");
    let files: Arc<dyn FileStorage> = Arc::new(UrlCache::new(Arc::new(pinata)));

    let telegram = Arc::new(TelegramClient::new().expect("Failed to initialize Telegram client"));
    let twitter = Arc::new(
        TwitterClient::new(&config.twitter_api_key, &config.twitter_api_secret)
            .expect("Failed to initialize Twitter client"),
    );

    let resolver = Arc::new(Resolver::new(db.clone(), &config.root_domain));
    let pages = Arc::new(PageRenderer::new(db.clone(), files.clone()));
    let pipeline = Arc::new(AskPipeline::new(
        db.clone(),
        workflow.clone(),
        telegram.clone(),
        twitter,
    ));
    let provisioning = Arc::new(ProvisioningService::new(
        db.clone(),
        files.clone(),
        telegram.clone(),
        &config.create_agent_secret,
    ));

    let static_dir = config.static_dir.clone();
    log::info!("Starting mement server on port {}", port);
    log::info!("Root domain: {}", config.root_domain);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                resolver: Arc::clone(&resolver),
                pages: Arc::clone(&pages),
                pipeline: Arc::clone(&pipeline),
                provisioning: Arc::clone(&provisioning),
                workflow: Arc::clone(&workflow),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::ask::config)
            .configure(controllers::agents::config)
            .configure(controllers::pages::config)
            .service(Files::new("/assets", format!("{}/assets", static_dir)))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
