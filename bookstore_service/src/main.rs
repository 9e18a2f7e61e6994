use std::sync::Arc;

use actix_web::{App, HttpServer};
use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use bookstore_service::app_config::{config_app, path_config};
use bookstore_service::repository::{
    AuthorRepository, BookRepository, InMemoryBookstoreRepository, PostgresBookstoreRepository,
};
use bookstore_service::services::{AuthorService, BookService};
use bookstore_service::settings::Settings;

const APP_NAME: &str = "bookstore_service";

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry(jaeger_enabled: bool) -> anyhow::Result<()> {
    // Spans are exported in batch to Jaeger when enabled
    let telemetry = if jaeger_enabled {
        global::set_text_map_propagator(TraceContextPropagator::new());
        #[allow(deprecated)]
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name(APP_NAME)
            .install_batch(TokioCurrentThread)
            .context("Failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new(APP_NAME.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install `tracing` subscriber")
}

fn build_services<R>(repository: Arc<R>) -> (AuthorService, BookService)
where
    R: AuthorRepository + BookRepository + 'static,
{
    (
        AuthorService::new(repository.clone()),
        BookService::new(repository),
    )
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_telemetry(settings.jaeger_enabled)?;

    let (author_service, book_service) = if settings.use_in_memory_db {
        tracing::info!("Using in-memory storage");
        build_services(Arc::new(InMemoryBookstoreRepository::default()))
    } else {
        build_services(Arc::new(
            PostgresBookstoreRepository::init(settings.postgres_config())
                .await
                .context("Failed to init postgres")?,
        ))
    };

    tracing::info!(
        "Starting HTTP server at http://{}:{}",
        settings.host,
        settings.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(path_config())
            .app_data(web::Data::new(author_service.clone()))
            .app_data(web::Data::new(book_service.clone()))
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    global::shutdown_tracer_provider();
    Ok(())
}
