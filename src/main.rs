use clap::Parser;
use cookbook::{
    api::{routes, AppState},
    cli::{commands, Cli, Commands},
    clients::{AnthropicClient, VoyageClient},
    config::Settings,
    db,
    indexer::SearchIndex,
    orchestrator::{SearchOptions, SearchService},
    store::LocalStore,
    Error, Result,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Everything a command needs, wired once at startup
struct App {
    store: Arc<LocalStore>,
    embedder: Arc<VoyageClient>,
    service: Arc<SearchService>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silently ignore a missing .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cookbook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    settings.validate()?;

    match cli.command {
        Commands::Serve { port, host } => serve(settings, port, host).await?,
        Commands::Migrate => migrate(settings).await?,
        Commands::Import { file } => {
            let app = build_app(&settings).await?;
            commands::import(&app.service, &file).await?;
        }
        Commands::Backfill { delay_seconds } => {
            let app = build_app(&settings).await?;
            let delay = Duration::from_secs(
                delay_seconds.unwrap_or(settings.embedding.backfill_delay_seconds),
            );
            commands::backfill(&app.service, app.embedder.as_ref(), delay).await?;
        }
        Commands::Reindex => {
            let app = build_app(&settings).await?;
            commands::reindex(&app.store).await?;
        }
        Commands::Search { query, limit } => {
            let app = build_app(&settings).await?;
            commands::search(&app.service, &query, limit).await?;
        }
        Commands::Fuzzy { query } => {
            let app = build_app(&settings).await?;
            commands::fuzzy(&app.service, &query).await?;
        }
        Commands::Suggest { ingredients } => {
            let app = build_app(&settings).await?;
            commands::suggest(&app.service, &ingredients).await?;
        }
        Commands::Stats => {
            let app = build_app(&settings).await?;
            commands::stats(&app.service).await?;
        }
    }

    Ok(())
}

async fn build_app(settings: &Settings) -> Result<App> {
    let pool = db::init_pool_with_config(&settings.database).await?;
    info!(
        "Database connection established (max_connections: {}, min_connections: {})",
        settings.database.max_connections, settings.database.min_connections
    );

    db::run_migrations(&pool).await?;

    let index_path = settings.text_index_dir();
    let text_index = SearchIndex::new(&index_path)?;
    info!("Search index initialized at {:?}", index_path);

    let store = Arc::new(LocalStore::new(
        pool,
        text_index,
        settings.search.text_index_name.clone(),
        settings.search.vector_index_name.clone(),
    ));
    let embedder = Arc::new(VoyageClient::new(settings.embedding.clone())?);
    let completer = Arc::new(AnthropicClient::new(settings.suggestion.clone())?);

    let service = Arc::new(SearchService::new(
        store.clone(),
        embedder.clone(),
        completer,
        SearchOptions::from_settings(settings),
    ));

    Ok(App {
        store,
        embedder,
        service,
    })
}

async fn serve(mut settings: Settings, port: Option<u16>, host: Option<String>) -> Result<()> {
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(host) = host {
        settings.server.host = host;
    }

    info!("Starting cookbook server");
    info!("Database: {}", settings.database.url);
    info!("Server: {}:{}", settings.server.host, settings.server.port);

    let app = build_app(&settings).await?;
    let state = AppState {
        service: app.service,
    };
    let router = routes::create_router(state, &settings)?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    println!("\n========================================");
    println!("Cookbook Server");
    println!("========================================");
    println!("Address: http://{addr}");
    println!("\nEndpoints:");
    println!("  GET  /top");
    println!("  GET  /recipe/:id");
    println!("  GET  /stats");
    println!("  GET  /ingredient-search?query=");
    println!("  GET  /fuzzy-search?q=");
    println!("  GET  /ai-suggestions?ingredients=");
    println!("\nPress Ctrl+C to stop");
    println!("========================================\n");

    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    info!("Shutting down...");
    Ok(())
}

async fn migrate(settings: Settings) -> Result<()> {
    info!("Running database migrations");

    let pool = db::init_pool_with_config(&settings.database).await?;
    db::run_migrations(&pool).await?;

    println!("\u{2713} Database migrations completed successfully");
    Ok(())
}
