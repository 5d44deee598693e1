#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::{net::SocketAddr, sync::Arc};

    use project_planner::{
        InMemoryProjectStore, ProjectStore, ScheduleAssembler, http_api, read_config,
    };
    use tracing_subscriber::EnvFilter;

    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("project_planner=info")),
        )
        .init();

    let settings = read_config()?;
    let addr: SocketAddr =
        format!("{}:{}", settings.application.host, settings.application.port).parse()?;

    let store: Arc<dyn ProjectStore> = match &settings.storage.database_path {
        #[cfg(feature = "sqlite")]
        Some(path) => Arc::new(project_planner::SqliteProjectStore::new(path)?),
        #[cfg(not(feature = "sqlite"))]
        Some(_) => {
            tracing::warn!("database_path is set but the sqlite feature is disabled");
            Arc::new(InMemoryProjectStore::new())
        }
        None => Arc::new(InMemoryProjectStore::new()),
    };
    let assembler = ScheduleAssembler::from_settings(&settings);
    let state = http_api::AppState::new(store, assembler)
        .with_decode_options(settings.codec.decode_options());

    tracing::info!(%addr, remote = settings.remote.is_some(), "project planner HTTP API listening");
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
