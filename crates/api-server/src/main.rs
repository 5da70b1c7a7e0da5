use api_server::{app, AppState, Settings};
use sqlite::{DBType, SqliteStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = SqliteStore::new(DBType::Url(&settings.database_url)).await?;
    let app = app(AppState::new(store), &settings);

    let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
    info!(
        "exercise tracker listening on port {}",
        listener.local_addr()?.port()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
