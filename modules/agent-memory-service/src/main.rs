//! Agent Memory Service: standalone binary exposing the voice agent's memory
//! file (tasks and notes) as a REST API.
//!
//! Hosts both the JSON API and a dashboard UI on the same port.
//! Default: http://127.0.0.1:5000/

mod config;
mod dashboard;
mod error;
mod routes;
mod store;

use config::Config;
use routes::AppState;
use std::sync::Arc;
use std::time::Instant;
use store::{JsonFileStore, MemoryStore};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store = JsonFileStore::new(&config.memory_file);
    log::info!("Using memory file: {}", store.path().display());
    let store: Arc<dyn MemoryStore> = Arc::new(store);

    let state = Arc::new(AppState {
        store,
        port: config.port,
        start_time: Instant::now(),
    });

    let app = routes::router(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    log::info!("Agent Memory Service listening on http://{}", addr);
    log::info!("Endpoints:");
    for endpoint in [
        "GET    /api/tasks",
        "GET    /api/tasks/pending",
        "POST   /api/tasks",
        "PUT    /api/tasks/:index",
        "DELETE /api/tasks/:index",
        "GET    /api/notes",
        "POST   /api/notes",
        "DELETE /api/notes/:index",
        "GET    /api/stats",
        "GET    /api/health",
    ] {
        log::info!("  {}", endpoint);
    }

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
