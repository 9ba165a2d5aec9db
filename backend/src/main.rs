use std::sync::Arc;

use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use shared::{WheelConfig, WheelRng};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerSettings;
use crate::games::backend_wheel_game::create_router as create_wheel_game_router;
use crate::games::wheel_table::TableStore;

mod config;
mod error;
mod games;
mod logging;
mod messages;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WheelConfig>,
    pub settings: Arc<ServerSettings>,
    pub store: Arc<Mutex<TableStore>>,
}

impl AppState {
    pub fn new(config: WheelConfig, settings: ServerSettings) -> Self {
        let rng = match settings.rng_seed {
            Some(seed) => WheelRng::seeded(seed),
            None => WheelRng::from_entropy(),
        };
        Self {
            config: Arc::new(config),
            settings: Arc::new(settings),
            store: Arc::new(Mutex::new(TableStore::new(rng))),
        }
    }
}

pub async fn health_check() -> impl IntoResponse {
    "OK"
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/wheel", create_wheel_game_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path(".env").ok();
    logging::setup();

    let settings = ServerSettings::from_env()?;
    let config = settings.game.build()?;
    if settings.rng_seed.is_some() {
        info!("Using a fixed RNG seed; spins are reproducible");
    }

    let addr = settings.bind_addr;
    let app = build_app(AppState::new(config, settings));

    info!("listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
