use anyhow::Context;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::get,
    Router,
};
use meetings_lib::db::{meetings_db::MeetingsDB, SurrealDBConnection};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, instrument, trace};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod config;
pub mod constants;
pub mod controllers;
pub mod errors;
pub mod state;
pub mod utils;

use config::{MeetingsConfig, ServerConfig};
use controllers::c_meetings::{
    get_meetings, handle_create_meeting, handle_delete_meeting, handle_delete_meetings,
    handle_get_meeting, handle_update_meeting,
};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    trace!("tracing subscriber initialized");

    let config = MeetingsConfig::load()?;
    debug!("server config: {:#?}", config.server);

    let db = connect_to_db(&config.database).await?;

    // build our application
    let app = init_api(AppState { db }, cors_layer(&config.server)?);

    // run our app
    serve(app, &config.server).await
}

#[instrument(skip(conn), fields(address = %conn.address))]
async fn connect_to_db(conn: &SurrealDBConnection) -> anyhow::Result<MeetingsDB> {
    let db = MeetingsDB::connect(conn).await.with_context(|| {
        format!(
            "Unable to reach database {}/{} at {}. Is it running?",
            conn.namespace, conn.database, conn.address
        )
    })?;

    info!("connected to {}/{}", conn.namespace, conn.database);
    Ok(db)
}

#[instrument]
fn cors_layer(server: &ServerConfig) -> anyhow::Result<CorsLayer> {
    let origin = server
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin {:?}", server.cors_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true))
}

pub fn init_api(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route(
            "/meeting",
            get(get_meetings)
                .post(handle_create_meeting)
                .delete(handle_delete_meetings),
        )
        .route(
            "/meeting/:meeting_id",
            get(handle_get_meeting)
                .put(handle_update_meeting)
                .delete(handle_delete_meeting),
        )
        .layer(TraceLayer::new_for_http())
        // ^^ CORS layer ^^
        .layer(cors)
        .with_state(state)
}

#[instrument(skip(app))]
async fn serve(app: Router, server: &ServerConfig) -> anyhow::Result<()> {
    let addr = server.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("unable to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
