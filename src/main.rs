use std::net::SocketAddr;

use config::CONFIG;
use controller::{cors_layer, create_router, handle_404};
use crate::service::app_state::{create_app_state, create_state_router};

use env_logger::Env;
use log::info;
use tower_http::services::{ServeDir, ServeFile};

mod config;
mod controller;
mod database;
mod provider;
mod schema;
mod service;
mod utils;

#[tokio::main]
async fn main() {
    env_logger::init_from_env(Env::default().default_filter_or(CONFIG.log_level.as_str()));
    let addr = format!("{}:{}", &CONFIG.host, CONFIG.port);
    info!("server start at {}", &addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    let app_state = create_app_state().await;

    let app = create_state_router().nest(&CONFIG.base_path, create_router());
    // a built frontend is served outside the base path when configured
    let app = match &CONFIG.static_dir {
        Some(dir) => app.fallback_service(
            ServeDir::new(dir).not_found_service(ServeFile::new(format!("{}/index.html", dir))),
        ),
        None => app.fallback(handle_404),
    };

    axum::serve(
        listener,
        app.layer(cors_layer())
            .with_state(app_state)
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("failed to start server");
}
