pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod media;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod services;
pub mod views;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::media::MediaStore;
use crate::repository::BlogRepository;
use crate::views::html::HtmlRenderer;
use crate::views::Renderer;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn BlogRepository>,
    pub sessions: SessionManager,
    pub media: MediaStore,
    pub renderer: Arc<dyn Renderer>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State with the default HTML renderer.
    pub fn new(config: Config, repo: Arc<dyn BlogRepository>) -> Self {
        let renderer = Arc::new(HtmlRenderer::new(config.media.url_prefix.clone()));
        Self {
            repo,
            sessions: SessionManager::new(&config.session),
            media: MediaStore::new(&config.media),
            renderer,
            config: Arc::new(config),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

/// The full site: pages, uploaded media, health probe, request tracing.
pub fn app(state: AppState) -> Router {
    api::routes(&state)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
