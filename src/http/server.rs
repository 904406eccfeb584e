//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Offer every request to the API proxy first (development only)
//! - Serve remaining paths in history mode from the route table
//! - Apply proxy rule reloads while running

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::build_flags::BuildFlags;
use crate::config::DevServerConfig;
use crate::error::StartupError;
use crate::http::views::serve_view;
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::loader::ModuleLoader;
use crate::proxy::{DevProxy, Intercept, ProxyTable};
use crate::routing::{BasePath, RouteInfo, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub loader: ModuleLoader,
    pub base: BasePath,
    /// Absent outside development mode.
    pub proxy: Option<Arc<DevProxy>>,
}

/// The development server.
pub struct DevServer {
    router: Router,
    config: DevServerConfig,
    state: AppState,
}

impl DevServer {
    /// Assemble the server from validated configuration.
    pub fn new(config: DevServerConfig) -> Result<Self, StartupError> {
        let routes = RouteTable::from_config(&config.routes, Path::new(&config.root_dir))?;
        let flags = BuildFlags::from_config(&config.build);

        let proxy = if flags.is_development() {
            let table = ProxyTable::from_config(&config.proxy).map_err(StartupError::Proxy)?;
            tracing::info!(rules = table.len(), "API proxy enabled");
            Some(Arc::new(DevProxy::new(table)))
        } else {
            tracing::info!("Production mode, API proxy disabled");
            None
        };

        let state = AppState {
            routes: Arc::new(routes),
            loader: ModuleLoader::new(),
            base: BasePath::new(&config.base_path),
            proxy,
        };

        let router = Self::build_router(state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/__devserver/routes", get(list_routes))
            .fallback(dev_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &DevServerConfig {
        &self.config
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// `config_updates` carries reloaded configurations; only their proxy
    /// rules are applied.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<DevServerConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base = %self.state.base.as_str(),
            "Dev server running at http://{}{}",
            addr,
            self.state.base.join("/")
        );

        if let Some(proxy) = self.state.proxy.clone() {
            tokio::spawn(apply_reloads(
                proxy,
                self.config.clone(),
                config_updates,
                shutdown.resubscribe(),
            ));
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("Dev server stopped");
        Ok(())
    }
}

/// Proxy first, then history-mode view serving.
async fn dev_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request = match &state.proxy {
        Some(proxy) => match proxy.intercept(request).await {
            Intercept::Forwarded(response) => return response,
            Intercept::Passthrough(request) => request,
        },
        None => request,
    };

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    serve_view(&state, method, path).await
}

async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteInfo>> {
    Json(state.routes.describe())
}

async fn apply_reloads(
    proxy: Arc<DevProxy>,
    current: DevServerConfig,
    mut updates: mpsc::UnboundedReceiver<DevServerConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                match ProxyTable::from_config(&update.proxy) {
                    Ok(table) => proxy.swap(table),
                    Err(errors) => {
                        tracing::error!(errors = errors.len(), "Reloaded proxy rules invalid, keeping current rules");
                        continue;
                    }
                }
                let routes_changed = update.routes.len() != current.routes.len()
                    || update.routes.iter().zip(&current.routes).any(|(a, b)| {
                        a.path != b.path || a.name != b.name || a.module != b.module
                    });
                if routes_changed || update.base_path != current.base_path {
                    tracing::warn!("Route table or base path changed; restart the dev server to apply");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Config reload task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    fn project_with_views() -> (tempfile::TempDir, DevServerConfig) {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("src/views");
        std::fs::create_dir_all(&views).unwrap();
        std::fs::write(views.join("HomeView.vue"), "<template><h1>Home</h1></template>").unwrap();
        std::fs::write(views.join("Viewer.vue"), "<template><canvas/></template>").unwrap();

        let mut config = DevServerConfig::default();
        config.root_dir = dir.path().to_string_lossy().into_owned();
        (dir, config)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_deep_link_serves_view() {
        let (_dir, config) = project_with_views();
        let server = DevServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/viewer").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-route-name"], "viewer");
        assert!(response.headers().contains_key("x-request-id"));
        assert!(body_text(response).await.contains("<canvas/>"));
        assert!(server.state().loader.is_cached("viewer"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (_dir, config) = project_with_views();
        let server = DevServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_base_path_scopes_views() {
        let (_dir, mut config) = project_with_views();
        config.base_path = "/pointcloud/".into();
        let server = DevServer::new(config).unwrap();

        let inside = server
            .router()
            .oneshot(Request::builder().uri("/pointcloud/viewer").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(inside.status(), StatusCode::OK);

        let outside = server
            .router()
            .oneshot(Request::builder().uri("/viewer").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(outside.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_module_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DevServerConfig::default();
        config.root_dir = dir.path().to_string_lossy().into_owned();
        let server = DevServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("home"));
    }

    #[tokio::test]
    async fn test_route_listing() {
        let (_dir, config) = project_with_views();
        let server = DevServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/__devserver/routes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let routes: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(routes[1]["name"], "viewer");
        assert_eq!(routes[1]["path"], "/viewer");
    }

    #[tokio::test]
    async fn test_production_mode_has_no_proxy() {
        let (_dir, mut config) = project_with_views();
        config.build.mode = crate::config::BuildMode::Production;
        let server = DevServer::new(config).unwrap();
        assert!(server.state().proxy.is_none());

        let response = server
            .router()
            .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_routes_abort_startup() {
        let mut config = DevServerConfig::default();
        config.routes[1].name = "home".into();
        assert!(matches!(DevServer::new(config), Err(StartupError::Routes(_))));
    }

    #[tokio::test]
    async fn test_reload_swaps_proxy_rules() {
        let (_dir, config) = project_with_views();
        let server = DevServer::new(config.clone()).unwrap();
        let proxy = server.state().proxy.clone().unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(apply_reloads(Arc::clone(&proxy), config.clone(), rx, shutdown_rx));

        let mut update = config;
        update.proxy[0].target = "http://127.0.0.1:8100".into();
        tx.send(update).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(proxy.rules().find("/api/x").unwrap().origin(), "http://127.0.0.1:8100");
        drop(shutdown_tx);
    }
}
