//! HTTP transport with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the lifecycle drain signal fires.
//! The separation lets the binary wire other transports between `start()`
//! and `serve()`.

use std::sync::Arc;
use std::time::Instant;

use axum::http::header::HeaderName;
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::network::config::NetworkConfig;
use crate::network::handlers::{
    create_container_handler, dispose_container_handler, execute_handler, health_handler,
    list_containers_handler, liveness_handler, readiness_handler, server_info_handler,
    start_container_handler, stop_container_handler, task_query_handler, AppState,
};
use crate::network::shutdown::Lifecycle;
use crate::query::TaskQueryService;
use crate::service::{RequestRouter, ServerAdmin};

/// Manages the HTTP server lifecycle: `new` -> `start` -> `serve`.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        router: Arc<RequestRouter>,
        admin: Arc<ServerAdmin>,
        tasks: Arc<TaskQueryService>,
    ) -> Self {
        let state = AppState {
            router,
            admin,
            tasks,
            lifecycle: Arc::new(Lifecycle::new()),
            start_time: Instant::now(),
        };
        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Shared lifecycle controller, for signal handlers and other
    /// transports.
    #[must_use]
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.state.lifecycle)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health`, `GET /health/live`, `GET /health/ready`
    /// - `GET /server` -- server info
    /// - `GET /containers` -- list containers
    /// - `PUT /containers/{id}` / `DELETE /containers/{id}` -- deploy/undeploy
    /// - `POST /containers/{id}` -- execute
    /// - `POST /containers/{id}/start` / `.../stop` -- status toggles
    /// - `GET /queries/tasks` -- task listing
    #[must_use]
    pub fn build_router(&self) -> Router {
        let x_request_id = HeaderName::from_static("x-request-id");

        // Outermost to innermost: request-id, trace, compression, CORS,
        // timeout, request-id propagation.
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(build_cors_layer(&self.config.cors_origins))
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(PropagateRequestIdLayer::new(x_request_id));

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/server", get(server_info_handler))
            .route("/containers", get(list_containers_handler))
            .route(
                "/containers/{container_id}",
                put(create_container_handler)
                    .delete(dispose_container_handler)
                    .post(execute_handler),
            )
            .route(
                "/containers/{container_id}/start",
                post(start_container_handler),
            )
            .route(
                "/containers/{container_id}/stop",
                post(stop_container_handler),
            )
            .route("/queries/tasks", get(task_query_handler))
            .layer(layers)
            .with_state(self.state.clone())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until the lifecycle drain signal fires, then drains
    /// gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error when `start()` was not called first or the server
    /// fails while serving.
    pub async fn serve(mut self) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("serve() called before start()"))?;
        let router = self.build_router();

        let mut drain = self.state.lifecycle.subscribe();
        self.state.lifecycle.set_serving();
        info!("server accepting requests");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = drain.changed().await;
                info!("drain signal received, shutting down");
            })
            .await?;
        Ok(())
    }
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
