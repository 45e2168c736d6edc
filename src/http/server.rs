//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the invocation and health endpoints
//! - Wire up middleware (tracing, body limit)
//! - Bound each invocation by the write timeout
//! - Mark the instance ready, serve, then drain on termination
//! - Run the async forwarder alongside the listener

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    response::{IntoResponse, Response},
    routing::{any, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::chain::{DispatchError, Dispatcher, PendingStore};
use crate::chain::worker::AsyncForwarder;
use crate::config::ChainConfig;
use crate::function::Handler;
use crate::http::health::{health_handler, HEALTH_PATH};
use crate::lifecycle::{Readiness, Shutdown, StartupError};

/// How long a stopped forwarder gets to notice before it is aborted.
const FORWARDER_STOP_GRACE: Duration = Duration::from_millis(100);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub readiness: Arc<Readiness>,
    /// Per-invocation bound; `None` when the write timeout is zero.
    pub write_timeout: Option<Duration>,
}

/// HTTP front end of a chain instance.
pub struct HttpServer {
    router: Router,
    config: Arc<ChainConfig>,
    readiness: Arc<Readiness>,
    pending: Option<Arc<PendingStore>>,
    forwarder: Option<AsyncForwarder>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and handler.
    pub fn new(config: ChainConfig, handler: Arc<dyn Handler>) -> Result<Self, StartupError> {
        let (dispatcher, forwarder) = Dispatcher::new(&config, handler)?;
        let pending = dispatcher.pending();
        let readiness = Arc::new(Readiness::new(config.readiness_marker.clone()));

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            readiness: readiness.clone(),
            write_timeout: config.timeouts.write_limit(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config: Arc::new(config),
            readiness,
            pending,
            forwarder,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ChainConfig, state: AppState) -> Router {
        Router::new()
            .route("/", post(invoke_handler))
            .route("/{*path}", post(invoke_handler))
            .route(HEALTH_PATH, any(health_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.intake.max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn readiness(&self) -> Arc<Readiness> {
        self.readiness.clone()
    }

    /// Outstanding async entries (async mode only).
    pub fn pending(&self) -> Option<Arc<PendingStore>> {
        self.pending.clone()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Serve on `listener` until `termination` resolves, then drain.
    ///
    /// The readiness marker is written before the first connection is
    /// accepted. On termination the instance stops passing health checks,
    /// stops accepting, and waits up to the drain budget for in-flight
    /// requests and queued forwards.
    pub async fn run<F>(self, listener: TcpListener, termination: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = listener.local_addr().map_err(StartupError::Serve)?;
        self.readiness.mark_ready().await?;

        tracing::info!(
            address = %addr,
            forward = ?self.config.forward.address,
            asynchronous = self.config.is_async(),
            input_mode = ?self.config.intake.mode,
            "HTTP server starting"
        );

        let stop_forwarder = Shutdown::new();
        let mut forwarder = self
            .forwarder
            .map(|f| tokio::spawn(f.run(stop_forwarder.subscribe())));

        let accept = Shutdown::new();
        let serve = axum::serve(listener, self.router).with_graceful_shutdown(accept.signalled());
        let mut server = tokio::spawn(async move { serve.await });

        tokio::select! {
            _ = termination => {}
            result = &mut server => {
                tracing::error!("HTTP server exited without a termination signal");
                self.readiness.mark_stopped();
                stop_forwarder.trigger();
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(StartupError::Serve(e)),
                    Err(e) => Err(StartupError::Serve(std::io::Error::other(e))),
                };
            }
        }

        // No deadline when the budget is zero or too large to represent.
        let deadline = self
            .config
            .drain_budget()
            .and_then(|budget| tokio::time::Instant::now().checked_add(budget));
        let draining_since = Instant::now();
        self.readiness.begin_drain();
        accept.trigger();

        match within(deadline, &mut server).await {
            Some(Ok(Ok(()))) => tracing::info!(
                elapsed_ms = draining_since.elapsed().as_millis() as u64,
                "HTTP server drained"
            ),
            Some(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server failed while draining"),
            Some(Err(e)) => tracing::error!(error = %e, "HTTP server task failed while draining"),
            None => {
                tracing::warn!("Drain budget elapsed with requests still in flight");
                server.abort();
            }
        }

        if let Some(handle) = forwarder.as_mut() {
            if within(deadline, &mut *handle).await.is_none() {
                stop_forwarder.trigger();
                if tokio::time::timeout(FORWARDER_STOP_GRACE, &mut *handle).await.is_err() {
                    tracing::warn!("Abandoning in-flight async forward");
                    handle.abort();
                }
            }
        }

        self.readiness.mark_stopped();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Invocation endpoint: decode, handle, forward or enqueue.
async fn invoke_handler(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();

    let dispatch = state.dispatcher.dispatch(request);
    let outcome = match state.write_timeout {
        Some(limit) => tokio::time::timeout(limit, dispatch)
            .await
            .unwrap_or(Err(DispatchError::TimedOut(limit))),
        None => dispatch.await,
    };

    match outcome {
        Ok(reply) => {
            tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Invocation completed"
            );
            reply.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invocation failed");
            e.into_response()
        }
    }
}

/// Await `future` until `deadline`, or indefinitely without one. `None` means
/// the deadline passed first.
async fn within<F: Future>(deadline: Option<tokio::time::Instant>, future: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}
