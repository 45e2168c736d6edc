//! Shared utilities for chain integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use function_chain::chain::PendingStore;
use function_chain::lifecycle::{Readiness, StartupError};
use function_chain::{ChainConfig, Handler, HandlerError, HttpServer};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;

/// One upload observed by the mock next hop.
#[derive(Debug, Clone)]
pub struct Received {
    pub field: String,
    pub filename: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct HopState {
    tx: mpsc::UnboundedSender<Received>,
    gate: Arc<Semaphore>,
    status: StatusCode,
    content_type: &'static str,
}

/// A programmable next hop that records every multipart upload.
pub struct MockHop {
    pub addr: SocketAddr,
    pub received: mpsc::UnboundedReceiver<Received>,
    gate: Arc<Semaphore>,
}

impl MockHop {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Let held responses through.
    pub fn release(&self) {
        self.gate.add_permits(1_000);
    }

    /// Wait for the next recorded upload.
    pub async fn next(&mut self) -> Received {
        tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("next hop received nothing in time")
            .expect("next hop channel closed")
    }
}

/// Start a next hop answering `status` with `content_type` and a body of
/// `relayed:` followed by the uploaded bytes. When `gated`, responses are
/// held until `release` is called; uploads are recorded on arrival.
pub async fn start_next_hop(status: StatusCode, content_type: &'static str, gated: bool) -> MockHop {
    let (tx, received) = mpsc::unbounded_channel();
    let gate = Arc::new(Semaphore::new(if gated { 0 } else { Semaphore::MAX_PERMITS }));

    let state = HopState {
        tx,
        gate: gate.clone(),
        status,
        content_type,
    };
    let app = Router::new().route("/", post(hop_handler)).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockHop { addr, received, gate }
}

async fn hop_handler(State(state): State<HopState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut body = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default().to_vec();
        body = bytes.clone();
        let _ = state.tx.send(Received {
            field: name,
            filename,
            body: bytes,
        });
    }

    if let Ok(permit) = state.gate.acquire().await {
        permit.forget();
    }

    let mut reply = b"relayed:".to_vec();
    reply.extend_from_slice(&body);
    (state.status, [(CONTENT_TYPE, state.content_type)], reply)
}

/// An address nothing listens on.
pub async fn unreachable_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

pub fn marker_path() -> PathBuf {
    std::env::temp_dir().join(format!("function-chain-test-{}.lock", uuid::Uuid::now_v7().simple()))
}

/// Terminal, raw-body config with generous timeouts and a private marker.
pub fn test_config() -> ChainConfig {
    let mut config = ChainConfig::default();
    config.bind_address = "127.0.0.1:0".into();
    config.readiness_marker = marker_path();
    config.timeouts.read = Duration::from_secs(10);
    config.timeouts.write = Duration::from_secs(30);
    config
}

/// Handler that records its inputs and prefixes its output with `handled:`.
pub fn recording_handler() -> (Arc<dyn Handler>, Arc<Mutex<Vec<Vec<u8>>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let handler = move |input: &[u8]| -> Result<Vec<u8>, HandlerError> {
        log.lock().unwrap().push(input.to_vec());
        let mut out = b"handled:".to_vec();
        out.extend_from_slice(input);
        Ok(out)
    };
    (Arc::new(handler), seen)
}

pub fn uppercase_handler() -> Arc<dyn Handler> {
    Arc::new(|input: &[u8]| -> Result<Vec<u8>, HandlerError> { Ok(input.to_ascii_uppercase()) })
}

/// A chain instance running on its own listener.
pub struct RunningChain {
    pub addr: SocketAddr,
    pub readiness: Arc<Readiness>,
    pub pending: Option<Arc<PendingStore>>,
    stop: Option<oneshot::Sender<()>>,
    pub task: JoinHandle<Result<(), StartupError>>,
}

impl RunningChain {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn health_url(&self) -> String {
        format!("http://{}/_/health", self.addr)
    }

    /// Deliver the termination signal.
    pub fn terminate(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Deliver the termination signal and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<(), StartupError> {
        self.terminate();
        tokio::time::timeout(Duration::from_secs(40), self.task)
            .await
            .expect("server stopped in time")
            .expect("server task joined")
    }
}

pub async fn start_chain(config: ChainConfig, handler: Arc<dyn Handler>) -> RunningChain {
    let listener = TcpListener::bind(&config.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, handler).expect("server builds");
    let readiness = server.readiness();
    let pending = server.pending();

    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(server.run(listener, async move {
        let _ = stopped.await;
    }));

    wait_until(|| readiness.is_accepting()).await;

    RunningChain {
        addr,
        readiness,
        pending,
        stop: Some(stop),
        task,
    }
}

/// Poll `condition` every 10ms for up to 5s.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// A multipart form carrying `content` under `field` with `filename`.
pub fn upload(field: &'static str, filename: &str, content: &[u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name(filename.to_string());
    reqwest::multipart::Form::new().part(field, part)
}
