//! # Common Test Utilities
//!
//! This module centralizes the test harness used across the `goldsql-server`
//! integration tests.
//!
//! - `TestApp`: A full application harness that spawns a real server on a random port,
//!   backed by a temporary SQLite database and an OpenAI-compatible backend
//!   mocked with `httpmock`. This is ideal for E2E tests of API endpoints.
//! - `TestApp::spawn_with_state`: Spawns the router around an already built
//!   `AppState`, for tests that inject their own collaborators.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use goldsql_server::{
    config, router,
    state::{build_app_state, AppState},
};
use axum::serve;
use httpmock::MockServer;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::{fs::File, io::Write, net::SocketAddr, path::PathBuf};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

/// The model name configured for the mocked backend.
pub const MOCK_MODEL: &str = "mock-gpt";
/// The path the mocked backend serves chat completions on.
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

// --- Full Application Test Harness ---

/// A harness for end-to-end testing of the Axum server.
///
/// This struct spawns the server on a random available port, sets up a temporary
/// SQLite database, and configures the `AppState` to use an OpenAI-compatible
/// provider pointed at an `httpmock::MockServer` instance.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _db_file: Option<NamedTempFile>,
    _config_dir: Option<TempDir>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        let mock_server = MockServer::start();
        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        println!("[TestApp::spawn] CONFIGURING with DB path: {db_path:?}");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
providers:
  mock_openai:
    provider: "openai"
    api_url: "{}"
    api_key: "test-key"
    model_name: "{MOCK_MODEL}"
generation:
  provider: "mock_openai"
  max_examples: 2
rate_limit:
  max_requests: 100
  window_secs: 60
"#,
            db_path.to_str().unwrap(),
            mock_server.url(COMPLETIONS_PATH),
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config).await?;

        let mut app = TestApp::spawn_with_state(app_state, mock_server).await?;
        app._db_file = Some(db_file);
        app._config_dir = Some(config_dir);
        Ok(app)
    }

    pub async fn spawn_with_state(app_state: AppState, mock_server: MockServer) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let db_path = PathBuf::from(&app_state.config.db_url);
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            db_path,
            app_state: app_state_for_harness,
            _db_file: None,
            _config_dir: None,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Posts a generation request as the guest user.
    pub async fn generate(&self, question: &str, db_type: &str) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}/generate", self.address))
            .json(&json!({ "question": question, "db_type": db_type }))
            .send()
            .await?)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// The body of a successful OpenAI chat completion carrying `content`.
pub fn completion_body(content: &str) -> Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}
