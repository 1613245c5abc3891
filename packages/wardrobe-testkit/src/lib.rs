//! In-process HTTP endpoint that replays scripted responses, for provider tests.

mod error;

pub use error::{Error, Result};

use std::{
	collections::{HashMap, VecDeque},
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{
	Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode, Uri, header},
	response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot};

#[derive(Debug, Clone)]
pub struct MockResponse {
	pub status: u16,
	pub body: String,
	pub delay: Option<Duration>,
}
impl MockResponse {
	pub fn json(status: u16, body: &Value) -> Self {
		Self { status, body: body.to_string(), delay: None }
	}

	pub fn text(status: u16, body: impl Into<String>) -> Self {
		Self { status, body: body.into(), delay: None }
	}

	/// Wraps `text` in a generation envelope as the model's message text.
	pub fn generation(text: &str) -> Self {
		Self::json(
			200,
			&serde_json::json!({
				"candidates": [
					{ "content": { "role": "model", "parts": [ { "text": text } ] } }
				]
			}),
		)
	}

	pub fn delayed(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub path: String,
	pub query: Option<String>,
	pub headers: HashMap<String, String>,
	pub body: Value,
}

struct MockState {
	scripted: Mutex<VecDeque<MockResponse>>,
	fallback: MockResponse,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// Serves scripted responses in order, then repeats the fallback.
pub struct MockEndpoint {
	addr: SocketAddr,
	state: Arc<MockState>,
	shutdown: Option<oneshot::Sender<()>>,
}
impl MockEndpoint {
	pub async fn start(scripted: Vec<MockResponse>) -> Result<Self> {
		Self::start_with_fallback(scripted, MockResponse::text(500, "No scripted response left."))
			.await
	}

	pub async fn start_with_fallback(
		scripted: Vec<MockResponse>,
		fallback: MockResponse,
	) -> Result<Self> {
		let state = Arc::new(MockState {
			scripted: Mutex::new(scripted.into()),
			fallback,
			requests: Mutex::new(Vec::new()),
		});
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let app = Router::new().fallback(handle).with_state(state.clone());
		let (tx, rx) = oneshot::channel::<()>();

		tokio::spawn(async move {
			let server = axum::serve(listener, app).with_graceful_shutdown(async move {
				let _ = rx.await;
			});

			if let Err(err) = server.await {
				eprintln!("Mock endpoint stopped with error: {err}.");
			}
		});

		Ok(Self { addr, state, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> String {
		format!("http://{}", self.addr)
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn request_count(&self) -> usize {
		self.state.requests.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}
impl Drop for MockEndpoint {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

async fn handle(
	State(state): State<Arc<MockState>>,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let recorded = RecordedRequest {
		path: uri.path().to_string(),
		query: uri.query().map(str::to_string),
		headers: headers
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
			})
			.collect(),
		body: serde_json::from_slice(&body).unwrap_or(Value::Null),
	};

	state.requests.lock().unwrap_or_else(|err| err.into_inner()).push(recorded);

	let next = state
		.scripted
		.lock()
		.unwrap_or_else(|err| err.into_inner())
		.pop_front()
		.unwrap_or_else(|| state.fallback.clone());

	if let Some(delay) = next.delay {
		tokio::time::sleep(delay).await;
	}

	let status = StatusCode::from_u16(next.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	(status, [(header::CONTENT_TYPE, "application/json")], next.body).into_response()
}
