//! In-process stand-in for the rate site, used by the pipeline tests.

use std::{
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{Map, Value};

use crate::declare::INSTRUMENTS;

/// 3xx 回應指向的位置，跟過去會拿到一份看似正常的內容
const REDIRECT_PATH: &str = "/elsewhere";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub(crate) struct MockState {
    homepage: (StatusCode, String),
    prices: (StatusCode, String),
    delay_ms: AtomicU64,
    pub homepage_hits: AtomicUsize,
    pub json_hits: AtomicUsize,
    pub redirect_hits: AtomicUsize,
    last_homepage: Mutex<Option<RecordedRequest>>,
    last_json: Mutex<Option<RecordedRequest>>,
}

pub(crate) struct MockSite {
    pub base_uri: String,
    pub state: Arc<MockState>,
}

impl MockSite {
    /// Serves `GET /` and `POST /json` with fixed responses on a random local port.
    ///
    /// A 3xx status is sent with `Location: /elsewhere`.
    pub async fn start(homepage: (StatusCode, &str), prices: (StatusCode, &str)) -> Self {
        let state = Arc::new(MockState {
            homepage: (homepage.0, homepage.1.to_string()),
            prices: (prices.0, prices.1.to_string()),
            delay_ms: AtomicU64::new(0),
            homepage_hits: AtomicUsize::new(0),
            json_hits: AtomicUsize::new(0),
            redirect_hits: AtomicUsize::new(0),
            last_homepage: Mutex::new(None),
            last_json: Mutex::new(None),
        });

        let app = Router::new()
            .route("/", get(serve_homepage))
            .route("/json", post(serve_prices))
            .route(REDIRECT_PATH, get(serve_redirected).post(serve_redirected))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock site");
        let addr = listener.local_addr().expect("mock site address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        MockSite {
            base_uri: format!("http://{}", addr),
            state,
        }
    }

    /// Makes the homepage answer slowly.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        self
    }

    pub fn last_homepage_request(&self) -> Option<RecordedRequest> {
        self.state.last_homepage.lock().ok()?.clone()
    }

    pub fn last_json_request(&self) -> Option<RecordedRequest> {
        self.state.last_json.lock().ok()?.clone()
    }
}

async fn serve_homepage(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.homepage_hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = state.last_homepage.lock() {
        *last = Some(RecordedRequest {
            headers,
            body: String::new(),
        });
    }

    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    respond(&state.homepage)
}

async fn serve_prices(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.json_hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = state.last_json.lock() {
        *last = Some(RecordedRequest { headers, body });
    }

    respond(&state.prices)
}

async fn serve_redirected(State(state): State<Arc<MockState>>) -> Response {
    state.redirect_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        r#"<script>$.post('/json', {param: "redirected"})</script>"#,
    )
        .into_response()
}

fn respond((status, body): &(StatusCode, String)) -> Response {
    let mut res = (*status, body.clone()).into_response();
    if status.is_redirection() {
        res.headers_mut()
            .insert(header::LOCATION, HeaderValue::from_static(REDIRECT_PATH));
    }
    res
}

/// A response carrying every field the instrument table asks for, the way
/// the site sends it: quotes as strings, a few extra bookkeeping fields.
pub(crate) fn full_price_response() -> Map<String, Value> {
    let mut raw = Map::new();

    for (idx, instrument) in INSTRUMENTS.iter().enumerate() {
        let sell = 10_000 + idx as u64 * 100;
        raw.insert(instrument.sell_key.to_string(), Value::from(sell.to_string()));
        if let Some(buy_key) = instrument.buy_key {
            raw.insert(buy_key.to_string(), Value::from((sell - 50).to_string()));
        }
    }

    raw.insert("usd1".to_string(), Value::from(50000));
    raw.insert("usd2".to_string(), Value::from(49500));
    raw.insert("bitcoin".to_string(), Value::from(1_200_000_000u64));
    raw.insert("last_modified".to_string(), Value::from("October 18, 2026"));

    raw
}

/// [`full_price_response`] encoded as the response body.
pub(crate) fn full_price_body() -> String {
    Value::Object(full_price_response()).to_string()
}
