//! Shared fakes for behavior tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockpulse_core::{
    ClientConfig, HttpClient, HttpError, HttpRequest, HttpResponse, ManualClock, MemoryStorage,
    StockDataClient,
};

pub type Outcome = Result<HttpResponse, HttpError>;

type ResponseFuture<'a> = Pin<Box<dyn Future<Output = Outcome> + Send + 'a>>;

/// Answers after `delay` of (tokio) time.
fn respond_after<'a>(delay: Duration, outcome: Outcome) -> ResponseFuture<'a> {
    Box::pin(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    })
}

/// Replays scripted outcomes in order; the last one repeats forever.
/// Every request is recorded.
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<(Duration, Outcome)>>,
    last: Mutex<Option<(Duration, Outcome)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new(script: Vec<Outcome>) -> Self {
        Self::delayed(script.into_iter().map(|outcome| (0, outcome)).collect())
    }

    /// Each outcome arrives after its latency in milliseconds.
    pub fn delayed(script: Vec<(u64, Outcome)>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|(latency_ms, outcome)| (Duration::from_millis(latency_ms), outcome))
                    .collect(),
            ),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(outcome: Outcome) -> Self {
        Self::new(vec![outcome])
    }

    pub fn json(body: &str) -> Self {
        Self::always(Ok(HttpResponse::ok_json(body)))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }

    fn next_step(&self) -> (Duration, Outcome) {
        let mut script = self.script.lock().expect("lock");
        let mut last = self.last.lock().expect("lock");
        if let Some(step) = script.pop_front() {
            *last = Some(step);
        }
        last.clone()
            .unwrap_or_else(|| (Duration::ZERO, Err(HttpError::other("no scripted response"))))
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> ResponseFuture<'a> {
        self.requests.lock().expect("lock").push(request);
        let (delay, outcome) = self.next_step();
        respond_after(delay, outcome)
    }
}

/// Answers by the request's `symbol` parameter.
pub struct RoutedHttpClient {
    routes: HashMap<String, Outcome>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RoutedHttpClient {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, symbol: &str, outcome: Outcome) -> Self {
        self.routes.insert(symbol.to_owned(), outcome);
        self
    }

    pub fn calls_for(&self, symbol: &str) -> usize {
        self.requests
            .lock()
            .expect("lock")
            .iter()
            .filter(|request| request.query_value("symbol") == Some(symbol))
            .count()
    }
}

impl HttpClient for RoutedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> ResponseFuture<'a> {
        let outcome = request
            .query_value("symbol")
            .and_then(|symbol| self.routes.get(symbol).cloned())
            .unwrap_or_else(|| Err(HttpError::other("no route for request")));
        self.requests.lock().expect("lock").push(request);
        respond_after(Duration::ZERO, outcome)
    }
}

pub fn ok(body: &str) -> Outcome {
    Ok(HttpResponse::ok_json(body))
}

pub fn status(code: u16, body: &str) -> Outcome {
    Ok(HttpResponse::new(code, body))
}

pub fn connect_failure() -> Outcome {
    Err(HttpError::connect("connection refused"))
}

pub fn timeout() -> Outcome {
    Err(HttpError::timeout("request timed out"))
}

pub const FREQUENCY_NOTE: &str = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 500 calls per day."}"#;

pub const DAILY_QUOTA_INFORMATION: &str = r#"{"Information": "We have detected your API key as DEMO and our standard API rate limit is 25 requests per day."}"#;

pub const INVALID_KEY_ERROR: &str = r#"{"Error Message": "the parameter apikey is invalid or missing. Please claim your free API key on (https://www.alphavantage.co/support/#api-key)."}"#;

/// A client over in-memory storage with a hand-driven clock.
pub struct Harness<H = ScriptedHttpClient> {
    pub http: Arc<H>,
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<ManualClock>,
    pub client: StockDataClient,
}

impl<H: HttpClient + 'static> Harness<H> {
    pub fn new(http: H) -> Self {
        Self::with_config(http, ClientConfig::default().with_api_key("TESTKEY"))
    }

    pub fn with_config(http: H, config: ClientConfig) -> Self {
        let http = Arc::new(http);
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let client =
            StockDataClient::with_clock(config, http.clone(), storage.clone(), clock.clone());
        Self {
            http,
            storage,
            clock,
            client,
        }
    }
}

/// Paused-clock time since `started` matches `expected_ms` of backoff.
pub fn assert_waited(started: tokio::time::Instant, expected_ms: u64) {
    let elapsed = started.elapsed();
    let expected = std::time::Duration::from_millis(expected_ms);
    assert!(
        elapsed >= expected && elapsed < expected + std::time::Duration::from_millis(100),
        "waited {elapsed:?}, expected {expected:?}"
    );
}
