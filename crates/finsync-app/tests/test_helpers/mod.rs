#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use finsync::{ClientParts, FinanceClient};
use finsync_domain::storage::KeyValueStore;
use finsync_infrastructure::config::FinanceConfig;
use finsync_infrastructure::http::{AccessToken, ApiClient};
use finsync_infrastructure::persistence::MemoryKeyValueStore;
use finsync_infrastructure::security::TokenVault;

use finsync::application::session::HttpAuthGateway;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: String,
    pub disposition: Option<String>,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            disposition: None,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn file(content_type: &str, disposition: Option<&str>, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            disposition: disposition.map(str::to_string),
            body: body.to_vec(),
        }
    }
}

type Routes = Arc<Mutex<HashMap<String, VecDeque<CannedResponse>>>>;

/// HTTP/1.1 stub routing on `METHOD /path` (query ignored). Each route
/// answers its queued responses in order and then repeats the last one.
pub struct StubServer {
    pub base_url: Url,
    routes: Routes,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (served_routes, recorded) = (routes.clone(), requests.clone());
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = served_routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    serve_one(stream, routes, recorded).await;
                });
            }
        });

        Self {
            base_url: Url::parse(&format!("http://{}/api/v1", addr)).expect("url"),
            routes,
            requests,
        }
    }

    /// `path` is relative to the API root, e.g. `/transactions`
    pub fn route(&self, method: &str, path: &str, response: CannedResponse) -> &Self {
        let key = format!("{} /api/v1{}", method, path);
        self.routes
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        let full = format!("/api/v1{}", path);
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path() == full)
            .count()
    }

    /// Wait until `method path` has been hit `expected` times
    pub async fn wait_for(&self, method: &str, path: &str, expected: usize) {
        for _ in 0..200 {
            if self.count(method, path) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "{} {} hit {} time(s), expected {}",
            method,
            path,
            self.count(method, path),
            expected
        );
    }

    pub fn config(&self) -> FinanceConfig {
        FinanceConfig {
            api_base_url: self.base_url.clone(),
            ..FinanceConfig::default()
        }
    }
}

pub struct TestClient {
    pub finance: FinanceClient,
    pub kv: Arc<MemoryKeyValueStore>,
}

/// Client over an in-memory store, talking to `server`
pub fn build_client(server: &StubServer) -> TestClient {
    let config = server.config();
    let client = ApiClient::new(config.api_base_url.clone(), AccessToken::new(), &config.timeouts)
        .expect("create client");
    let kv = Arc::new(MemoryKeyValueStore::new());
    let finance = FinanceClient::from_parts(ClientParts {
        config,
        gateway: Arc::new(HttpAuthGateway::new(client.clone())),
        client,
        kv_store: kv.clone() as Arc<dyn KeyValueStore>,
        tokens: Arc::new(TokenVault::plain(kv.clone())),
    });
    TestClient { finance, kv }
}

pub const USER_JSON: &str = r#"{"id":1,"email":"ana@example.com","name":"Ana"}"#;

pub fn sign_in_ok(token: &str) -> CannedResponse {
    CannedResponse::json(
        200,
        &format!(
            r#"{{"success":true,"data":{{"user":{},"token":"{}"}}}}"#,
            USER_JSON, token
        ),
    )
}

pub fn transaction_json(id: u32, kind: &str, amount: &str, date: &str, category: Option<&str>) -> String {
    let category = match category {
        Some(name) => format!(r##"{{"id":"{0}","name":"{0}","color":"#abcdef"}}"##, name),
        None => "null".to_string(),
    };
    format!(
        r#"{{"id":{},"description":"tx {}","amount":"{}","type":"{}","date":"{}","category":{}}}"#,
        id, id, amount, kind, date, category
    )
}

pub fn list_json(items: &[String], current_page: u32, total_pages: u32) -> String {
    format!(
        r#"{{"success":true,"data":[{}],"meta":{{"pagination":{{"current_page":{},"total_pages":{},"total_count":{},"per_page":20}}}}}}"#,
        items.join(","),
        current_page,
        total_pages,
        items.len()
    )
}

async fn serve_one(
    mut stream: TcpStream,
    routes: Routes,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    let request = RecordedRequest {
        method,
        target,
        body,
    };
    let key = format!("{} {}", request.method, request.path());
    recorded.lock().unwrap().push(request);

    let response = {
        let mut routes = routes.lock().unwrap();
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
    }
    .unwrap_or_else(|| CannedResponse::json(404, r#"{"error":"no route"}"#));

    let mut out = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\n",
        response.status, response.content_type
    );
    if let Some(disposition) = &response.disposition {
        out.push_str(&format!("Content-Disposition: {}\r\n", disposition));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        response.body.len()
    ));
    let _ = stream.write_all(out.as_bytes()).await;
    let _ = stream.write_all(&response.body).await;
    let _ = stream.shutdown().await;
}
