#![allow(clippy::unused_async, clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Each test builds its own in-memory store and router; nothing is
//! shared between tests, so they run in parallel without contention.
//! Authentication runs in single-user mode against a seeded principal.

use std::sync::Arc;

use salvo::Service;
use salvo::http::header::HeaderName;
use salvo::http::{Method, ReqBody, StatusCode};
use salvo::test::{RequestBuilder, ResponseExt, TestClient};

use calcard_app::state::AppState;
use calcard_core::config::{
    AuthConfig, AuthMethod, DavConfig, LoggingConfig, ServerConfig, Settings,
    SingleUserAuthConfig,
};
use calcard_store::{MemoryStore, Store, User};

pub const TEST_EMAIL: &str = "user@example.com";

/// A fully wired application over a fresh store.
pub struct TestApp {
    pub service: Service,
    pub store: Store,
    pub memory: Arc<MemoryStore>,
    pub user: User,
}

/// Builds a test application with one seeded principal.
pub async fn test_app() -> TestApp {
    let (store, memory) = Store::in_memory();
    let user = memory.add_user(TEST_EMAIL);

    let settings = Settings {
        auth: AuthConfig {
            method: AuthMethod::SingleUser,
            single_user: Some(SingleUserAuthConfig {
                email: TEST_EMAIL.to_string(),
            }),
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        dav: DavConfig::default(),
    };

    let state = AppState::new(settings, store.clone()).expect("valid test settings");
    let router = calcard_app::router(state).expect("router builds");

    TestApp {
        service: Service::new(router),
        store,
        memory,
        user,
    }
}

/// A small VEVENT payload used across suites (spec scenario E3).
pub const EV1: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:ev1\r\nDTSTART:20240601T100000Z\r\nDTEND:20240601T110000Z\r\nSUMMARY:Hi\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

pub fn propfind_allprop() -> &'static str {
    r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:allprop/></d:propfind>"#
}

pub fn propfind_current_user_principal() -> &'static str {
    r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:current-user-principal/></d:prop></d:propfind>"#
}

/// Builder for DAV requests, including the extension methods.
pub struct TestRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl TestRequest {
    #[must_use]
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: Method::from_bytes(method.as_bytes()).expect("valid method"),
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    #[must_use]
    pub fn head(path: &str) -> Self {
        Self::new("HEAD", path)
    }

    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new("PUT", path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new("DELETE", path)
    }

    #[must_use]
    pub fn options(path: &str) -> Self {
        Self::new("OPTIONS", path)
    }

    #[must_use]
    pub fn propfind(path: &str) -> Self {
        Self::new("PROPFIND", path)
    }

    #[must_use]
    pub fn proppatch(path: &str) -> Self {
        Self::new("PROPPATCH", path)
    }

    #[must_use]
    pub fn report(path: &str) -> Self {
        Self::new("REPORT", path)
    }

    #[must_use]
    pub fn mkcalendar(path: &str) -> Self {
        Self::new("MKCALENDAR", path)
    }

    #[must_use]
    pub fn mkcol(path: &str) -> Self {
        Self::new("MKCOL", path)
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn depth(self, value: &str) -> Self {
        self.header("Depth", value)
    }

    #[must_use]
    pub fn if_match(self, etag: &str) -> Self {
        self.header("If-Match", etag)
    }

    #[must_use]
    pub fn if_none_match(self, value: &str) -> Self {
        self.header("If-None-Match", value)
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn xml_body(self, xml: &str) -> Self {
        self.header("Content-Type", "application/xml; charset=utf-8")
            .body(xml.as_bytes().to_vec())
    }

    #[must_use]
    pub fn icalendar_body(self, ical: &str) -> Self {
        self.header("Content-Type", "text/calendar")
            .body(ical.as_bytes().to_vec())
    }

    #[must_use]
    pub fn vcard_body(self, vcard: &str) -> Self {
        self.header("Content-Type", "text/vcard")
            .body(vcard.as_bytes().to_vec())
    }

    /// Sends the request and collects the response.
    ///
    /// ## Panics
    /// Panics if the request cannot be built.
    pub async fn send(self, service: &Service) -> TestResponse {
        let url = format!("http://127.0.0.1:5800{}", self.path);

        let mut client = match self.method.as_str() {
            "GET" => TestClient::get(&url),
            "HEAD" => TestClient::head(&url),
            "PUT" => TestClient::put(&url),
            "DELETE" => TestClient::delete(&url),
            "OPTIONS" => TestClient::options(&url),
            _ => RequestBuilder::new(&url, self.method.clone()),
        };

        for (name, value) in self.headers {
            if let Ok(header_name) = HeaderName::try_from(name.as_str()) {
                client = client.add_header(header_name, value, true);
            }
        }

        if let Some(body_bytes) = self.body {
            client = client.body(ReqBody::Once(body_bytes.into()));
        }

        let mut response = client.send(service).await;

        let status = response
            .status_code
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body: Vec<u8> = response.take_bytes(None).await.unwrap_or_default().to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A collected response for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TestResponse {
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "unexpected status; body: {}",
            self.body_string()
        );
    }
}

/// Creates a calendar via MKCALENDAR and returns its id-based
/// collection path (with trailing slash).
pub async fn create_calendar(app: &TestApp, name: &str) -> String {
    let response = TestRequest::mkcalendar(&format!("/dav/calendars/{name}"))
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::CREATED);
    response
        .header("location")
        .expect("MKCALENDAR sets Location")
        .to_string()
}

/// PUTs the standard `ev1` event into a collection path and returns its
/// ETag header value (quoted).
pub async fn put_ev1(app: &TestApp, collection: &str) -> String {
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.header("etag").expect("PUT sets ETag").to_string()
}
