//! Request routing.
//!
//! `Router` is constructed once, bound to the resolved settings, and shared
//! across connections. Dispatch is a pure function of method, path and query
//! string; any panic inside a handler is caught and mapped to the uniform
//! 500 body so implementation details never reach the client.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::ORIGIN;
use hyper::{Method, Request, Response, StatusCode};

use crate::config::Settings;
use crate::logger::AppLogger;
use crate::response;

pub struct Router {
    settings: Arc<Settings>,
    log: AppLogger,
}

impl Router {
    pub fn new(settings: Arc<Settings>) -> Self {
        let log = AppLogger::from_settings(&settings);
        Self { settings, log }
    }

    /// Handle one request. Generic over the body type because no route ever
    /// reads a request body.
    pub fn handle<B>(&self, req: &Request<B>) -> Response<Full<Bytes>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(ToString::to_string);
        let origin = req
            .headers()
            .get(ORIGIN)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        if let Some(query) = query.as_deref() {
            self.log.debug(&format!("{method} {path} query: {query}"));
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.route(&method, &path, query.as_deref())
        }));
        let (status, body) = outcome.unwrap_or_else(|_| {
            self.log
                .error(&format!("unhandled fault while serving {method} {path}"));
            response::internal_error(&self.settings)
        });

        self.log
            .info(&format!("{method} {path} -> {}", status.as_u16()));
        response::build_json_response(status, body, &self.settings, origin.as_deref())
    }

    fn route(&self, method: &Method, path: &str, query: Option<&str>) -> (StatusCode, String) {
        match path {
            "/" | "/api/hello" | "/health" if *method != Method::GET => {
                self.log.warning(&format!("Method not allowed: {method} {path}"));
                response::method_not_allowed(&self.settings)
            }
            "/" => response::greeting("Hello, World!", &self.settings),
            "/api/hello" => match query_param(query, "name").as_deref() {
                // Reflected verbatim; the value is untrusted client input
                Some(name) if !name.is_empty() => {
                    response::greeting(&format!("Hello, {name}!"), &self.settings)
                }
                _ => response::greeting("Hello, World!", &self.settings),
            },
            "/health" => response::health(&self.settings),
            #[cfg(test)]
            "/boom" => panic!("deliberate fault"),
            _ => response::not_found(&self.settings),
        }
    }
}

/// Extract a query parameter, decoding `+` and percent escapes.
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let query = query?;
    for pair in query.split('&') {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(raw_key) == key {
            return Some(decode_component(raw_value));
        }
    }
    None
}

fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => plus_decoded,
    }
}
