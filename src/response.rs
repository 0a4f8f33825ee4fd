//! JSON response construction.
//!
//! Every response the service emits goes through `build_json_response`:
//! content type is always `application/json`, and CORS headers are applied
//! according to the resolved settings. Body rendering honors the
//! pretty-print and key-sort flags.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, VARY,
};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::{CorsOrigins, Settings};

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: &'static str,
}

pub fn greeting(message: &str, settings: &Settings) -> (StatusCode, String) {
    let body = Greeting {
        message: message.to_string(),
        status: "success",
    };
    (StatusCode::OK, render_json(&body, settings))
}

/// Health body with a fresh UTC timestamp, RFC 3339 with offset.
pub fn health(settings: &Settings) -> (StatusCode, String) {
    let body = HealthStatus {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, render_json(&body, settings))
}

pub fn not_found(settings: &Settings) -> (StatusCode, String) {
    let body = ErrorBody {
        error: "Not Found",
        message: "The requested resource was not found",
    };
    (StatusCode::NOT_FOUND, render_json(&body, settings))
}

pub fn method_not_allowed(settings: &Settings) -> (StatusCode, String) {
    let body = ErrorBody {
        error: "Method Not Allowed",
        message: "The method is not allowed for the requested URL",
    };
    (StatusCode::METHOD_NOT_ALLOWED, render_json(&body, settings))
}

pub fn internal_error(settings: &Settings) -> (StatusCode, String) {
    let body = ErrorBody {
        error: "Internal Server Error",
        message: "An unexpected error occurred",
    };
    (StatusCode::INTERNAL_SERVER_ERROR, render_json(&body, settings))
}

/// Serialize a body honoring `json_sort_keys` and
/// `jsonify_prettyprint_regular`. Without key sorting, struct field order is
/// the wire order; with it, the value is re-serialized through
/// `serde_json::Value`, whose map keeps keys sorted.
pub fn render_json<T: Serialize>(body: &T, settings: &Settings) -> String {
    let rendered = if settings.json_sort_keys {
        serde_json::to_value(body).and_then(|value| {
            if settings.jsonify_prettyprint_regular {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            }
        })
    } else if settings.jsonify_prettyprint_regular {
        serde_json::to_string_pretty(body)
    } else {
        serde_json::to_string(body)
    };

    rendered.unwrap_or_else(|_| String::from("{}"))
}

/// Wrap a rendered body in a response. `origin` is the request's `Origin`
/// header. Since credentials are allowed, an allow-all policy echoes the
/// request origin rather than sending the literal `*` (browsers reject
/// `*` combined with credentials); `*` is only sent when the request
/// carries no origin.
pub fn build_json_response(
    status: StatusCode,
    body: String,
    settings: &Settings,
    origin: Option<&str>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json");

    if settings.cors_enabled {
        builder = builder.header(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
        match (&settings.cors_origins, origin) {
            (CorsOrigins::Any, Some(origin)) => {
                builder = builder
                    .header(ACCESS_CONTROL_ALLOW_ORIGIN, origin)
                    .header(VARY, "Origin");
            }
            (CorsOrigins::Any, None) => {
                builder = builder.header(ACCESS_CONTROL_ALLOW_ORIGIN, "*");
            }
            (CorsOrigins::List(_), Some(origin)) if settings.cors_origins.allows(origin) => {
                builder = builder
                    .header(ACCESS_CONTROL_ALLOW_ORIGIN, origin)
                    .header(VARY, "Origin");
            }
            (CorsOrigins::List(_), _) => {}
        }
    }

    builder
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(Bytes::from(
                r#"{"error":"Internal Server Error","message":"An unexpected error occurred"}"#,
            )));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}
