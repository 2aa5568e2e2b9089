//! HTTP binding around `compile`: `POST /compile` with a `{"code": "..."}`
//! body, served through `lambda_http` by the `teenyc-serve` binary.

use lambda_http::{
    http::{header, Method, StatusCode},
    Body, Error as LambdaError, Request, Response,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::compile;

/// Largest request body accepted by `/compile`.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Top-level request dispatcher used by the Lambda runtime.
pub async fn handle_http(event: Request) -> Result<Response<Body>, LambdaError> {
    let path = event.uri().path();
    let response = match (event.method().clone(), path) {
        (Method::POST, "/compile") => compile_route(event.body()),
        (Method::OPTIONS, "/compile") => preflight(),
        (_, "/compile") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "Method not allowed" }),
        ),
        _ => json_response(StatusCode::NOT_FOUND, json!({ "error": "Unsupported route" })),
    };
    Ok(response)
}

fn compile_route(body: &Body) -> Response<Body> {
    let bytes: &[u8] = match body {
        Body::Empty => &[],
        Body::Text(text) => text.as_bytes(),
        Body::Binary(data) => data.as_slice(),
    };
    debug!(length = bytes.len(), "received compile request");

    if bytes.len() > MAX_BODY_BYTES {
        return json_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "error": format!("Request body exceeds {} bytes", MAX_BODY_BYTES) }),
        );
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(request) => {
            let (status, body) = handle_request(&request);
            json_response(status, body)
        }
        Err(e) => {
            warn!(error = %e, "failed to parse request body");
            json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid JSON: {}", e) }),
            )
        }
    }
}

/// Handles a decoded `{"code": "..."}` request.
///
/// Returns 200 with `c_code` and `ast`, 400 when no code was sent, or 500
/// with the compiler's message.
pub fn handle_request(request: &Value) -> (StatusCode, Value) {
    let source = match request.get("code").and_then(Value::as_str) {
        Some(code) if !code.is_empty() => code,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No code provided" }),
            )
        }
    };

    match compile(source) {
        Ok(compilation) => {
            info!(bytes = compilation.c_code.len(), "compiled request");
            (
                StatusCode::OK,
                json!({ "c_code": compilation.c_code, "ast": compilation.ast }),
            )
        }
        Err(e) => {
            error!(error = %e, "compilation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string() }),
            )
        }
    }
}

fn preflight() -> Response<Body> {
    cors(Response::builder().status(StatusCode::NO_CONTENT))
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "content-type")
        .body(Body::Empty)
        .unwrap_or_else(|_| Response::new(Body::Empty))
}

fn cors(builder: lambda_http::http::response::Builder) -> lambda_http::http::response::Builder {
    builder.header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
}

fn json_response(status: StatusCode, value: Value) -> Response<Body> {
    let body = value.to_string();

    if status.is_server_error() {
        error!(http_status = status.as_u16(), "returning server error response");
    } else if status.is_client_error() {
        warn!(http_status = status.as_u16(), "returning client error response");
    }

    cors(Response::builder().status(status))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::Text(body))
        .unwrap_or_else(|_| Response::new(Body::Empty))
}
