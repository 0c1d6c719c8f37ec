use serde_json::{json, Map, Value};

use crate::http::{HttpRequest, HttpResponse};

const JSON: &str = "application/json";

fn json_response(status: u16, reason_phrase: &str, value: &Value) -> HttpResponse {
    // Serializing a `Value` cannot fail.
    let body = serde_json::to_vec_pretty(value).unwrap_or_default();
    HttpResponse::with_body(status, reason_phrase, JSON, body)
}

/// Handle GET request to "/get"
///
/// Describes the request back to the caller: the `query` parameter, the
/// request headers as the client spelled them, the client address, and
/// the URL on the address the server accepted the connection on.
pub fn handle_get_echo(request: &HttpRequest) -> HttpResponse {
    let query = request.query_param("query").unwrap_or_default();

    let headers: Map<String, Value> = request
        .headers
        .as_sent()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();

    let origin = request
        .peer_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default();
    let host = match request.local_addr {
        Some(addr) => addr.to_string(),
        None => request.headers.get("Host").unwrap_or("localhost").to_string(),
    };

    let body = json!({
        "args": { "query": query },
        "headers": headers,
        "origin": origin,
        "url": format!("http://{}{}", host, request.uri),
    });

    json_response(200, "OK", &body)
}

/// Handle POST request to "/post"
///
/// Echoes a JSON body back wrapped in a status envelope.
pub fn handle_post_echo(request: &HttpRequest) -> HttpResponse {
    match serde_json::from_slice::<Value>(&request.body) {
        Ok(received) => json_response(
            200,
            "OK",
            &json!({ "status": "success", "received": received }),
        ),
        Err(e) => {
            log::debug!("Rejecting POST body: {}", e);
            json_response(400, "Bad Request", &json!({ "error": "Invalid JSON" }))
        }
    }
}
