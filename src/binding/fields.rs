//! Request fields captured for templates

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequestParts, OriginalUri, Query, RawPathParams},
    http::{header, request::Parts, Version},
};
use serde_json::{Map, Value};

/// Names of the captured fields, in capture order
pub const REQUEST_FIELDS: [&str; 12] = [
    "body",
    "hostname",
    "domain",
    "protocol",
    "ip",
    "baseUrl",
    "originalUrl",
    "path",
    "query",
    "params",
    "headers",
    "httpVersion",
];

pub(super) async fn capture(parts: &mut Parts, body: &Bytes) -> Map<String, Value> {
    let domain = host_of(parts);
    let original = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.clone())
        .unwrap_or_else(|| parts.uri.clone());
    let original_url = original
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| original.path().to_string());

    let mut fields = Map::new();
    fields.insert("body".to_string(), body_value(body));
    fields.insert(
        "hostname".to_string(),
        domain.as_deref().map(strip_port).map(Value::from).unwrap_or(Value::Null),
    );
    fields.insert(
        "domain".to_string(),
        domain.map(Value::from).unwrap_or(Value::Null),
    );
    fields.insert("protocol".to_string(), Value::from(protocol_of(parts)));
    fields.insert(
        "ip".to_string(),
        client_ip(parts).map(Value::from).unwrap_or(Value::Null),
    );
    fields.insert(
        "baseUrl".to_string(),
        Value::from(base_url(original.path(), parts.uri.path())),
    );
    fields.insert("originalUrl".to_string(), Value::from(original_url));
    fields.insert("path".to_string(), Value::from(parts.uri.path()));
    fields.insert("query".to_string(), query_of(parts));
    fields.insert("params".to_string(), params_of(parts).await);
    fields.insert("headers".to_string(), headers_of(parts));
    fields.insert(
        "httpVersion".to_string(),
        Value::from(http_version(parts.version)),
    );

    fields
}

fn body_value(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Object(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(_) => match std::str::from_utf8(body) {
            Ok(text) => Value::from(text),
            Err(_) => Value::Object(Map::new()),
        },
    }
}

fn host_of(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
}

fn strip_port(host: &str) -> String {
    if let Some(rest) = host.strip_prefix('[') {
        // IPv6 literal
        return rest.split(']').next().unwrap_or(rest).to_string();
    }

    host.split(':').next().unwrap_or(host).to_string()
}

fn protocol_of(parts: &Parts) -> String {
    parts
        .headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| parts.uri.scheme_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "http".to_string())
}

fn client_ip(parts: &Parts) -> Option<String> {
    if let Some(forwarded) = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(forwarded.to_string());
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
}

/// Mount prefix: the original path with the routed path removed from its end
fn base_url(original_path: &str, routed_path: &str) -> String {
    original_path
        .strip_suffix(routed_path)
        .unwrap_or("")
        .trim_end_matches('/')
        .to_string()
}

fn query_of(parts: &Parts) -> Value {
    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    Value::Object(
        query
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect(),
    )
}

async fn params_of(parts: &mut Parts) -> Value {
    let params = match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params,
        Err(_) => return Value::Object(Map::new()),
    };

    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect(),
    )
}

fn headers_of(parts: &Parts) -> Value {
    let mut headers: Map<String, Value> = Map::new();

    for name in parts.headers.keys() {
        let joined = parts
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        headers.insert(name.as_str().to_string(), Value::from(joined));
    }

    Value::Object(headers)
}

fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
