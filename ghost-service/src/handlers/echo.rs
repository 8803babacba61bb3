use crate::models::EchoResponse;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    Json,
};
use std::collections::BTreeMap;

/// Reflect the request back as JSON, for checking what a proxy or browser
/// actually sends.
pub async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<EchoResponse> {
    Json(EchoResponse {
        ok: true,
        method: method.to_string(),
        url: uri.to_string(),
        headers: flatten_headers(&headers),
        raw_body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Lower-cased names; repeated headers are joined with `", "`.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    flat
}
