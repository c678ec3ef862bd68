//! Thin HTTPS client for the external verification endpoints.

use crate::error::VerificationError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, header};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use once_cell::sync::Lazy;
use tokio::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

static CLIENT: Lazy<Client<HttpsConnector<HttpConnector>, Full<Bytes>>> = Lazy::new(|| {
    // Tests reach this without going through main's startup.
    let _ = rustls::crypto::ring::default_provider().install_default();
    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Client::builder(TokioExecutor::new()).build(https)
});

async fn dispatch(req: Request<Full<Bytes>>) -> Result<(hyper::StatusCode, Bytes), VerificationError> {
    let resp = tokio::time::timeout(REQUEST_TIMEOUT, CLIENT.request(req))
        .await
        .map_err(|_| VerificationError::Network(format!("timeout after {REQUEST_TIMEOUT:?}")))?
        .map_err(|e| VerificationError::Network(e.to_string()))?;
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| VerificationError::Network(e.to_string()))?
        .to_bytes();
    if !status.is_success() {
        return Err(VerificationError::Http {
            status,
            context: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok((status, body))
}

/// POST a JSON payload and parse the JSON response body.
pub async fn post_json(
    url: &str,
    payload: &serde_json::Value,
) -> Result<serde_json::Value, VerificationError> {
    let body = serde_json::to_vec(payload).map_err(|e| VerificationError::Json(e.to_string()))?;
    let req = Request::builder()
        .method(Method::POST)
        .uri(url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(Full::new(Bytes::from(body)))
        .map_err(|e| VerificationError::InvalidUri(e.to_string()))?;
    let (_, bytes) = dispatch(req).await?;
    serde_json::from_slice(&bytes).map_err(|e| VerificationError::Json(e.to_string()))
}

/// GET a URL and return the response body as text.
pub async fn get_text(url: &str) -> Result<String, VerificationError> {
    let req = Request::builder()
        .method(Method::GET)
        .uri(url)
        .body(Full::new(Bytes::new()))
        .map_err(|e| VerificationError::InvalidUri(e.to_string()))?;
    let (_, bytes) = dispatch(req).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
