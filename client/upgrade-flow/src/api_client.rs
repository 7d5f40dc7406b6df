//! Shared HTTP client for backend calls.

use std::time::Duration;

use bytes::Bytes;
use common_utils::{consts, CustomResult};
use domain_types::errors::ApiClientError;
use error_stack::{report, ResultExt};
use once_cell::sync::OnceCell;
use secrecy::{ExposeSecret, SecretString};
use tracing::field::Empty;

/// Ambient timeout inherited by every backend request that does not manage
/// its own deadline (order create, capture, subscription fetch).
pub const AMBIENT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: u16,
    pub body: Bytes,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

fn get_client() -> CustomResult<&'static reqwest::Client, ApiClientError> {
    HTTP_CLIENT.get_or_try_init(|| {
        reqwest::Client::builder()
            .timeout(AMBIENT_HTTP_TIMEOUT)
            .build()
            .change_context(ApiClientError::ClientConstructionFailed)
    })
}

/// Issue one backend request and hand back the raw response for the caller
/// to interpret. 4xx statuses are returned as responses (callers decide what
/// a rejection means); 5xx statuses are mapped to transport-level errors the
/// way upstream gateways report them.
pub async fn call_backend_api(
    method: Method,
    url: &str,
    bearer_token: Option<&SecretString>,
    body: Option<serde_json::Value>,
) -> CustomResult<Response, ApiClientError> {
    let span = tracing::info_span!(
        "hisab_outgoing_api",
        url = %url,
        status_code = Empty,
        latency = Empty,
    );
    let _enter = span.enter();
    let start = tokio::time::Instant::now();

    let parsed_url = reqwest::Url::parse(url).change_context(ApiClientError::UrlEncodingFailed)?;
    let client = get_client()?;

    let mut request = match method {
        Method::Get => client.get(parsed_url),
        Method::Post => client.post(parsed_url),
    };
    request = request.header(consts::X_CLIENT_PLATFORM, "mobile");
    if let Some(token) = bearer_token {
        request = request.bearer_auth(token.expose_secret());
    }
    if let Some(payload) = body {
        request = request.json(&payload);
    }

    let response = request.send().await.map_err(|error| {
        if error.is_timeout() {
            report!(ApiClientError::RequestTimeoutReceived)
        } else {
            report!(ApiClientError::RequestNotSent(url.to_string()))
        }
    })?;

    let status_code = response.status().as_u16();
    tracing::Span::current().record("status_code", status_code);
    tracing::Span::current().record("latency", start.elapsed().as_millis() as u64);

    match status_code {
        408 => Err(report!(ApiClientError::RequestTimeoutReceived)),
        500 | 501 | 505..=511 => Err(report!(ApiClientError::InternalServerErrorReceived)),
        502 => Err(report!(ApiClientError::BadGatewayReceived)),
        503 => Err(report!(ApiClientError::ServiceUnavailableReceived)),
        504 => Err(report!(ApiClientError::GatewayTimeoutReceived)),
        _ => {
            let body = response
                .bytes()
                .await
                .change_context(ApiClientError::ResponseDecodingFailed)?;
            Ok(Response { status_code, body })
        }
    }
}
