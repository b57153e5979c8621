mod ext;

use crate::prelude::*;
use async_trait::async_trait;
use std::time::Instant;

pub(crate) mod prelude {
    pub(crate) use super::ext::RequestBuilderExt as _;
}

pub(crate) type Client = reqwest_middleware::ClientWithMiddleware;

/// The client never retries. A failed request is reported to the caller
/// as is.
pub(crate) fn create_client() -> Client {
    reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
        .with(ObservingMiddleware)
        .with_init(|request_builder: reqwest_middleware::RequestBuilder| {
            request_builder.header(
                reqwest::header::USER_AGENT,
                concat!("OrchestraTelegramBot/", env!("CARGO_PKG_VERSION")),
            )
        })
        .build()
}

struct ObservingMiddleware;

#[async_trait]
impl reqwest_middleware::Middleware for ObservingMiddleware {
    async fn handle(
        &self,
        request: reqwest::Request,
        extensions: &mut http::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let span = info_span!(
            "request",
            method = %request.method(),
            url = %request.url(),
        );

        async {
            let method = request.method().to_string();
            let host = request.url().host_str().unwrap_or("{unknown}").to_owned();

            let start = Instant::now();
            let result = next.run(request, extensions).await;
            let elapsed = start.elapsed();

            let status = match &result {
                Ok(response) => response.status().as_u16().to_string(),
                Err(_) => "{fatal}".to_owned(),
            };

            metrics::histogram!(
                "http_request_duration_seconds",
                "method" => method,
                "host" => host,
                "status" => status
            )
            .record(elapsed);

            let duration = tracing_duration(elapsed);

            let response = match &result {
                Ok(response) => response,
                Err(err) => {
                    error!(duration, err = tracing_err(err), "Network request failed");
                    return result;
                }
            };

            let status = response.status();

            if let Err(err) = response.error_for_status_ref() {
                warn!(
                    err = tracing_err(&err),
                    duration,
                    %status,
                    "Network request failed (error status)"
                );
            } else {
                debug!(duration, %status, "Network request succeeded");
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Errors at the layer of the HTTP API
#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpClientError {
    #[error("HTTP request failed")]
    Request { source: reqwest_middleware::Error },

    #[error("Failed to read HTTP response")]
    ReadPayload { source: reqwest::Error },

    #[error("HTTP request has failed (HTTP status code: {status}):\n{body}")]
    BadResponseStatusCode {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Received an unexpected response JSON object")]
    UnexpectedResponseJsonShape { source: serde_json::Error },
}
