// Application bootstrapper and HTTP server

use crate::{Error, HttpRequest, HttpResponse, Router, ServerConfig};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

/// The running application: a wired router behind an HTTP/1 server
pub struct Application {
    pub router: Arc<Router>,
}

impl Application {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Start the HTTP server on the configured address.
    pub async fn listen(self, config: &ServerConfig) -> Result<(), Error> {
        let listener = TcpListener::bind(config.address()).await?;
        tracing::info!(address = %config.address(), "Server listening");

        let router = self.router.clone();

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    async move { handle_request(req, router).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!(error = ?err, "Error serving connection");
                }
            });
        }
    }
}

/// Handle an incoming HTTP request
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut request = HttpRequest::new(method.clone(), path.clone());

    // hyper stores header names lowercased already
    for (name, value) in req.headers() {
        if let Ok(value_str) = value.to_str() {
            request
                .headers
                .insert(name.to_string(), value_str.to_string());
        }
    }

    // Correlation id: honor an upstream one, mint otherwise
    let request_id = request
        .header("x-request-id")
        .cloned()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let body_bytes = req.collect().await?.to_bytes();
    request.body = body_bytes.to_vec();

    let span = tracing::info_span!("request", request_id = %request_id, method = %method, path = %path);
    let response = router.dispatch(request).instrument(span).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status,
        duration_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );

    Ok(to_hyper_response(response))
}

fn to_hyper_response(response: HttpResponse) -> Response<Full<bytes::Bytes>> {
    let mut builder = Response::builder().status(response.status);

    for (key, value) in response.headers {
        builder = builder.header(key, value);
    }

    let body = Full::new(bytes::Bytes::from(response.body));
    builder.body(body).unwrap_or_else(|err| {
        tracing::error!(error = ?err, "Failed to build response, replacing with 500");
        let mut fallback = Response::new(Full::new(bytes::Bytes::new()));
        *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hyper_response_carries_status_and_headers() {
        let response = HttpResponse::ok()
            .with_json(&serde_json::json!({"ok": true}))
            .unwrap();
        let converted = to_hyper_response(response);
        assert_eq!(converted.status(), http::StatusCode::OK);
        assert_eq!(
            converted.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_invalid_header_falls_back_to_500() {
        let response =
            HttpResponse::ok().with_header("bad header name".to_string(), "x".to_string());
        let converted = to_hyper_response(response);
        assert_eq!(
            converted.status(),
            http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
