// SPDX-License-Identifier: GPL-3.0-only

//! HTTP endpoint serving the text exposition.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::registry::CollectorRegistry;

const HTML: &str = "text/html; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";

pub struct MetricsEndpoint {
    registry: Arc<CollectorRegistry>,
    metrics_path: String,
}

impl MetricsEndpoint {
    pub fn new(registry: Arc<CollectorRegistry>, metrics_path: impl Into<String>) -> Self {
        Self {
            registry,
            metrics_path: metrics_path.into(),
        }
    }

    fn landing_page(&self) -> String {
        format!(
            "<html>\n<head><title>NFS-Ganesha Exporter</title></head>\n<body>\n\
             <h1>NFS-Ganesha Exporter</h1>\n\
             <p><a href=\"{path}\">{path}</a></p>\n</body>\n</html>\n",
            path = self.metrics_path
        )
    }

    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>> {
        let path = request.uri().path();
        let readable = matches!(*request.method(), Method::GET | Method::HEAD);

        if path == self.metrics_path {
            if !readable {
                return method_not_allowed();
            }
            return match self.registry.render().await {
                Ok(body) => respond(StatusCode::OK, prometheus::TEXT_FORMAT, body),
                Err(err) => {
                    tracing::error!(%err, "Failed to render metrics");
                    respond(StatusCode::INTERNAL_SERVER_ERROR, PLAIN, err.to_string())
                }
            };
        }

        if path == "/" {
            if !readable {
                return method_not_allowed();
            }
            return respond(StatusCode::OK, HTML, self.landing_page());
        }

        respond(StatusCode::NOT_FOUND, PLAIN, "404 page not found\n")
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = respond(StatusCode::METHOD_NOT_ALLOWED, PLAIN, "405 method not allowed\n");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

/// Accepts connections until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    endpoint: Arc<MetricsEndpoint>,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Metrics endpoint stopped");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!(%err, "Failed to accept connection");
                        continue;
                    }
                };

                let endpoint = Arc::clone(&endpoint);
                tokio::spawn(async move {
                    let service = service_fn(move |request| {
                        let endpoint = Arc::clone(&endpoint);
                        async move { Ok::<_, Infallible>(endpoint.handle(request).await) }
                    });
                    if let Err(err) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        tracing::debug!(%peer, %err, "HTTP connection ended with error");
                    }
                });
            }
        }
    }
}
