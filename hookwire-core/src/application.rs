// Application bootstrapper and HTTP server

use crate::{Error, HttpRequest, HttpResponse, Router};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// The main application struct
pub struct Application {
    pub router: Arc<Router>,
}

impl Application {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Bind to `addr` and serve until the process is interrupted
    pub async fn listen(self, addr: SocketAddr) -> Result<(), Error> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Server listening");
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve connections from an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let (stream, remote) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    async move { handle_request(req, router, remote).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(%remote, error = %err, "Error serving connection");
                }
            });
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Handle an incoming HTTP request
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
    remote: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();

    let mut request = HttpRequest::new(parts.method, parts.uri.path());
    request.query = parts.uri.query().map(str::to_string);
    request.remote_addr = Some(remote);

    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request
                .headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }

    request.body = body.collect().await?.to_bytes();

    let method = request.method.clone();
    let uri = request.uri();

    let response = match router.route(request).await {
        Ok(resp) => resp,
        Err(err) => {
            if err.is_server_error() {
                warn!(%method, %uri, error = %err, "Handler failed");
            } else if err.is_client_error() {
                debug!(%method, %uri, error = %err, "Request not routed");
            }
            let status = err.status_code();
            HttpResponse::text(status, err.to_string())
        }
    };

    debug!(%method, %uri, status = response.status, "Request handled");

    Ok(into_hyper(response))
}

fn into_hyper(response: HttpResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status);

    for (key, value) in &response.headers {
        builder = builder.header(key, value);
    }

    builder
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|err| {
            warn!(error = %err, "Handler produced an invalid response");
            let mut fallback = Response::new(Full::new(Bytes::from_static(
                b"Internal server error",
            )));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_hyper_copies_status_and_headers() {
        let response = into_hyper(HttpResponse::text(502, "nope"));
        assert_eq!(response.status(), 502);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_into_hyper_rejects_invalid_status() {
        let response = into_hyper(HttpResponse::new(42));
        assert_eq!(response.status(), 500);
    }
}
