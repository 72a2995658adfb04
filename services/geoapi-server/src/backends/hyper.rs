//! Hyper backend.
//!
//! Owns its accept loop and reads each body up to [`MAX_BODY_BYTES`]. The
//! collected request is handed whole to a blocking worker thread, where a
//! [`Dispatcher`] for [`Backend::Hyper`] routes and executes it inline.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, Limited};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use geoapi_core::{Api, Backend};

use super::blocking::{self, status_only, Dispatcher};
use super::{exceeds_body_limit, MAX_BODY_BYTES};

/// The hyper server and its route table.
pub struct HyperServer {
    dispatcher: Dispatcher,
}

impl HyperServer {
    pub fn new(api: Arc<Api>) -> anyhow::Result<Self> {
        Ok(Self {
            dispatcher: Dispatcher::new(api, Backend::Hyper)?,
        })
    }

    pub fn api(&self) -> &Api {
        self.dispatcher.api()
    }

    /// Handle one fully read request on the current thread.
    pub fn handle(&self, req: http::Request<Bytes>) -> http::Response<Bytes> {
        self.dispatcher.handle(&req)
    }

    /// Accept connections until a shutdown signal arrives.
    pub async fn serve(self: Arc<Self>, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            addr = %addr,
            prefix = self.api().rules().url_prefix(Backend::Hyper),
            "geoapi listening (hyper)"
        );

        let mut tasks = tokio::task::JoinSet::new();
        let shutdown = super::shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "Draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    let server = Arc::clone(&self);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let server = Arc::clone(&server);
                            async move { server.dispatch(req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            debug!(peer = %peer, error = %e, "Connection closed with error");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}
        info!("geoapi stopped");
        Ok(())
    }

    async fn dispatch(
        self: Arc<Self>,
        req: hyper::Request<hyper::body::Incoming>,
    ) -> Result<http::Response<Full<Bytes>>, Infallible> {
        let (head, body) = req.into_parts();
        let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if exceeds_body_limit(&*e) => {
                debug!(limit = MAX_BODY_BYTES, "Request body too large");
                return Ok(status_only(StatusCode::PAYLOAD_TOO_LARGE).map(Full::new));
            }
            Err(e) => {
                debug!(error = %e, "Failed to read request body");
                return Ok(status_only(StatusCode::BAD_REQUEST).map(Full::new));
            }
        };
        let req = http::Request::from_parts(head, body);

        let response = match tokio::task::spawn_blocking(move || self.handle(req)).await {
            Ok(response) => response,
            Err(e) if e.is_panic() => {
                error!("Request handler panicked");
                blocking::internal_error()
            }
            Err(_) => status_only(StatusCode::SERVICE_UNAVAILABLE),
        };

        Ok(response.map(Full::new))
    }
}
