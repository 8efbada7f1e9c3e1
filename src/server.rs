//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to shut down gracefully: a request in
//!    flight is answered, an idle keep-alive connection is closed.
//! 3. Waits for those connection tasks, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::Error;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// A server on `addr` with default timeouts.
    ///
    /// ```rust,no_run
    /// # fn main() -> Result<(), senda::Error> {
    /// let server = senda::Server::bind("0.0.0.0:3000")?;
    /// # Ok(()) }
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self::with_config(ServerConfig { addr: addr.parse()?, ..ServerConfig::default() }))
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Binds the configured address and serves `router` until SIGTERM or
    /// Ctrl-C, then drains in-flight connections.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.config.addr).await?;
        self.serve_on(listener, router, shutdown_signal()).await
    }

    /// Serves `router` on an already bound listener until `shutdown`
    /// resolves.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        router: Router,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let router = Arc::new(router);
        let write_timeout = self.config.write_timeout;

        let mut builder = ConnBuilder::new(TokioExecutor::new());
        if let Some(limit) = self.config.read_timeout {
            builder.http1().timer(TokioTimer::new()).header_read_timeout(limit);
        }

        // Flipped once on shutdown; every connection task watches it.
        let (drain_tx, drain_rx) = watch::channel(());

        info!(addr = %listener.local_addr()?, "senda listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting even when
                // more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let builder = builder.clone();
                    let mut drain = drain_rx.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(&router, req, write_timeout).await }
                        });

                        let conn = builder.serve_connection(io, svc);
                        tokio::pin!(conn);

                        let res = tokio::select! {
                            res = conn.as_mut() => res,
                            _ = drain.changed() => {
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(e) = res {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the set stays small.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drain_tx.send_replace(());
        while tasks.join_next().await.is_some() {}

        info!("senda stopped");
        Ok(())
    }
}

/// Collects the body and hands the request to the router. Every failure is
/// turned into a response here, so hyper never sees an error.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
    write_timeout: Option<Duration>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!(error = %e, "failed to read request body");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };
    let req = http::Request::from_parts(parts, body);

    let response = match write_timeout {
        None => router.handle(req).await,
        Some(limit) => {
            let (method, path) = (req.method().clone(), req.uri().path().to_owned());
            match tokio::time::timeout(limit, router.handle(req)).await {
                Ok(res) => res,
                Err(_) => {
                    warn!(%method, path = %path, ?limit, "handler exceeded write timeout");
                    Response::status(StatusCode::SERVICE_UNAVAILABLE)
                }
            }
        }
    };

    Ok(response.into_inner())
}

/// Resolves on the first SIGTERM (Unix) or Ctrl-C the process receives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
