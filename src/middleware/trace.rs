//! Per-request access log through `tracing`.

use std::time::Duration;

use http::Method;
use tracing::{debug, info};

use super::Middleware;
use crate::request::Request;
use crate::response::Response;

/// Logs one `debug!` line as a request arrives and one `info!` line with
/// method, path, status and latency once it is answered.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn before(&self, req: &Request) {
        debug!(method = %req.method(), path = req.path(), "request started");
    }

    fn after(&self, method: &Method, path: &str, res: &Response, elapsed: Duration) {
        info!(
            %method,
            path,
            status = res.status_code().as_u16(),
            latency_us = elapsed.as_micros() as u64,
            "request finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use http::StatusCode;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::router::Router;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn logs_start_and_finish() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let router = Router::new().wrap(Trace).get("/users/:id", |_req: Request| async { "ok" });
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

        tracing::subscriber::with_default(subscriber, || {
            runtime.block_on(async {
                let req = http::Request::get("/users/7").body(Bytes::new()).unwrap();
                assert_eq!(router.handle(req).await.status_code(), StatusCode::OK);
                let req = http::Request::post("/missing").body(Bytes::new()).unwrap();
                assert_eq!(router.handle(req).await.status_code(), StatusCode::NOT_FOUND);
            });
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let finished: Vec<&str> = logs.lines().filter(|l| l.contains("request finished")).collect();
        assert_eq!(finished.len(), 2, "{logs}");
        assert!(finished[0].contains("INFO") && finished[0].contains("method=GET"), "{logs}");
        assert!(finished[0].contains("path=\"/users/7\"") && finished[0].contains("status=200"), "{logs}");
        assert!(finished[0].contains("latency_us="), "{logs}");
        assert!(finished[1].contains("method=POST") && finished[1].contains("status=404"), "{logs}");
        assert!(logs.lines().any(|l| l.contains("DEBUG") && l.contains("request started")), "{logs}");
    }
}
