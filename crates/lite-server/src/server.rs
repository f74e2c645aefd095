//! HTTP/1.1 server loop on hyper and tokio.

use std::convert::Infallible;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, debug_span, info, warn, Instrument};

use crate::app::App;
use crate::error::{ServerError, ServerResult};
use crate::service::LiteService;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

impl App {
    /// Saves the OpenAPI document, binds the configured address and serves
    /// until SIGTERM or Ctrl+C.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Like [`App::run`], stopping when `shutdown` is triggered.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        if !self.settings.disable_local_save {
            self.save_openapi()?;
            info!(file = %self.settings.spec_file, "openapi document saved");
        }

        let addr = self.settings.addr.clone();
        let grace = self.settings.shutdown_timeout;
        let listener = TcpListener::bind(addr.as_str()).await.map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;
        let service = self.into_service()?;
        info!(addr = %listener.local_addr()?, "listening");

        serve(listener, service, shutdown, grace).await
    }
}

/// Accepts connections on `listener` until `shutdown` fires, then gives open
/// connections up to `grace` to finish.
pub async fn serve(
    listener: TcpListener,
    service: LiteService,
    shutdown: ShutdownSignal,
    grace: Duration,
) -> ServerResult<()> {
    let tracker = ConnectionTracker::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, remote)) => {
                    let token = tracker.acquire();
                    let service = service.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(
                        async move {
                            serve_connection(stream, service, shutdown).await;
                            drop(token);
                        }
                        .instrument(debug_span!("connection", %remote)),
                    );
                }
                Err(err) => warn!(error = %err, "failed to accept connection"),
            },
            () = shutdown.recv() => {
                info!("shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
    drop(listener);

    if tokio::time::timeout(grace, tracker.wait_idle()).await.is_err() {
        warn!(
            active = tracker.active_connections(),
            "shutdown timeout reached with connections still open"
        );
    }
    info!("server stopped");
    Ok(())
}

async fn serve_connection(stream: TcpStream, service: LiteService, shutdown: ShutdownSignal) {
    let handler = service_fn(move |request: http::Request<Incoming>| {
        let service = service.clone();
        async move { Ok::<_, Infallible>(service.handle(request).await) }
    });
    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), handler);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(err) = result {
        debug!(error = %err, "connection closed with error");
    }
}
