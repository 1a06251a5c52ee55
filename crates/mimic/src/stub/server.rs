//! hyper listener in front of a [`ContractStub`].

use super::engine::ContractStub;
use super::handler::handle_stub_request;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StubServerError {
    #[error("Failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
}

/// A stub accepting connections until shut down.
pub struct RunningStub {
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl RunningStub {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            error!("Stub accept loop failed: {}", e);
        }
    }

    /// Serve until the accept loop ends.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            error!("Stub accept loop failed: {}", e);
        }
    }
}

/// Bind `host:port` (port `0` picks a free one) and start serving.
pub async fn serve(stub: Arc<ContractStub>, host: &str, port: u16) -> Result<RunningStub, StubServerError> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|e| StubServerError::Bind(format!("{host}:{port}"), e))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| StubServerError::Bind(format!("{host}:{port}"), e))?;
    info!("Stub listening on http://{}", local_addr);

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let stub = Arc::clone(&stub);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let stub = Arc::clone(&stub);
                                    async move { handle_stub_request(req, stub, addr).await }
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!("Connection error from {}: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error on {}: {}", local_addr, e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Stub on {} shutting down", local_addr);
                    break;
                }
            }
        }
    });

    Ok(RunningStub {
        local_addr,
        shutdown_tx,
        handle,
    })
}
