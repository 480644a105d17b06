//! TCP listener and accept loop
//!
//! One listening socket per configured bind address. Accepted connections
//! are handed to the output under its mutex; while the output is closed
//! they are dropped on the floor.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::SnapcastConfig;
use crate::error::OutputError;
use crate::output::OutputShared;
use crate::Result;

pub(crate) struct Listener {
    sockets: Vec<TcpListener>,
    port: u16,
}

impl Listener {
    /// Bind all configured addresses
    pub(crate) async fn bind(config: &SnapcastConfig) -> Result<Self> {
        let addrs = config.bind_addrs()?;

        let mut sockets = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let socket = TcpListener::bind(addr)
                .await
                .map_err(|e| OutputError::Bind {
                    address: addr.to_string(),
                    source: e,
                })?;

            let local = socket.local_addr().map_err(OutputError::Io)?;
            info!(address = %local, "snapcast listener bound");
            sockets.push(socket);
        }

        let port = sockets
            .first()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.port())
            .unwrap_or(config.port);

        Ok(Self { sockets, port })
    }

    /// The actually bound port (resolves a configured port of 0)
    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Spawn one accept loop per socket
    pub(crate) fn spawn_accept_loops(self, shared: Arc<OutputShared>, cancel: CancellationToken) {
        for socket in self.sockets {
            tokio::spawn(accept_loop(socket, Arc::clone(&shared), cancel.clone()));
        }
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<OutputShared>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => shared.accept(stream, peer),
                    // Transient accept errors - log and continue
                    Err(e) => warn!(error = %e, "accept error"),
                }
            }
        }
    }
}
