// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Holdem table server entry point.
use anyhow::{anyhow, Result};
use log::{error, info};
use std::net::SocketAddr;
use tokio::{
    net::{TcpListener, TcpStream},
    signal,
    sync::{broadcast, mpsc},
    time::{self, Duration},
};

use holdem_core::{connection, message::Request};

use crate::{db::Db, service::Service};

/// Networking config.
#[derive(Debug)]
pub struct Config {
    /// The server listening address.
    pub address: String,
    /// The server listening port.
    pub port: u16,
    /// The database path.
    pub db_path: String,
}

/// The server that accepts client connections and dispatches requests.
struct Server {
    /// The RPC service shared by all connections.
    service: Service,
    /// The server listener.
    listener: TcpListener,
    /// Shutdown notification channel.
    shutdown_broadcast_tx: broadcast::Sender<()>,
    /// Shutdown sender cloned by each connection.
    shutdown_complete_tx: mpsc::Sender<()>,
}

/// Client connection handler.
struct Handler {
    /// The RPC service shared by all connections.
    service: Service,
    /// Channel for listening shutdown notification.
    shutdown_broadcast_rx: broadcast::Receiver<()>,
    /// Sender that drops when this connection is done.
    _shutdown_complete_tx: mpsc::Sender<()>,
}

/// Server entry point.
pub async fn run(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.address, config.port);
    info!("Starting server listening on {addr}");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow!("Tcp listener bind error: {e}"))?;

    let db = Db::open(&config.db_path)
        .map_err(|e| anyhow!("Store open error for {}: {e}", config.db_path))?;

    let shutdown_signal = signal::ctrl_c();
    let (shutdown_broadcast_tx, _) = broadcast::channel(1);
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel(1);

    let mut server = Server {
        service: Service::new(db),
        listener,
        shutdown_broadcast_tx,
        shutdown_complete_tx,
    };

    tokio::select! {
        res = server.run() => {
            res.map_err(|e| anyhow!("Tcp listener accept error: {e}"))?;
        }
        _ = shutdown_signal => {
            info!("Received shutdown signal...");
        }
    }

    // Wait for all connections to shutdown.
    let Server {
        shutdown_broadcast_tx,
        shutdown_complete_tx,
        ..
    } = server;

    // Notify all connections to start shutdown then wait for all connections
    // to terminate and drop their shutdown channel.
    drop(shutdown_broadcast_tx);
    drop(shutdown_complete_tx);
    let _ = shutdown_complete_rx.recv().await;

    Ok(())
}

impl Server {
    /// Runs the accept loop.
    async fn run(&mut self) -> Result<()> {
        loop {
            let (socket, addr) = self.accept_with_retry().await?;
            info!("Accepted connection from {addr}");

            let mut handler = Handler {
                service: self.service.clone(),
                shutdown_broadcast_rx: self.shutdown_broadcast_tx.subscribe(),
                _shutdown_complete_tx: self.shutdown_complete_tx.clone(),
            };

            // Spawn a task to serve this connection requests.
            tokio::spawn(async move {
                if let Err(err) = handler.run(socket).await {
                    error!("Connection to {addr} {err}");
                }

                info!("Connection to {addr} closed");
            });
        }
    }

    /// Accepts a connection with retries.
    async fn accept_with_retry(&self) -> Result<(TcpStream, SocketAddr)> {
        let mut retry = 0;
        loop {
            match self.listener.accept().await {
                Ok((socket, addr)) => {
                    return Ok((socket, addr));
                }
                Err(err) => {
                    if retry == 5 {
                        return Err(err.into());
                    }
                }
            }

            time::sleep(Duration::from_secs(1 << retry)).await;
            retry += 1;
        }
    }
}

impl Handler {
    /// Serves requests on a connection until it closes.
    async fn run(&mut self, socket: TcpStream) -> Result<()> {
        let mut conn = connection::accept_async(socket).await?;

        let res = loop {
            tokio::select! {
                _ = self.shutdown_broadcast_rx.recv() => {
                    break Ok(());
                }
                res = conn.recv::<Request>() => match res {
                    Some(Ok(req)) => {
                        let response = self.service.dispatch(req).await;
                        if let Err(err) = conn.send(&response).await {
                            break Err(err);
                        }
                    }
                    Some(Err(err)) => break Err(err),
                    None => break Ok(()),
                },
            }
        };

        conn.close().await;

        res
    }
}
