// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! WebSocket connection framing for RPC messages.
use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    self as websocket,
    tungstenite::{protocol::WebSocketConfig, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};

/// Maximum message length.
const MAX_MSG_LEN: usize = 16384;

/// A WebSocket connection carrying bincode encoded messages.
pub struct Connection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection {
    /// Creates a new connection.
    fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self { stream }
    }

    /// Sends a message.
    pub async fn send<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        let buf = bincode::serialize(msg)?;
        if buf.len() > MAX_MSG_LEN {
            bail!("Message too long {} bytes", buf.len());
        }

        self.stream.send(WsMessage::binary(buf)).await?;

        Ok(())
    }

    /// Waits for a message.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Option<Result<T>> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Binary(payload))) => {
                    break Some(
                        bincode::deserialize(payload.as_slice()).map_err(anyhow::Error::from),
                    );
                }
                Some(Ok(WsMessage::Close(_))) => break None,
                Some(Ok(_)) => continue,
                Some(Err(e)) => break Some(Err(anyhow!("Connection error: {e}"))),
                None => break None,
            }
        }
    }

    /// Closes this connection.
    pub async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Creates a [Connection] from an accepted server stream.
pub async fn accept_async(stream: TcpStream) -> Result<Connection> {
    let config = WebSocketConfig {
        max_message_size: Some(MAX_MSG_LEN),
        ..Default::default()
    };

    let stream =
        websocket::accept_async_with_config(MaybeTlsStream::Plain(stream), Some(config)).await?;

    Ok(Connection::new(stream))
}

/// Connects to a server and returns a [Connection] if successful.
pub async fn connect_async(addr: &str) -> Result<Connection> {
    let config = WebSocketConfig {
        max_message_size: Some(MAX_MSG_LEN),
        ..Default::default()
    };

    let url = format!("ws://{}", addr);
    let (stream, _) = websocket::connect_async_with_config(&url, Some(config), false).await?;

    Ok(Connection::new(stream))
}
