//! Delta sources.
//!
//! - [`run_websocket`] connects to a SignalK server stream, subscribes to
//!   every path of the own vessel and feeds each delta to the writer.
//! - [`run_lines`] reads newline-delimited JSON, one message per line.
//!
//! Both run until the input ends and return the number of deltas read.
//! Messages that do not decode are logged and skipped.

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use signalk_protocol::{
    decode_server_message, encode_client_message, ClientMessage, CodecError, ServerMessage,
    SubscribeRequest,
};

use crate::sink::PointSink;
use crate::writer::InfluxWriter;

/// Context subscribed to on the server.
pub const SUBSCRIBE_CONTEXT: &str = "vessels.self";

/// Errors that end a source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Stream deltas from a SignalK server into the writer.
pub async fn run_websocket<S: PointSink>(
    url: &str,
    writer: &mut InfluxWriter<S>,
) -> Result<u64, SourceError> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
    info!("Connected to {}", url);

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let subscribe = ClientMessage::Subscribe(SubscribeRequest::all_paths(SUBSCRIBE_CONTEXT));
    ws_tx
        .send(Message::Text(encode_client_message(&subscribe)?))
        .await?;

    let mut deltas = 0;
    while let Some(msg) = ws_rx.next().await {
        match msg? {
            Message::Text(text) => {
                if handle_text(&text, writer) {
                    deltas += 1;
                }
            }
            Message::Binary(_) => warn!("Skipping message: {}", CodecError::BinaryFrame),
            Message::Ping(data) => ws_tx.send(Message::Pong(data)).await?,
            Message::Close(frame) => {
                info!("Server closed the stream: {:?}", frame);
                break;
            }
            _ => {}
        }
    }

    info!("Stream ended after {} deltas", deltas);
    Ok(deltas)
}

/// Read newline-delimited JSON deltas into the writer.
pub async fn run_lines<R, S>(reader: R, writer: &mut InfluxWriter<S>) -> Result<u64, SourceError>
where
    R: AsyncBufRead + Unpin,
    S: PointSink,
{
    let mut lines = reader.lines();
    let mut deltas = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if handle_text(line, writer) {
            deltas += 1;
        }
    }

    info!("Input ended after {} deltas", deltas);
    Ok(deltas)
}

/// Decode one message and process it. Returns whether it was a delta.
fn handle_text<S: PointSink>(text: &str, writer: &mut InfluxWriter<S>) -> bool {
    match decode_server_message(text) {
        Ok(ServerMessage::Delta(delta)) => {
            writer.process(&delta);
            true
        }
        Ok(ServerMessage::Hello(hello)) => {
            info!(
                "Hello from {} {}",
                hello.name.as_deref().unwrap_or("SignalK server"),
                hello.version
            );
            if !same_vessel(&hello.self_urn, writer.self_context()) {
                warn!(
                    "Server reports self {} but writing {}; only deltas for {} are recorded",
                    hello.self_urn,
                    writer.self_context(),
                    writer.self_context()
                );
            }
            false
        }
        Err(e) => {
            warn!("Skipping undecodable message: {}", e);
            debug!("Undecodable message: {}", text);
            false
        }
    }
}

/// Compare vessel identifiers with or without the "vessels." prefix.
fn same_vessel(a: &str, b: &str) -> bool {
    let bare = |s: &str| s.strip_prefix("vessels.").unwrap_or(s).to_string();
    bare(a) == bare(b)
}
