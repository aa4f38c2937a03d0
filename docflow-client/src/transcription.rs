//! Transcription audio relay
//!
//! Audio chunks recorded before the transcription socket is open are queued
//! locally. Once the socket is ready the relay sends the JSON handshake and
//! then flushes the queue in FIFO order. A chunk is only removed from the
//! queue after the sink accepted it, so a failed send never drops audio.
//!
//! The socket itself is abstracted behind [`FrameSink`]; [`ChannelSink`]
//! forwards frames over a tokio channel to whatever task owns the connection.

use std::collections::VecDeque;

use async_trait::async_trait;
use docflow_core::transcription::Handshake;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Frame written to the transcription socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// JSON text (the handshake)
    Text(String),
    /// Raw audio
    Binary(Vec<u8>),
}

/// Destination for outbound frames
#[async_trait]
pub trait FrameSink: Send {
    /// Send one frame; an error means the frame was not delivered
    async fn send(&mut self, frame: OutboundFrame) -> Result<()>;
}

/// [`FrameSink`] backed by a bounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<OutboundFrame>,
}

impl ChannelSink {
    /// Create a sink and the receiver the connection task reads from
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| ClientError::Transport("transcription channel closed".to_string()))
    }
}

/// Orders audio behind the handshake and buffers it until the socket is ready
pub struct ChunkRelay<S: FrameSink> {
    sink: S,
    handshake: Handshake,
    handshake_sent: bool,
    ready: bool,
    pending: VecDeque<Vec<u8>>,
}

impl<S: FrameSink> ChunkRelay<S> {
    pub fn new(sink: S, handshake: Handshake) -> Self {
        Self {
            sink,
            handshake,
            handshake_sent: false,
            ready: false,
            pending: VecDeque::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Chunks waiting to be sent
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn transaction_id(&self) -> &str {
        &self.handshake.transaction_id
    }

    /// Queue a recorded chunk; sent immediately when the socket is ready
    pub async fn send_audio(&mut self, chunk: Vec<u8>) -> Result<()> {
        self.pending.push_back(chunk);
        if self.ready {
            self.flush().await
        } else {
            debug!("Socket not ready, queued chunk ({} pending)", self.pending.len());
            Ok(())
        }
    }

    /// The socket opened: send the handshake, then everything queued so far
    pub async fn mark_ready(&mut self) -> Result<()> {
        if !self.handshake_sent {
            let text = serde_json::to_string(&self.handshake).map_err(|e| {
                ClientError::InternalError(format!("Failed to encode handshake: {}", e))
            })?;
            self.sink.send(OutboundFrame::Text(text)).await?;
            self.handshake_sent = true;
        }
        self.ready = true;

        info!(
            "Transcription session {} ready, flushing {} queued chunk(s)",
            self.handshake.transaction_id,
            self.pending.len()
        );
        self.flush().await
    }

    /// Send queued chunks in order until the queue is empty or the sink fails
    pub async fn flush(&mut self) -> Result<()> {
        while let Some(chunk) = self.pending.front() {
            self.sink.send(OutboundFrame::Binary(chunk.clone())).await?;
            self.pending.pop_front();
        }
        Ok(())
    }

    /// Hand back the sink, e.g. to close the connection
    pub fn into_sink(self) -> S {
        self.sink
    }
}
