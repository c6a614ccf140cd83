//! Stream part delivery.
//!
//! Supports:
//! - Channel: in-process mpsc delivery to a single consumer
//! - JSON lines: one envelope per line to any async writer (stdout, socket)

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use scorestream_client::{encode_line, StreamPart};

use crate::interfaces::{StreamWriter, TransportError};

/// Consumer half of a part channel.
pub type PartReceiver = ReceiverStream<StreamPart>;

/// Create a bounded, FIFO, single-consumer part channel.
pub fn part_channel(capacity: usize) -> (ChannelStreamWriter, PartReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelStreamWriter { tx }, ReceiverStream::new(rx))
}

/// Producer half of a part channel.
#[derive(Debug, Clone)]
pub struct ChannelStreamWriter {
    tx: mpsc::Sender<StreamPart>,
}

impl ChannelStreamWriter {
    /// Resolves once the consumer has gone away.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl StreamWriter for ChannelStreamWriter {
    async fn write(&self, part: StreamPart) -> Result<(), TransportError> {
        let tag = part.tag();
        self.tx.send(part).await.map_err(|_| {
            debug!(tag, "Consumer disconnected");
            TransportError::Closed
        })
    }
}

/// Writes each part as an NDJSON line and flushes it.
pub struct JsonLinesWriter<W> {
    inner: Mutex<W>,
}

impl<W> JsonLinesWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

#[async_trait]
impl<W> StreamWriter for JsonLinesWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&self, part: StreamPart) -> Result<(), TransportError> {
        let mut line = encode_line(&part)?;
        line.push('\n');

        let mut inner = self.inner.lock().await;
        inner.write_all(line.as_bytes()).await.map_err(closed_or_io)?;
        inner.flush().await.map_err(closed_or_io)?;
        Ok(())
    }
}

fn closed_or_io(e: std::io::Error) -> TransportError {
    if e.kind() == std::io::ErrorKind::BrokenPipe {
        TransportError::Closed
    } else {
        TransportError::Io(e)
    }
}
