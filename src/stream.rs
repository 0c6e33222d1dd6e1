//! HTTP streaming transport.
//!
//! Connects to the platform's line-delimited JSON streaming endpoints and
//! delivers parsed statuses to the session's sink. No reconnection: a
//! transport failure is reported once through the subscription handle and
//! the delivery task exits; reconnection policy belongs to the caller.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{
    config::ApiConfig,
    error::{Error, Result},
    session::{StreamEvent, StreamFilter, StreamHandle, StreamTransport},
    types::Status,
};

/// Streaming transport over reqwest.
#[derive(Debug)]
pub struct HttpStreamTransport {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpStreamTransport {
    /// Create a streaming transport from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        if config.bearer_token.is_empty() {
            return Err(Error::Config("bearer token required for streaming".into()));
        }

        let client = reqwest::Client::builder()
            .read_timeout(config.stream_timeout)
            .user_agent(format!("aviary/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.stream_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
        })
    }
}

#[async_trait]
impl StreamTransport for HttpStreamTransport {
    async fn subscribe(
        &self,
        filter: &StreamFilter,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<StreamHandle> {
        let url = format!("{}{}", self.base_url, filter.endpoint());
        info!(url = %url, "connecting to stream");

        let response = self
            .client
            .get(&url)
            .query(&filter.query_params())
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stream(format!(
                "subscription refused with status {status}: {body}"
            )));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (disconnect_tx, disconnect_rx) = oneshot::channel();

        tokio::spawn(deliver(response, events, stop_rx, disconnect_tx));

        Ok(StreamHandle::new(stop_tx, disconnect_rx))
    }
}

/// Deliver stream events until stopped, the sink is dropped, or the
/// transport fails.
async fn deliver(
    response: reqwest::Response,
    events: mpsc::Sender<StreamEvent>,
    mut stop: oneshot::Receiver<()>,
    disconnected: oneshot::Sender<String>,
) {
    if events.send(StreamEvent::Connected).await.is_err() {
        return;
    }

    let mut stream = response.bytes_stream();
    let mut buffer = Vec::new();

    loop {
        tokio::select! {
            _ = &mut stop => {
                debug!("stream stop requested, draining");
                return;
            }
            chunk = stream.next() => match chunk {
                Some(Ok(chunk)) => {
                    if handle_chunk(&chunk, &mut buffer, &events).await.is_err() {
                        // Sink dropped; nobody is listening any more.
                        return;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "stream transport error");
                    let _ = disconnected.send(e.to_string());
                    return;
                }
                None => {
                    let _ = disconnected.send("stream ended by service".into());
                    return;
                }
            },
        }
    }
}

/// Feed one chunk through the line buffer, sending an event per complete
/// line. Errors only when the sink has been dropped.
async fn handle_chunk(
    chunk: &Bytes,
    buffer: &mut Vec<u8>,
    events: &mpsc::Sender<StreamEvent>,
) -> std::result::Result<(), mpsc::error::SendError<StreamEvent>> {
    // Bare CRLF chunks are keep-alives.
    if chunk.is_empty() || chunk[..] == b"\r\n"[..] {
        debug!("received heartbeat");
        return events.send(StreamEvent::Heartbeat).await;
    }

    buffer.extend_from_slice(chunk);

    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
        let line = String::from_utf8_lossy(&line).trim().to_string();

        if line.is_empty() {
            events.send(StreamEvent::Heartbeat).await?;
            continue;
        }

        match serde_json::from_str::<Status>(&line) {
            Ok(status) => {
                debug!(status_id = status.id, "received stream status");
                events.send(StreamEvent::Status(status)).await?;
            }
            Err(e) => {
                // Control messages and limit notices land here; they are
                // not statuses and carry nothing the sink consumes.
                warn!(error = %e, data = %line, "ignoring non-status stream line");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn heartbeats_do_not_touch_the_line_buffer() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut buffer = b"{\"partial".to_vec();

        handle_chunk(&Bytes::from_static(b"\r\n"), &mut buffer, &tx)
            .await
            .unwrap();

        assert_eq!(buffer, b"{\"partial");
        assert!(matches!(rx.recv().await.unwrap(), StreamEvent::Heartbeat));
    }

    #[tokio::test]
    async fn statuses_split_across_chunks_are_reassembled() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut buffer = Vec::new();

        handle_chunk(&Bytes::from_static(b"{\"id\":1,\"te"), &mut buffer, &tx)
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        handle_chunk(&Bytes::from_static(b"xt\":\"hi\"}\n"), &mut buffer, &tx)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            StreamEvent::Status(status) => {
                assert_eq!(status.id, 1);
                assert_eq!(status.text, "hi");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn non_status_lines_are_ignored() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut buffer = Vec::new();

        handle_chunk(
            &Bytes::from_static(b"{\"limit\":{\"track\":5}}\n{\"id\":2,\"text\":\"ok\"}\n"),
            &mut buffer,
            &tx,
        )
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            StreamEvent::Status(status) => assert_eq!(status.id, 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn transport_requires_a_bearer_token() {
        let config = ApiConfig::default();
        let result = HttpStreamTransport::new(&config);
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }
}
