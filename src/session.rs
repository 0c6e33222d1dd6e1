//! Bounded-duration streaming sessions.
//!
//! A [`StreamSession`] owns the lifecycle of one push-based subscription:
//! connect, receive events for a caller-chosen dwell time, drain, shut down.
//! Sessions are single-use; the state machine is `Idle → Connected →
//! Draining → Closed` with no re-entrant states.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    types::Status,
};

/// The one filter a session subscribes with. Exactly one variant is active
/// per session.
#[derive(Debug, Clone)]
pub enum StreamFilter {
    /// A sampled slice of the public firehose.
    Sample,

    /// Statuses posted by the given accounts.
    Follow(BTreeSet<u64>),

    /// Statuses matching the given terms.
    Track(Vec<String>),

    /// Statuses geotagged inside the given boxes.
    Locations(Vec<BoundingBox>),
}

impl StreamFilter {
    /// The subscription endpoint path for this filter variant.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Sample => "/statuses/sample.json",
            Self::Follow(_) | Self::Track(_) | Self::Locations(_) => "/statuses/filter.json",
        }
    }

    /// Query parameters for the subscription call.
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        match self {
            Self::Sample => Vec::new(),
            Self::Follow(ids) => {
                let ids = ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                vec![("follow".into(), ids)]
            }
            Self::Track(terms) => vec![("track".into(), terms.join(","))],
            Self::Locations(boxes) => {
                let coords = boxes
                    .iter()
                    .map(BoundingBox::to_param)
                    .collect::<Vec<_>>()
                    .join(",");
                vec![("locations".into(), coords)]
            }
        }
    }
}

/// A geographic bounding box, south-west corner first.
///
/// Well-formed by construction; malformed coordinate input is a
/// configuration error at the call site, not a runtime one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western longitude
    pub west: f64,
    /// Southern latitude
    pub south: f64,
    /// Eastern longitude
    pub east: f64,
    /// Northern latitude
    pub north: f64,
}

impl BoundingBox {
    /// Create a bounding box from its corner coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    fn to_param(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

/// An event delivered from the transport to the session's sink.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The subscription was established.
    Connected,

    /// A status matching the session's filter.
    Status(Status),

    /// Keep-alive line from the service.
    Heartbeat,

    /// The transport failed while connected. Terminal for the session;
    /// reconnection policy belongs to the caller.
    Disconnected {
        /// What the transport reported.
        cause: String,
    },
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, no network activity yet.
    Idle,
    /// Subscription established, events flowing to the sink.
    Connected,
    /// Shutdown initiated, transport buffers being released.
    Draining,
    /// Terminal. A new session must be constructed for a new subscription.
    Closed,
}

/// Handle to a live subscription, returned by a [`StreamTransport`].
///
/// Dropping the stop sender tells the delivery task to wind down; the
/// disconnect receiver fires at most once, with the cause of a transport
/// failure.
#[derive(Debug)]
pub struct StreamHandle {
    stop: Option<oneshot::Sender<()>>,
    disconnected: oneshot::Receiver<String>,
}

impl StreamHandle {
    /// Create a handle from the transport side's channel ends.
    #[must_use]
    pub const fn new(stop: oneshot::Sender<()>, disconnected: oneshot::Receiver<String>) -> Self {
        Self {
            stop: Some(stop),
            disconnected,
        }
    }
}

/// The push-transport seam.
///
/// A transport registers the event sink, issues exactly one subscription
/// call for the given filter, and delivers inbound events to the sink in
/// arrival order from its own delivery task. The session never blocks
/// waiting for events.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Establish the subscription and start delivering events.
    async fn subscribe(
        &self,
        filter: &StreamFilter,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<StreamHandle>;
}

/// A single-use streaming session.
pub struct StreamSession<T: StreamTransport> {
    transport: T,
    filter: StreamFilter,
    events: mpsc::Sender<StreamEvent>,
    state: SessionState,
    handle: Option<StreamHandle>,
}

impl<T: StreamTransport> StreamSession<T> {
    /// Create a session with exactly one filter and one event sink.
    #[must_use]
    pub const fn new(transport: T, filter: StreamFilter, events: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            transport,
            filter,
            events,
            state: SessionState::Idle,
            handle: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Open the subscription: `Idle → Connected`.
    ///
    /// Exactly one subscription call is made per session; opening from any
    /// state but `Idle` is an [`Error::InvalidState`]. If the subscription
    /// call itself fails the session stays `Idle` and the error is
    /// propagated.
    pub async fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::InvalidState {
                operation: "open",
                state: self.state,
            });
        }

        let handle = self
            .transport
            .subscribe(&self.filter, self.events.clone())
            .await?;

        self.handle = Some(handle);
        self.state = SessionState::Connected;
        info!(filter = ?self.filter, "stream session connected");
        Ok(())
    }

    /// Remain connected for the given dwell time, then return.
    ///
    /// There is no natural end-of-stream signal for a live feed, so the
    /// dwell is the session's deliberate stopping point; call
    /// [`close`](Self::close) afterwards. If the transport reports a
    /// failure during the dwell, the session transitions straight to
    /// `Closed` (skipping the clean drain) and emits exactly one
    /// [`StreamEvent::Disconnected`] to the sink.
    pub async fn run_for(&mut self, dwell: Duration) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::InvalidState {
                operation: "run_for",
                state: self.state,
            });
        }

        let cause = {
            // State is Connected, so the handle is present.
            let Some(handle) = self.handle.as_mut() else {
                return Err(Error::InvalidState {
                    operation: "run_for",
                    state: self.state,
                });
            };

            let dwell = tokio::time::sleep(dwell);
            tokio::pin!(dwell);

            tokio::select! {
                () = &mut dwell => None,
                res = &mut handle.disconnected => match res {
                    Ok(cause) => Some(cause),
                    // The delivery task ended without reporting a failure;
                    // keep dwelling for the remainder.
                    Err(_) => {
                        dwell.await;
                        None
                    }
                },
            }
        };

        if let Some(cause) = cause {
            self.fail(cause).await;
        }
        Ok(())
    }

    /// Shut the session down: `Connected → Draining → Closed`.
    ///
    /// Idempotent: closing from `Closed` is a no-op, and closing a session
    /// that was never opened is a no-op too, so shutdown is safe to call
    /// from a failure-recovery path as well as the normal path.
    pub async fn close(&mut self) {
        match self.state {
            SessionState::Idle | SessionState::Closed => {}
            SessionState::Connected | SessionState::Draining => {
                self.state = SessionState::Draining;

                if let Some(mut handle) = self.handle.take() {
                    // A failure the dwell never observed still surfaces as
                    // one disconnect event.
                    if let Ok(cause) = handle.disconnected.try_recv() {
                        warn!(%cause, "stream transport failed before close");
                        let _ = self
                            .events
                            .send(StreamEvent::Disconnected { cause })
                            .await;
                    }
                    if let Some(stop) = handle.stop.take() {
                        let _ = stop.send(());
                    }
                }

                self.state = SessionState::Closed;
                debug!("stream session closed");
            }
        }
    }

    /// Transport failure path: straight to `Closed`, one disconnect event.
    async fn fail(&mut self, cause: String) {
        warn!(%cause, "stream transport disconnected");
        self.handle = None;
        self.state = SessionState::Closed;
        let _ = self
            .events
            .send(StreamEvent::Disconnected { cause })
            .await;
    }
}
