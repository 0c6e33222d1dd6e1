//! Aviary - automation core for a social platform's REST and streaming APIs.
//!
//! The crate is built around two mechanisms that every operation shares:
//!
//! - **Rate-limit-aware execution**: every REST call returns its payload
//!   together with the quota the service reported for it. The
//!   [`RequestExecutor`] runs the call once, hands the quota to the
//!   [`RateLimitGuard`], and the guard absorbs an exhausted quota as a
//!   bounded wait instead of an error.
//! - **Bounded streaming sessions**: a [`StreamSession`] opens exactly one
//!   push subscription, delivers events to a channel sink in arrival order
//!   for a caller-chosen dwell time, and tears the subscription down
//!   deterministically. Sessions are single-use.
//!
//! On top of those sit two pure analysis helpers ([`is_admissible`]/[`rank`]
//! and [`aggregate`]) and the batch automation flows
//! ([`follower_vocabulary`], [`retweet_top_friends`], [`reply_to_mentions`]).

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod analysis;
mod client;
mod config;
mod error;
mod executor;
mod ops;
mod policy;
mod ratelimit;
mod session;
mod stream;
mod types;

pub use analysis::aggregate;
pub use client::{ApiTransport, HttpApiClient};
pub use config::ApiConfig;
pub use error::{Error, Result};
pub use executor::RequestExecutor;
pub use ops::{follower_vocabulary, reply_to_mentions, retweet_top_friends};
pub use policy::{is_admissible, rank, retweet_candidates};
pub use ratelimit::{QuotaStatus, RateLimitGuard};
pub use session::{
    BoundingBox, SessionState, StreamEvent, StreamFilter, StreamHandle, StreamSession,
    StreamTransport,
};
pub use stream::HttpStreamTransport;
pub use types::{Account, ApiResponse, Entities, IdPage, Status, StatusAuthor, UserMention};
