//! Interface to the peer-connection engine.
//!
//! The manager never talks to a concrete WebRTC stack directly. It creates
//! sessions through [`PeerEngine`], drives them through [`EngineSession`] and
//! receives everything the engine reports as [`EngineEvent`]s on the channel it
//! handed over at creation time.

use crate::config::RtcConfig;
use crate::error::Result;
use crate::peer::types::{IceCandidate, SessionDescription};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connection state reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Lifecycle events raised by one engine session.
pub enum EngineEvent<S: EngineSession> {
    /// A local candidate was gathered. `None` marks the end of gathering.
    LocalCandidate(Option<IceCandidate>),
    /// The remote side opened a data channel.
    DataChannel(S::DataChannel),
    /// A data channel created locally via [`EngineSession::create_data_channel`] is open.
    DataChannelOpen(S::DataChannel),
    /// Remote media arrived, together with the streams it belongs to.
    Track(Vec<S::MediaStream>),
    ConnectionStateChange(ConnectionState),
}

impl<S: EngineSession> std::fmt::Debug for EngineEvent<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::LocalCandidate(c) => f.debug_tuple("LocalCandidate").field(c).finish(),
            EngineEvent::DataChannel(_) => f.write_str("DataChannel"),
            EngineEvent::DataChannelOpen(_) => f.write_str("DataChannelOpen"),
            EngineEvent::Track(streams) => write!(f, "Track({} streams)", streams.len()),
            EngineEvent::ConnectionStateChange(st) => {
                f.debug_tuple("ConnectionStateChange").field(st).finish()
            }
        }
    }
}

pub type EngineEventSender<S> = mpsc::UnboundedSender<EngineEvent<S>>;

/// Factory for engine sessions.
#[async_trait]
pub trait PeerEngine: Send + Sync + 'static {
    type Session: EngineSession;

    /// Creates a session configured with `config`. Every event of the new
    /// session must be delivered through `events`.
    async fn create_session(
        &self,
        config: &RtcConfig,
        events: EngineEventSender<Self::Session>,
    ) -> Result<Arc<Self::Session>>;
}

/// One peer connection inside the engine.
#[async_trait]
pub trait EngineSession: Send + Sync + Sized + 'static {
    type DataChannel: Send + Sync + 'static;
    type MediaStream: Send + Sync + 'static;
    /// Media the local side contributes to every session that asks for it.
    type LocalMedia: Send + Sync + 'static;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn add_local_media(&self, media: &Self::LocalMedia) -> Result<()>;

    /// Adds a receive-only placeholder when there is no local media to send.
    async fn add_receive_only_media(&self) -> Result<()>;

    /// Creates a data channel. Once it opens the session raises
    /// [`EngineEvent::DataChannelOpen`] for it.
    async fn create_data_channel(&self, label: &str) -> Result<Self::DataChannel>;

    /// Shuts the session down. Only used for sessions that never got registered.
    async fn close(&self) -> Result<()>;
}
