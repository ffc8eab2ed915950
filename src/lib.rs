//! Peer-to-peer session negotiation over an external signaling channel.
//!
//! [`RtcConnectionManager`] turns `offer` / `answer` / `candidate` signaling
//! messages into negotiated peer sessions (trickle ICE) and keeps at most one
//! session per remote socket id. The signaling transport is anything that
//! implements [`SignalingChannel`]; the peer-connection engine is a
//! [`PeerEngine`], with [`WebRtcEngine`] built on the `webrtc` crate.
//!
//! ```no_run
//! use rtc_socket_connector::{
//!     ChannelSignaling, ConnectOption, ConnectionHandler, RtcConnectionManager, WebRtcSession,
//! };
//!
//! # async fn demo() -> rtc_socket_connector::Result<()> {
//! let (signaling, _outbound) = ChannelSignaling::new(Some("a".into()));
//! let handler = ConnectionHandler::<WebRtcSession>::new().on_data_channel(|remote_id, channel| {
//!     println!("data channel {} with {remote_id} is open", channel.label());
//! });
//! let manager = RtcConnectionManager::with_webrtc(signaling, handler)?;
//! manager.connect("b", ConnectOption::data_channel()).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatcher;
mod error;
mod initiator;
pub mod logger;
mod manager;
mod mediator;
pub mod peer;
mod registry;
mod signaling;
mod utils;

pub use config::{
    IceServerConfig, IceServerKind, RtcConfig, DEFAULT_DATA_CHANNEL_LABEL, DEFAULT_STUN_SERVERS,
};
pub use dispatcher::{ConnectionHandler, EventDispatcher};
pub use error::{ConnectorError, Result};
pub use manager::RtcConnectionManager;
pub use peer::{
    AnswerMessage, CandidateMessage, ConnectOption, ConnectionState, EngineEvent,
    EngineEventSender, EngineSession, IceCandidate, Listeners, OfferMessage, PeerEngine,
    RemoteStream, SdpType, SessionDescription, SessionInfo, SessionState, SignalingMessage,
    WebRtcEngine, WebRtcSession,
};
pub use registry::ConnectionRegistry;
pub use signaling::{ChannelSignaling, SignalingChannel};
pub use utils::random_id;
