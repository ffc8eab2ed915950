pub mod connection;
pub mod data_channel;
pub mod engine;
pub mod ice;
pub mod state;
pub mod types;

pub use connection::{RemoteStream, WebRtcEngine, WebRtcSession};
pub use engine::{ConnectionState, EngineEvent, EngineEventSender, EngineSession, PeerEngine};
pub use state::{Listeners, SessionInfo, SessionState};
pub use types::{
    AnswerMessage, CandidateMessage, ConnectOption, IceCandidate, OfferMessage, SdpType,
    SessionDescription, SignalingMessage,
};
