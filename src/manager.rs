use crate::config::RtcConfig;
use crate::dispatcher::{ConnectionHandler, EventDispatcher};
use crate::error::{ConnectorError, Result};
use crate::peer::connection::WebRtcEngine;
use crate::peer::engine::{ConnectionState, EngineEvent, EngineSession, PeerEngine};
use crate::peer::ice::CandidateRelay;
use crate::peer::state::{Listeners, Session, SessionInfo, SessionState};
use crate::peer::types::{ConnectOption, SignalingMessage};
use crate::registry::ConnectionRegistry;
use crate::signaling::{PeerQueues, SignalingChannel};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) type EngineSessionOf<E> = <E as PeerEngine>::Session;
pub(crate) type LocalMediaOf<E> = <EngineSessionOf<E> as EngineSession>::LocalMedia;
pub(crate) type SessionOf<E> = Session<EngineSessionOf<E>>;

/// State shared by the initiator, the mediator and the per-session event pumps.
pub(crate) struct Shared<E: PeerEngine, C: SignalingChannel> {
    pub(crate) engine: E,
    pub(crate) signaling: C,
    pub(crate) config: RtcConfig,
    pub(crate) registry: Mutex<ConnectionRegistry<SessionOf<E>>>,
    pub(crate) dispatcher: EventDispatcher<EngineSessionOf<E>>,
    pub(crate) media: RwLock<Option<Arc<LocalMediaOf<E>>>>,
    next_serial: AtomicU64,
}

impl<E: PeerEngine, C: SignalingChannel> Shared<E, C> {
    pub(crate) fn require_local_id(&self) -> Result<String> {
        self.signaling.local_id().ok_or_else(|| {
            ConnectorError::Precondition("signaling channel must be connected".into())
        })
    }

    pub(crate) fn lookup(&self, remote_id: &str) -> Result<Arc<SessionOf<E>>> {
        self.registry.lock().get(remote_id)
    }

    fn is_current(&self, remote_id: &str, serial: u64) -> bool {
        matches!(self.registry.lock().get(remote_id), Ok(s) if s.serial() == serial)
    }

    /// Creates an engine session for `remote_id`, registers it and starts
    /// relaying its events. Nothing is registered if this fails.
    pub(crate) async fn open_session(
        self: &Arc<Self>,
        remote_id: &str,
        listeners: Listeners,
    ) -> Result<Arc<SessionOf<E>>> {
        if self.registry.lock().contains(remote_id) {
            return Err(ConnectorError::DuplicateConnection(remote_id.to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let engine = self.engine.create_session(&self.config, tx).await?;
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Session::new(
            remote_id.to_string(),
            serial,
            Arc::clone(&engine),
            listeners,
        ));

        // the id may have been taken while the engine was busy
        let registered = self.registry.lock().set(remote_id, Arc::clone(&session));
        if let Err(err) = registered {
            if let Err(e) = engine.close().await {
                debug!(remote_id = %remote_id, "closing unregistered session failed: {e}");
            }
            return Err(err);
        }
        info!(remote_id = %remote_id, serial, ?listeners, "session registered");

        self.dispatcher.session_created(remote_id, session.engine());
        self.spawn_event_pump(remote_id.to_string(), serial, rx);
        Ok(session)
    }

    /// Local media if configured, a receive-only placeholder otherwise.
    pub(crate) async fn attach_media(&self, session: &SessionOf<E>) -> Result<()> {
        let media = self.media.read().clone();
        match media {
            Some(media) => session.engine().add_local_media(&media).await,
            None => {
                debug!(
                    remote_id = %session.remote_id(),
                    "no local media, adding receive-only transceiver"
                );
                session.engine().add_receive_only_media().await
            }
        }
    }

    fn spawn_event_pump(
        self: &Arc<Self>,
        remote_id: String,
        serial: u64,
        mut rx: mpsc::UnboundedReceiver<EngineEvent<EngineSessionOf<E>>>,
    ) {
        let shared: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                if let Err(e) = shared.handle_engine_event(&remote_id, serial, event) {
                    warn!(remote_id = %remote_id, "engine event failed: {e}");
                }
                if !shared.is_current(&remote_id, serial) {
                    break;
                }
            }
            debug!(remote_id = %remote_id, serial, "event pump finished");
        });
    }

    /// Single entry point for everything an engine session reports.
    pub(crate) fn handle_engine_event(
        &self,
        remote_id: &str,
        serial: u64,
        event: EngineEvent<EngineSessionOf<E>>,
    ) -> Result<()> {
        let session = match self.lookup(remote_id) {
            Ok(session) if session.serial() == serial => session,
            _ => {
                debug!(remote_id = %remote_id, ?event, "event for a session that is gone");
                return Ok(());
            }
        };

        match event {
            EngineEvent::LocalCandidate(candidate) => {
                CandidateRelay::new(&self.signaling).relay(&session, candidate)
            }
            EngineEvent::DataChannel(channel) => {
                if session.listeners().data_channel {
                    self.dispatcher.data_channel(remote_id, channel);
                } else {
                    debug!(remote_id = %remote_id, "remote data channel ignored, not negotiated");
                }
                Ok(())
            }
            EngineEvent::DataChannelOpen(channel) => {
                self.dispatcher.data_channel(remote_id, channel);
                Ok(())
            }
            EngineEvent::Track(streams) => {
                if session.listeners().track {
                    self.dispatcher.track(remote_id, streams);
                } else {
                    debug!(remote_id = %remote_id, "remote track ignored, not negotiated");
                }
                Ok(())
            }
            EngineEvent::ConnectionStateChange(ConnectionState::Disconnected) => {
                session.close();
                self.registry.lock().remove(remote_id)?;
                info!(remote_id = %remote_id, serial, "peer disconnected, session removed");
                Ok(())
            }
            EngineEvent::ConnectionStateChange(state) => {
                debug!(remote_id = %remote_id, ?state, "connection state changed");
                if state == ConnectionState::Connected {
                    session.advance(SessionState::Established);
                }
                Ok(())
            }
        }
    }
}

/// Entry point of the crate: negotiates peer sessions over a signaling
/// channel and keeps at most one session per remote socket id.
pub struct RtcConnectionManager<E: PeerEngine, C: SignalingChannel> {
    shared: Arc<Shared<E, C>>,
}

impl<E: PeerEngine, C: SignalingChannel> Clone for RtcConnectionManager<E, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: SignalingChannel> RtcConnectionManager<WebRtcEngine, C> {
    /// Manager backed by the `webrtc` crate with the default ICE servers.
    pub fn with_webrtc(
        signaling: C,
        handler: ConnectionHandler<EngineSessionOf<WebRtcEngine>>,
    ) -> Result<Self> {
        Ok(Self::new(signaling, WebRtcEngine::new()?, handler))
    }
}

impl<E: PeerEngine, C: SignalingChannel> RtcConnectionManager<E, C> {
    pub fn new(signaling: C, engine: E, handler: ConnectionHandler<EngineSessionOf<E>>) -> Self {
        Self::build(signaling, engine, handler, RtcConfig::default())
    }

    pub fn with_config(
        signaling: C,
        engine: E,
        handler: ConnectionHandler<EngineSessionOf<E>>,
        config: RtcConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(signaling, engine, handler, config))
    }

    fn build(
        signaling: C,
        engine: E,
        handler: ConnectionHandler<EngineSessionOf<E>>,
        config: RtcConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                signaling,
                config,
                registry: Mutex::new(ConnectionRegistry::new()),
                dispatcher: EventDispatcher::new(handler),
                media: RwLock::new(None),
                next_serial: AtomicU64::new(1),
            }),
        }
    }

    /// Opens a session to `remote_id` and sends it an offer. Resolves once
    /// the offer has been emitted.
    pub async fn connect(&self, remote_id: &str, options: ConnectOption) -> Result<()> {
        self.shared.connect(remote_id, options).await
    }

    /// Handles one inbound signaling message.
    pub async fn handle_signal(&self, message: SignalingMessage) -> Result<()> {
        self.shared.handle_signal(message).await
    }

    /// Same as [`handle_signal`](Self::handle_signal) for a raw named event.
    pub async fn handle_event(&self, event: &str, payload: Value) -> Result<()> {
        let message = SignalingMessage::from_event(event, payload)?;
        self.shared.handle_signal(message).await
    }

    /// Handles inbound messages until `inbound` closes. Messages from one
    /// sender are handled in order; senders do not wait on each other.
    /// Failures are logged, there is nobody else to report them to.
    pub async fn run(&self, mut inbound: mpsc::UnboundedReceiver<SignalingMessage>) {
        let mut queues = PeerQueues::default();
        while let Some(message) = inbound.recv().await {
            let shared = Arc::clone(&self.shared);
            queues.dispatch(
                message,
                |id| self.shared.registry.lock().contains(id),
                move |message| {
                    let shared = Arc::clone(&shared);
                    async move {
                        let event = message.event_name();
                        let sender = message.sender_id().to_string();
                        if let Err(e) = shared.handle_signal(message).await {
                            warn!(remote_id = %sender, event, "signaling message rejected: {e}");
                        }
                    }
                },
            );
        }
        debug!("inbound signaling closed");
    }

    /// Media attached to every later session that negotiates media.
    pub fn set_media_stream(&self, media: LocalMediaOf<E>) {
        *self.shared.media.write() = Some(Arc::new(media));
    }

    pub fn clear_media_stream(&self) {
        *self.shared.media.write() = None;
    }

    pub fn session(&self, remote_id: &str) -> Result<SessionInfo> {
        let session = self.shared.lookup(remote_id)?;
        Ok(SessionInfo::from(session.as_ref()))
    }

    pub fn engine_session(&self, remote_id: &str) -> Result<Arc<EngineSessionOf<E>>> {
        Ok(Arc::clone(self.shared.lookup(remote_id)?.engine()))
    }

    pub fn is_connected(&self, remote_id: &str) -> bool {
        self.shared.registry.lock().contains(remote_id)
    }

    pub fn connected_ids(&self) -> Vec<String> {
        self.shared.registry.lock().ids()
    }

    pub fn local_id(&self) -> Option<String> {
        self.shared.signaling.local_id()
    }

    pub fn config(&self) -> &RtcConfig {
        &self.shared.config
    }

    pub fn signaling(&self) -> &C {
        &self.shared.signaling
    }
}
