#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rtc_socket_connector::{
    ChannelSignaling, ConnectionHandler, ConnectorError, EngineEvent, EngineEventSender,
    EngineSession, IceCandidate, PeerEngine, Result, RtcConfig, RtcConnectionManager,
    SessionDescription, SignalingMessage,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateOffer,
    CreateAnswer,
    SetLocal(SessionDescription),
    SetRemote(SessionDescription),
    AddCandidate(IceCandidate),
    AddLocalMedia(String),
    AddReceiveOnly,
    CreateDataChannel(String),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockChannel {
    pub label: String,
}

/// Engine session that records every call. Setting a local description
/// "gathers" one host candidate followed by the end-of-candidates marker.
pub struct MockSession {
    pub serial: u64,
    calls: Mutex<Vec<Call>>,
    events: EngineEventSender<MockSession>,
    fail_offers: bool,
}

impl MockSession {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn emit(&self, event: EngineEvent<MockSession>) {
        let _ = self.events.send(event);
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn has_remote_description(&self) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|c| matches!(c, Call::SetRemote(_)))
    }
}

#[async_trait]
impl EngineSession for MockSession {
    type DataChannel = MockChannel;
    type MediaStream = String;
    type LocalMedia = String;

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateOffer);
        if self.fail_offers {
            return Err(ConnectorError::Engine("offer generation failed".into()));
        }
        tokio::task::yield_now().await;
        Ok(SessionDescription::offer(format!("offer-sdp-{}", self.serial)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateAnswer);
        if !self.has_remote_description() {
            return Err(ConnectorError::Engine("answer without remote offer".into()));
        }
        tokio::task::yield_now().await;
        Ok(SessionDescription::answer(format!("answer-sdp-{}", self.serial)))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(Call::SetLocal(desc));
        self.emit(EngineEvent::LocalCandidate(Some(host_candidate(self.serial))));
        self.emit(EngineEvent::LocalCandidate(None));
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(Call::SetRemote(desc));
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        if !self.has_remote_description() {
            return Err(ConnectorError::Engine("remote description not set".into()));
        }
        self.record(Call::AddCandidate(candidate));
        Ok(())
    }

    async fn add_local_media(&self, media: &String) -> Result<()> {
        self.record(Call::AddLocalMedia(media.clone()));
        Ok(())
    }

    async fn add_receive_only_media(&self) -> Result<()> {
        self.record(Call::AddReceiveOnly);
        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<MockChannel> {
        self.record(Call::CreateDataChannel(label.to_string()));
        Ok(MockChannel {
            label: label.to_string(),
        })
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}

pub fn host_candidate(n: u64) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{n} 1 udp 2122260223 10.0.0.{n} 5000{n} typ host"),
        sdp_mid: Some("0".into()),
        sdp_mline_index: Some(0),
        username_fragment: None,
    }
}

#[derive(Clone, Default)]
pub struct MockEngine {
    sessions: Arc<Mutex<Vec<Arc<MockSession>>>>,
    configs: Arc<Mutex<Vec<RtcConfig>>>,
    serial: Arc<AtomicU64>,
    fail_offers: bool,
}

impl MockEngine {
    pub fn failing_offers() -> Self {
        Self {
            fail_offers: true,
            ..Self::default()
        }
    }

    pub fn sessions(&self) -> Vec<Arc<MockSession>> {
        self.sessions.lock().clone()
    }

    /// Configuration of every `create_session` call, in call order.
    pub fn configs(&self) -> Vec<RtcConfig> {
        self.configs.lock().clone()
    }

    pub fn last_session(&self) -> Arc<MockSession> {
        self.sessions
            .lock()
            .last()
            .cloned()
            .expect("no engine session created")
    }
}

#[async_trait]
impl PeerEngine for MockEngine {
    type Session = MockSession;

    async fn create_session(
        &self,
        config: &RtcConfig,
        events: EngineEventSender<MockSession>,
    ) -> Result<Arc<MockSession>> {
        self.configs.lock().push(config.clone());
        let session = Arc::new(MockSession {
            serial: self.serial.fetch_add(1, Ordering::Relaxed) + 1,
            calls: Mutex::new(Vec::new()),
            events,
            fail_offers: self.fail_offers,
        });
        self.sessions.lock().push(session.clone());
        Ok(session)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    SessionCreated(String),
    DataChannel(String, String),
    Track(String, Vec<String>),
}

pub type Manager = RtcConnectionManager<MockEngine, ChannelSignaling>;

pub struct Peer {
    pub manager: Manager,
    pub engine: MockEngine,
    pub outbound: mpsc::UnboundedReceiver<SignalingMessage>,
    pub callbacks: Arc<Mutex<Vec<Callback>>>,
}

impl Peer {
    pub fn new(local_id: Option<&str>) -> Self {
        Self::with_engine(local_id, MockEngine::default())
    }

    pub fn with_engine(local_id: Option<&str>, engine: MockEngine) -> Self {
        let (signaling, outbound) = ChannelSignaling::new(local_id.map(str::to_string));
        let callbacks = Arc::new(Mutex::new(Vec::new()));

        let (c1, c2, c3) = (callbacks.clone(), callbacks.clone(), callbacks.clone());
        let handler = ConnectionHandler::<MockSession>::new()
            .on_session_created(move |id, _engine| {
                c1.lock().push(Callback::SessionCreated(id.to_string()))
            })
            .on_data_channel(move |id, channel| {
                c2.lock()
                    .push(Callback::DataChannel(id.to_string(), channel.label))
            })
            .on_track(move |id, streams| c3.lock().push(Callback::Track(id.to_string(), streams)));

        let manager = RtcConnectionManager::new(signaling, engine.clone(), handler);
        Self {
            manager,
            engine,
            outbound,
            callbacks,
        }
    }

    pub fn callbacks(&self) -> Vec<Callback> {
        self.callbacks.lock().clone()
    }

    pub async fn next_message(&mut self) -> SignalingMessage {
        tokio::time::timeout(Duration::from_secs(5), self.outbound.recv())
            .await
            .expect("timed out waiting for a signaling message")
            .expect("signaling channel closed")
    }

    /// Everything emitted so far, without waiting.
    pub fn drain(&mut self) -> Vec<SignalingMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.outbound.try_recv() {
            out.push(msg);
        }
        out
    }
}

pub async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

/// Lets spawned event pumps drain whatever is queued.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
