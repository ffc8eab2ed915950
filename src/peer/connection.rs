use crate::config::RtcConfig;
use crate::error::{ConnectorError, Result};
use crate::peer::data_channel::attach_dc;
use crate::peer::engine::{
    ConnectionState, EngineEvent, EngineEventSender, EngineSession, PeerEngine,
};
use crate::peer::types::{IceCandidate, SdpType, SessionDescription};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry as InterceptorRegistry;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Удалённый медиапоток: трек и id потока, к которому он относится
#[derive(Clone)]
pub struct RemoteStream {
    pub id: String,
    pub track: Arc<TrackRemote>,
}

/// [`PeerEngine`] на базе крейта `webrtc`
pub struct WebRtcEngine {
    api: API,
}

impl WebRtcEngine {
    /// API с кодеками и interceptor-ами по умолчанию
    pub fn new() -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry =
            register_default_interceptors(InterceptorRegistry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();
        Ok(Self { api })
    }
}

#[async_trait]
impl PeerEngine for WebRtcEngine {
    type Session = WebRtcSession;

    async fn create_session(
        &self,
        config: &RtcConfig,
        events: EngineEventSender<WebRtcSession>,
    ) -> Result<Arc<WebRtcSession>> {
        let pc = Arc::new(
            self.api
                .new_peer_connection(config.to_rtc_configuration())
                .await?,
        );

        // Обработчик локальных кандидатов
        let tx = events.clone();
        pc.on_ice_candidate(Box::new(move |cand: Option<RTCIceCandidate>| {
            let event = match cand {
                Some(c) => match c.to_json() {
                    Ok(init) => EngineEvent::LocalCandidate(Some(candidate_from_init(init))),
                    Err(e) => {
                        warn!("failed to serialise local candidate: {e}");
                        return Box::pin(async {});
                    }
                },
                // cand == None означает конец сбора
                None => EngineEvent::LocalCandidate(None),
            };
            let _ = tx.send(event);
            Box::pin(async {})
        }));

        let tx = events.clone();
        pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            debug!(label = %dc.label(), "remote data channel received");
            let _ = tx.send(EngineEvent::DataChannel(dc));
            Box::pin(async {})
        }));

        let tx = events.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let stream = RemoteStream {
                id: track.stream_id(),
                track,
            };
            debug!(stream_id = %stream.id, "remote track received");
            let _ = tx.send(EngineEvent::Track(vec![stream]));
            Box::pin(async {})
        }));

        let tx = events.clone();
        pc.on_peer_connection_state_change(Box::new(move |st: RTCPeerConnectionState| {
            debug!("peer connection state changed to: {st:?}");
            let _ = tx.send(EngineEvent::ConnectionStateChange(connection_state(st)));
            Box::pin(async {})
        }));

        Ok(Arc::new(WebRtcSession { pc, events }))
    }
}

/// Одно peer connection
pub struct WebRtcSession {
    pc: Arc<RTCPeerConnection>,
    events: EngineEventSender<WebRtcSession>,
}

impl WebRtcSession {
    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.pc
    }
}

#[async_trait]
impl EngineSession for WebRtcSession {
    type DataChannel = Arc<RTCDataChannel>;
    type MediaStream = RemoteStream;
    type LocalMedia = Arc<dyn TrackLocal + Send + Sync>;

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.pc.create_offer(None).await?;
        description_from_rtc(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.pc.create_answer(None).await?;
        description_from_rtc(answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc
            .set_local_description(description_to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc
            .set_remote_description(description_to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_mline_index,
                username_fragment: candidate.username_fragment,
            })
            .await?;
        Ok(())
    }

    async fn add_local_media(&self, media: &Self::LocalMedia) -> Result<()> {
        let sender = self.pc.add_track(Arc::clone(media)).await?;
        // RTCP нужно вычитывать, иначе interceptor-ы не работают
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });
        Ok(())
    }

    async fn add_receive_only_media(&self) -> Result<()> {
        self.pc
            .add_transceiver_from_kind(
                RTPCodecType::Video,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await?;
        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<Self::DataChannel> {
        let dc = self
            .pc
            .create_data_channel(label, Some(RTCDataChannelInit::default()))
            .await?;
        attach_dc(&dc, self.events.clone());
        Ok(dc)
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}

fn candidate_from_init(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_mline_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn description_from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription> {
    let sdp_type = match desc.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => {
            return Err(ConnectorError::Engine(
                "engine produced a description without a type".into(),
            ))
        }
    };
    Ok(SessionDescription {
        sdp_type,
        sdp: desc.sdp,
    })
}

fn description_to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp)?,
        SdpType::Rollback => {
            return Err(ConnectorError::Engine(
                "rollback descriptions are not supported".into(),
            ))
        }
    };
    Ok(rtc)
}

fn connection_state(st: RTCPeerConnectionState) -> ConnectionState {
    match st {
        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => ConnectionState::New,
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
    }
}
