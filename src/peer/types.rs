use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Тип SDP, сериализуется так же, как в браузерном `RTCSdpType`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

/// Описание сессии (`{"type": "...", "sdp": "..."}`)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// ICE кандидат в формате `RTCIceCandidateInit`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Какие возможности согласует соединение. Хотя бы одна должна быть включена
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectOption {
    pub enable_data_channel: bool,
    pub enable_media_stream: bool,
}

impl ConnectOption {
    pub fn data_channel() -> Self {
        Self {
            enable_data_channel: true,
            enable_media_stream: false,
        }
    }

    pub fn media_stream() -> Self {
        Self {
            enable_data_channel: false,
            enable_media_stream: true,
        }
    }

    pub fn both() -> Self {
        Self {
            enable_data_channel: true,
            enable_media_stream: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.enable_data_channel || self.enable_media_stream {
            Ok(())
        } else {
            Err(ConnectorError::InvalidOption)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferMessage {
    pub offer: SessionDescription,
    pub offer_socket_id: String,
    pub answer_socket_id: String,
    #[serde(default)]
    pub enable_data_channel: bool,
    #[serde(default)]
    pub enable_media_stream: bool,
}

impl OfferMessage {
    pub fn options(&self) -> ConnectOption {
        ConnectOption {
            enable_data_channel: self.enable_data_channel,
            enable_media_stream: self.enable_media_stream,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerMessage {
    pub answer: SessionDescription,
    pub answer_socket_id: String,
    pub offer_socket_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMessage {
    pub candidate: IceCandidate,
    pub from_socket_id: String,
    pub dest_socket_id: String,
}

/// Сообщения сигнального канала. Каждое передаётся как именованное событие
/// (`offer`, `answer`, `candidate`) с JSON-нагрузкой.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingMessage {
    Offer(OfferMessage),
    Answer(AnswerMessage),
    Candidate(CandidateMessage),
}

impl SignalingMessage {
    pub const OFFER: &'static str = "offer";
    pub const ANSWER: &'static str = "answer";
    pub const CANDIDATE: &'static str = "candidate";

    pub fn event_name(&self) -> &'static str {
        match self {
            SignalingMessage::Offer(_) => Self::OFFER,
            SignalingMessage::Answer(_) => Self::ANSWER,
            SignalingMessage::Candidate(_) => Self::CANDIDATE,
        }
    }

    /// Socket id отправителя сообщения
    pub fn sender_id(&self) -> &str {
        match self {
            SignalingMessage::Offer(m) => &m.offer_socket_id,
            SignalingMessage::Answer(m) => &m.answer_socket_id,
            SignalingMessage::Candidate(m) => &m.from_socket_id,
        }
    }

    /// Socket id получателя сообщения
    pub fn recipient_id(&self) -> &str {
        match self {
            SignalingMessage::Offer(m) => &m.answer_socket_id,
            SignalingMessage::Answer(m) => &m.offer_socket_id,
            SignalingMessage::Candidate(m) => &m.dest_socket_id,
        }
    }

    pub fn to_payload(&self) -> Result<Value> {
        let value = match self {
            SignalingMessage::Offer(m) => serde_json::to_value(m)?,
            SignalingMessage::Answer(m) => serde_json::to_value(m)?,
            SignalingMessage::Candidate(m) => serde_json::to_value(m)?,
        };
        Ok(value)
    }

    pub fn from_event(event: &str, payload: Value) -> Result<Self> {
        match event {
            Self::OFFER => Ok(SignalingMessage::Offer(serde_json::from_value(payload)?)),
            Self::ANSWER => Ok(SignalingMessage::Answer(serde_json::from_value(payload)?)),
            Self::CANDIDATE => Ok(SignalingMessage::Candidate(serde_json::from_value(
                payload,
            )?)),
            other => Err(ConnectorError::UnknownEvent(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn offer_payload_uses_socket_field_names() {
        let msg = SignalingMessage::Offer(OfferMessage {
            offer: SessionDescription::offer("v=0"),
            offer_socket_id: "a".into(),
            answer_socket_id: "b".into(),
            enable_data_channel: true,
            enable_media_stream: false,
        });

        assert_eq!(msg.event_name(), "offer");
        assert_eq!(
            msg.to_payload().unwrap(),
            json!({
                "offer": { "type": "offer", "sdp": "v=0" },
                "offerSocketId": "a",
                "answerSocketId": "b",
                "enableDataChannel": true,
                "enableMediaStream": false,
            })
        );
    }

    #[test]
    fn browser_candidate_payload_is_accepted() {
        let payload = json!({
            "candidate": {
                "candidate": "candidate:1 1 udp 2122260223 10.0.0.2 54321 typ host",
                "sdpMid": "0",
                "sdpMLineIndex": 0,
                "usernameFragment": "abcd"
            },
            "fromSocketId": "z",
            "destSocketId": "a"
        });

        let msg = SignalingMessage::from_event("candidate", payload).unwrap();
        assert_eq!(msg.sender_id(), "z");
        assert_eq!(msg.recipient_id(), "a");
        match msg {
            SignalingMessage::Candidate(m) => {
                assert_eq!(m.candidate.sdp_mid.as_deref(), Some("0"));
                assert_eq!(m.candidate.sdp_mline_index, Some(0));
                assert_eq!(m.candidate.username_fragment.as_deref(), Some("abcd"));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn offer_without_flags_defaults_to_disabled() {
        let payload = json!({
            "offer": { "type": "offer", "sdp": "v=0" },
            "offerSocketId": "a",
            "answerSocketId": "b"
        });

        match SignalingMessage::from_event("offer", payload).unwrap() {
            SignalingMessage::Offer(m) => assert_eq!(m.options(), ConnectOption::default()),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn unknown_event_is_rejected() {
        let err = SignalingMessage::from_event("hangup", json!({})).unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownEvent(name) if name == "hangup"));
    }

    #[test]
    fn malformed_answer_is_a_codec_error() {
        let err = SignalingMessage::from_event("answer", json!({ "answer": 1 })).unwrap_err();
        assert!(matches!(err, ConnectorError::Codec(_)));
    }

    #[test]
    fn connect_option_requires_a_capability() {
        assert!(matches!(
            ConnectOption::default().validate(),
            Err(ConnectorError::InvalidOption)
        ));
        assert!(ConnectOption::data_channel().validate().is_ok());
        assert!(ConnectOption::media_stream().validate().is_ok());
        assert!(ConnectOption::both().validate().is_ok());
    }
}
