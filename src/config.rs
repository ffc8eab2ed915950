// Конфигурация соединений
// По умолчанию используются два публичных STUN сервера

use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;

pub const DEFAULT_STUN_SERVERS: [&str; 2] = [
    "stun:stun.services.mozilla.com",
    "stun:stun.l.google.com:19302",
];

/// Метка data channel, который создаёт инициатор
pub const DEFAULT_DATA_CHANNEL_LABEL: &str = "main";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IceServerKind {
    #[default]
    Stun,
    Turn,
}

impl IceServerKind {
    fn scheme(self) -> &'static str {
        match self {
            IceServerKind::Stun => "stun:",
            IceServerKind::Turn => "turn:",
        }
    }
}

/// Конфигурация ICE сервера
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IceServerConfig {
    #[serde(rename = "type", default)]
    pub kind: IceServerKind,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            kind: IceServerKind::Stun,
            url: url.into(),
            username: None,
            credential: None,
        }
    }

    pub fn turn(
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            kind: IceServerKind::Turn,
            url: url.into(),
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }

    /// URL со схемой `stun:`/`turn:`; если схема уже есть, возвращается как есть
    pub fn url_with_scheme(&self) -> String {
        if self.url.starts_with("turn:")
            || self.url.starts_with("turns:")
            || self.url.starts_with("stun:")
            || self.url.starts_with("stuns:")
        {
            self.url.clone()
        } else {
            format!("{}{}", self.kind.scheme(), self.url)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ConnectorError::Config("server url cannot be empty".into()));
        }
        if self.kind == IceServerKind::Turn
            && (self.username.is_none() || self.credential.is_none())
        {
            return Err(ConnectorError::Config(format!(
                "turn server {} requires username and credential",
                self.url
            )));
        }
        Ok(())
    }

    fn to_rtc_ice_server(&self) -> RTCIceServer {
        RTCIceServer {
            urls: vec![self.url_with_scheme()],
            username: self.username.clone().unwrap_or_default(),
            credential: self.credential.clone().unwrap_or_default(),
        }
    }
}

/// Конфигурация, с которой менеджер создаёт каждую сессию
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RtcConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub ice_candidate_pool_size: u8,
    pub data_channel_label: String,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            ice_servers: DEFAULT_STUN_SERVERS
                .iter()
                .map(|url| IceServerConfig::stun(*url))
                .collect(),
            ice_candidate_pool_size: 0,
            data_channel_label: DEFAULT_DATA_CHANNEL_LABEL.to_string(),
        }
    }
}

impl RtcConfig {
    pub fn with_ice_servers(servers: Vec<IceServerConfig>) -> Result<Self> {
        let config = Self {
            ice_servers: servers,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for server in &self.ice_servers {
            server.validate()?;
        }
        if self.data_channel_label.is_empty() {
            return Err(ConnectorError::Config(
                "data channel label cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Конфигурация для `webrtc` peer connection
    pub fn to_rtc_configuration(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(IceServerConfig::to_rtc_ice_server)
                .collect(),
            ice_candidate_pool_size: self.ice_candidate_pool_size,
            bundle_policy: RTCBundlePolicy::MaxBundle,
            rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_two_public_stun_servers() {
        let config = RtcConfig::default();
        let urls: Vec<_> = config
            .ice_servers
            .iter()
            .map(IceServerConfig::url_with_scheme)
            .collect();
        assert_eq!(
            urls,
            vec!["stun:stun.services.mozilla.com", "stun:stun.l.google.com:19302"]
        );
        assert_eq!(config.data_channel_label, "main");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn scheme_is_added_by_server_kind() {
        assert_eq!(
            IceServerConfig::stun("stun.example.org:3478").url_with_scheme(),
            "stun:stun.example.org:3478"
        );
        assert_eq!(
            IceServerConfig::turn("turn.example.org:3478", "u", "p").url_with_scheme(),
            "turn:turn.example.org:3478"
        );
        assert_eq!(
            IceServerConfig::stun("turns:relay.example.org:443").url_with_scheme(),
            "turns:relay.example.org:443"
        );
    }

    #[test]
    fn turn_without_credentials_is_rejected() {
        let server = IceServerConfig {
            kind: IceServerKind::Turn,
            url: "turn.example.org".into(),
            username: Some("user".into()),
            credential: None,
        };
        assert!(matches!(
            RtcConfig::with_ice_servers(vec![server]),
            Err(ConnectorError::Config(_))
        ));
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(matches!(
            IceServerConfig::stun("  ").validate(),
            Err(ConnectorError::Config(_))
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RtcConfig::from_json(
            r#"{"ice_servers":[{"type":"turn","url":"turn.example.org","username":"u","credential":"p"}]}"#,
        )
        .unwrap();
        assert_eq!(config.ice_servers.len(), 1);
        assert_eq!(config.data_channel_label, "main");

        let rtc = config.to_rtc_configuration();
        assert_eq!(rtc.ice_servers[0].urls, vec!["turn:turn.example.org"]);
        assert_eq!(rtc.ice_servers[0].username, "u");
        assert_eq!(rtc.ice_servers[0].credential, "p");
    }
}
