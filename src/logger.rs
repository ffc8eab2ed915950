use crate::peer::types::IceCandidate;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Устанавливает глобальный subscriber. `RUST_LOG` имеет приоритет над `default_filter`.
/// Повторный вызов ничего не делает.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Тип ICE кандидата по строке `candidate:...`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Host,
    ServerReflexive,
    PeerReflexive,
    Relay,
    Unknown,
}

pub fn candidate_kind(candidate: &str) -> CandidateKind {
    let mut fields = candidate.split_whitespace();
    while let Some(field) = fields.next() {
        if field == "typ" {
            return match fields.next() {
                Some("host") => CandidateKind::Host,
                Some("srflx") => CandidateKind::ServerReflexive,
                Some("prflx") => CandidateKind::PeerReflexive,
                Some("relay") => CandidateKind::Relay,
                _ => CandidateKind::Unknown,
            };
        }
    }
    CandidateKind::Unknown
}

/// Печать ICE-candidate при появлении (Trickle-ICE)
pub fn dump_candidate(label: &str, remote_id: &str, cand: &IceCandidate) {
    debug!(
        remote_id = %remote_id,
        kind = ?candidate_kind(&cand.candidate),
        sdp_mid = ?cand.sdp_mid,
        sdp_mline_index = ?cand.sdp_mline_index,
        "trickle {label}: {}",
        cand.candidate
    );
}
