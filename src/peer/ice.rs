use crate::error::{ConnectorError, Result};
use crate::logger::dump_candidate;
use crate::peer::engine::EngineSession;
use crate::peer::state::Session;
use crate::peer::types::{CandidateMessage, IceCandidate, SignalingMessage};
use crate::signaling::SignalingChannel;
use tracing::debug;

/// Отправляет локальные ICE кандидаты сессии удалённому пиру (Trickle-ICE)
pub struct CandidateRelay<'a, C: SignalingChannel> {
    signaling: &'a C,
}

impl<'a, C: SignalingChannel> CandidateRelay<'a, C> {
    pub fn new(signaling: &'a C) -> Self {
        Self { signaling }
    }

    /// Обрабатывает одного локального кандидата. `None` означает конец сбора
    /// и никогда не отправляется
    pub fn relay<P: EngineSession>(
        &self,
        session: &Session<P>,
        candidate: Option<IceCandidate>,
    ) -> Result<()> {
        let Some(candidate) = candidate else {
            debug!(remote_id = %session.remote_id(), "ICE candidate gathering completed");
            return Ok(());
        };
        dump_candidate("LOCAL", session.remote_id(), &candidate);

        match session.hold_or_pass(candidate) {
            Some(candidate) => self.send(session.remote_id(), candidate),
            None => {
                debug!(
                    remote_id = %session.remote_id(),
                    "description not sent yet, holding candidate"
                );
                Ok(())
            }
        }
    }

    /// Отправляет накопленных кандидатов, следующие уходят сразу
    pub fn flush<P: EngineSession>(&self, session: &Session<P>) -> Result<()> {
        let pending = session.open_gate();
        if !pending.is_empty() {
            debug!(
                remote_id = %session.remote_id(),
                count = pending.len(),
                "sending held candidates"
            );
        }
        for candidate in pending {
            self.send(session.remote_id(), candidate)?;
        }
        Ok(())
    }

    fn send(&self, remote_id: &str, candidate: IceCandidate) -> Result<()> {
        let from_socket_id = self.signaling.local_id().ok_or_else(|| {
            ConnectorError::Precondition("signaling channel has no local id".into())
        })?;
        self.signaling
            .emit(SignalingMessage::Candidate(CandidateMessage {
                candidate,
                from_socket_id,
                dest_socket_id: remote_id.to_string(),
            }))
    }
}
