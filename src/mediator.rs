//! Inbound half of the signaling protocol.
//!
//! Per remote id: an `offer` opens a session and answers it, an `answer`
//! completes a session this side offered, a `candidate` feeds the engine of
//! an existing session.

use crate::error::Result;
use crate::logger::dump_candidate;
use crate::manager::Shared;
use crate::peer::engine::{EngineSession, PeerEngine};
use crate::peer::ice::CandidateRelay;
use crate::peer::state::{Listeners, SessionState};
use crate::peer::types::{AnswerMessage, CandidateMessage, OfferMessage, SignalingMessage};
use crate::signaling::SignalingChannel;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl<E: PeerEngine, C: SignalingChannel> Shared<E, C> {
    pub(crate) async fn handle_signal(
        self: &Arc<Self>,
        message: SignalingMessage,
    ) -> Result<()> {
        if let Some(local_id) = self.signaling.local_id() {
            if message.recipient_id() != local_id {
                warn!(
                    event = message.event_name(),
                    recipient = %message.recipient_id(),
                    local_id = %local_id,
                    "signaling message addressed to another socket"
                );
            }
        }

        match message {
            SignalingMessage::Offer(offer) => self.on_offer(offer).await,
            SignalingMessage::Answer(answer) => self.on_answer(answer).await,
            SignalingMessage::Candidate(candidate) => self.on_candidate(candidate).await,
        }
    }

    async fn on_offer(self: &Arc<Self>, msg: OfferMessage) -> Result<()> {
        let local_id = self.require_local_id()?;
        let options = msg.options();
        let remote_id = msg.offer_socket_id;
        info!(
            remote_id = %remote_id,
            data_channel = options.enable_data_channel,
            media_stream = options.enable_media_stream,
            "offer received"
        );

        // the offerer creates the data channel, this side only listens for it
        let listeners = Listeners {
            data_channel: options.enable_data_channel,
            track: options.enable_media_stream,
        };
        let session = self.open_session(&remote_id, listeners).await?;
        if options.enable_media_stream {
            self.attach_media(&session).await?;
        }
        session.advance(SessionState::Negotiating);

        let engine = session.engine();
        engine.set_remote_description(msg.offer).await?;
        let answer = engine.create_answer().await?;
        engine.set_local_description(answer.clone()).await?;

        self.signaling.emit(SignalingMessage::Answer(AnswerMessage {
            answer,
            answer_socket_id: local_id,
            offer_socket_id: remote_id.clone(),
        }))?;
        session.advance(SessionState::Established);
        debug!(remote_id = %remote_id, "answer sent");

        CandidateRelay::new(&self.signaling).flush(&session)
    }

    async fn on_answer(&self, msg: AnswerMessage) -> Result<()> {
        let session = self.lookup(&msg.answer_socket_id)?;
        info!(remote_id = %msg.answer_socket_id, "answer received");

        session.engine().set_remote_description(msg.answer).await?;
        session.advance(SessionState::Established);
        Ok(())
    }

    async fn on_candidate(&self, msg: CandidateMessage) -> Result<()> {
        let session = self.lookup(&msg.from_socket_id)?;
        dump_candidate("REMOTE", &msg.from_socket_id, &msg.candidate);

        session.engine().add_ice_candidate(msg.candidate).await
    }
}
