use crate::error::Result;
use crate::manager::Shared;
use crate::peer::engine::{EngineSession, PeerEngine};
use crate::peer::ice::CandidateRelay;
use crate::peer::state::{Listeners, SessionState};
use crate::peer::types::{ConnectOption, OfferMessage, SignalingMessage};
use crate::signaling::SignalingChannel;
use std::sync::Arc;
use tracing::{debug, info};

impl<E: PeerEngine, C: SignalingChannel> Shared<E, C> {
    /// Local-initiative path: register a session for `remote_id`, wire the
    /// requested capabilities and send the offer.
    pub(crate) async fn connect(
        self: &Arc<Self>,
        remote_id: &str,
        options: ConnectOption,
    ) -> Result<()> {
        let local_id = self.require_local_id()?;
        options.validate()?;
        info!(
            remote_id = %remote_id,
            data_channel = options.enable_data_channel,
            media_stream = options.enable_media_stream,
            "connecting"
        );

        let listeners = Listeners {
            data_channel: options.enable_data_channel,
            track: options.enable_media_stream,
        };
        let session = self.open_session(remote_id, listeners).await?;
        let engine = session.engine();

        if options.enable_data_channel {
            // reaches on_data_channel through the engine's open event
            engine
                .create_data_channel(&self.config.data_channel_label)
                .await?;
        }
        if options.enable_media_stream {
            self.attach_media(&session).await?;
        }
        session.advance(SessionState::Negotiating);

        let offer = engine.create_offer().await?;
        engine.set_local_description(offer.clone()).await?;

        self.signaling.emit(SignalingMessage::Offer(OfferMessage {
            offer,
            offer_socket_id: local_id,
            answer_socket_id: remote_id.to_string(),
            enable_data_channel: options.enable_data_channel,
            enable_media_stream: options.enable_media_stream,
        }))?;
        debug!(remote_id = %remote_id, "offer sent");

        CandidateRelay::new(&self.signaling).flush(&session)
    }
}
