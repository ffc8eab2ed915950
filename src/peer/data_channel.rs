use crate::peer::connection::WebRtcSession;
use crate::peer::engine::{EngineEvent, EngineEventSender};
use std::sync::Arc;
use tracing::debug;
use webrtc::data_channel::RTCDataChannel;

/// обработчики для data-channel, созданного локально
pub fn attach_dc(dc: &Arc<RTCDataChannel>, events: EngineEventSender<WebRtcSession>) {
    let label = dc.label().to_string();
    debug!(label = %label, "attaching local data channel handlers");

    // слабая ссылка: канал не должен держать сам себя через свой обработчик
    let weak = Arc::downgrade(dc);
    dc.on_open(Box::new(move || {
        if let Some(dc) = weak.upgrade() {
            debug!(label = %dc.label(), "data channel opened");
            let _ = events.send(EngineEvent::DataChannelOpen(dc));
        }
        Box::pin(async {})
    }));

    dc.on_close(Box::new(move || {
        debug!(label = %label, "data channel closed");
        Box::pin(async {})
    }));
}
