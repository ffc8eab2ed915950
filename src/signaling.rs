use crate::error::{ConnectorError, Result};
use crate::peer::types::SignalingMessage;
use crate::utils::random_id;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// The external signaling transport, seen from the mediator.
pub trait SignalingChannel: Send + Sync + 'static {
    /// Id the signaling server assigned to this endpoint, if connected.
    fn local_id(&self) -> Option<String>;

    /// Sends `message` as a named event.
    fn emit(&self, message: SignalingMessage) -> Result<()>;
}

/// In-process signaling channel: emitted messages go to an mpsc receiver.
pub struct ChannelSignaling {
    local_id: RwLock<Option<String>>,
    outbound: mpsc::UnboundedSender<SignalingMessage>,
}

impl ChannelSignaling {
    pub fn new(
        local_id: Option<String>,
    ) -> (Self, mpsc::UnboundedReceiver<SignalingMessage>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let channel = Self {
            local_id: RwLock::new(local_id),
            outbound,
        };
        (channel, rx)
    }

    /// Channel with a freshly generated local id.
    pub fn with_random_id() -> (Self, mpsc::UnboundedReceiver<SignalingMessage>) {
        Self::new(Some(random_id()))
    }

    pub fn set_local_id(&self, local_id: Option<String>) {
        *self.local_id.write() = local_id;
    }
}

impl SignalingChannel for ChannelSignaling {
    fn local_id(&self) -> Option<String> {
        self.local_id.read().clone()
    }

    fn emit(&self, message: SignalingMessage) -> Result<()> {
        self.outbound
            .send(message)
            .map_err(|e| ConnectorError::Signaling(format!("{} not delivered", e.0.event_name())))
    }
}

struct Worker {
    tx: mpsc::UnboundedSender<SignalingMessage>,
    handle: JoinHandle<()>,
}

/// Per-sender queues for inbound signaling. Messages from one remote id are
/// handled one after another in arrival order; different remote ids are
/// handled concurrently.
#[derive(Default)]
pub(crate) struct PeerQueues {
    workers: HashMap<String, Worker>,
    retiring: HashMap<String, JoinHandle<()>>,
}

impl PeerQueues {
    /// Queues `message` for its sender. Workers of ids that are no longer
    /// `active` are retired first; a replacement worker only starts once the
    /// retired one has drained, so per-id ordering survives the handover.
    pub(crate) fn dispatch<A, F, Fut>(&mut self, message: SignalingMessage, active: A, handler: F)
    where
        A: Fn(&str) -> bool,
        F: Fn(SignalingMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.retiring.retain(|_, handle| !handle.is_finished());
        let idle: Vec<String> = self
            .workers
            .keys()
            .filter(|id| !active(id))
            .cloned()
            .collect();
        for id in idle {
            if let Some(worker) = self.workers.remove(&id) {
                trace!(remote_id = %id, "retiring signaling worker");
                // dropping the sender lets the worker drain and exit
                self.retiring.insert(id, worker.handle);
            }
        }

        let sender = message.sender_id().to_string();
        let message = match self.workers.get(&sender) {
            Some(worker) => match worker.tx.send(message) {
                Ok(()) => return,
                Err(e) => e.0,
            },
            None => message,
        };

        let previous = self.retiring.remove(&sender);
        let (tx, mut rx) = mpsc::unbounded_channel::<SignalingMessage>();
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            while let Some(message) = rx.recv().await {
                handler(message).await;
            }
        });
        // a fresh receiver is alive, so this send cannot fail
        let _ = tx.send(message);
        self.workers.insert(sender, Worker { tx, handle });
    }
}
