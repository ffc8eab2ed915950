use crate::peer::engine::EngineSession;
use std::sync::Arc;
use tracing::trace;

type DataChannelFn<P> = dyn Fn(&str, <P as EngineSession>::DataChannel) + Send + Sync;
type TrackFn<P> = dyn Fn(&str, Vec<<P as EngineSession>::MediaStream>) + Send + Sync;
type SessionCreatedFn<P> = dyn Fn(&str, Arc<P>) + Send + Sync;

/// Consumer callbacks. Every callback is optional and receives the remote
/// socket id the event belongs to.
pub struct ConnectionHandler<P: EngineSession> {
    on_data_channel: Option<Box<DataChannelFn<P>>>,
    on_track: Option<Box<TrackFn<P>>>,
    on_session_created: Option<Box<SessionCreatedFn<P>>>,
}

impl<P: EngineSession> Default for ConnectionHandler<P> {
    fn default() -> Self {
        Self {
            on_data_channel: None,
            on_track: None,
            on_session_created: None,
        }
    }
}

impl<P: EngineSession> ConnectionHandler<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_data_channel(
        mut self,
        f: impl Fn(&str, P::DataChannel) + Send + Sync + 'static,
    ) -> Self {
        self.on_data_channel = Some(Box::new(f));
        self
    }

    pub fn on_track(
        mut self,
        f: impl Fn(&str, Vec<P::MediaStream>) + Send + Sync + 'static,
    ) -> Self {
        self.on_track = Some(Box::new(f));
        self
    }

    pub fn on_session_created(mut self, f: impl Fn(&str, Arc<P>) + Send + Sync + 'static) -> Self {
        self.on_session_created = Some(Box::new(f));
        self
    }
}

/// Forwards engine lifecycle events to the consumer's [`ConnectionHandler`].
pub struct EventDispatcher<P: EngineSession> {
    handler: ConnectionHandler<P>,
}

impl<P: EngineSession> EventDispatcher<P> {
    pub fn new(handler: ConnectionHandler<P>) -> Self {
        Self { handler }
    }

    pub fn session_created(&self, remote_id: &str, engine: &Arc<P>) {
        match &self.handler.on_session_created {
            Some(f) => f(remote_id, Arc::clone(engine)),
            None => trace!(remote_id = %remote_id, "no session-created callback"),
        }
    }

    pub fn data_channel(&self, remote_id: &str, channel: P::DataChannel) {
        match &self.handler.on_data_channel {
            Some(f) => f(remote_id, channel),
            None => trace!(remote_id = %remote_id, "no data-channel callback"),
        }
    }

    pub fn track(&self, remote_id: &str, streams: Vec<P::MediaStream>) {
        match &self.handler.on_track {
            Some(f) => f(remote_id, streams),
            None => trace!(remote_id = %remote_id, "no track callback"),
        }
    }
}
