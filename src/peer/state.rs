use crate::peer::engine::EngineSession;
use crate::peer::types::IceCandidate;
use parking_lot::Mutex;
use std::sync::Arc;

/// Состояние сессии с удалённым пиром
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Negotiating,
    Established,
    Closed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

/// Пассивные обработчики, подключённые к сессии
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Listeners {
    pub data_channel: bool,
    pub track: bool,
}

/// Локальные кандидаты ждут, пока наш offer или answer не уйдёт пиру
#[derive(Debug)]
enum OutboundGate {
    Held(Vec<IceCandidate>),
    Open,
}

/// Сессия с одним удалённым пиром (в процессе согласования или уже согласованная)
pub struct Session<P: EngineSession> {
    remote_id: String,
    serial: u64,
    engine: Arc<P>,
    state: Mutex<SessionState>,
    listeners: Listeners,
    gate: Mutex<OutboundGate>,
}

impl<P: EngineSession> Session<P> {
    pub(crate) fn new(
        remote_id: String,
        serial: u64,
        engine: Arc<P>,
        listeners: Listeners,
    ) -> Self {
        Self {
            remote_id,
            serial,
            engine,
            state: Mutex::new(SessionState::Idle),
            listeners,
            gate: Mutex::new(OutboundGate::Held(Vec::new())),
        }
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn engine(&self) -> &Arc<P> {
        &self.engine
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Переход в `state`, если сессия ещё не закрыта
    pub(crate) fn advance(&self, state: SessionState) {
        let mut current = self.state.lock();
        if !current.is_terminal() {
            *current = state;
        }
    }

    pub(crate) fn close(&self) {
        *self.state.lock() = SessionState::Closed;
    }

    pub fn listeners(&self) -> Listeners {
        self.listeners
    }

    /// Возвращает кандидата для немедленной отправки либо ставит его в очередь
    /// до вызова [`Session::open_gate`]
    pub(crate) fn hold_or_pass(&self, candidate: IceCandidate) -> Option<IceCandidate> {
        match &mut *self.gate.lock() {
            OutboundGate::Held(pending) => {
                pending.push(candidate);
                None
            }
            OutboundGate::Open => Some(candidate),
        }
    }

    /// Открывает шлюз и отдаёт накопленных кандидатов в порядке обнаружения
    pub(crate) fn open_gate(&self) -> Vec<IceCandidate> {
        match std::mem::replace(&mut *self.gate.lock(), OutboundGate::Open) {
            OutboundGate::Held(pending) => pending,
            OutboundGate::Open => Vec::new(),
        }
    }
}

/// Снимок состояния сессии для внешнего кода
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub remote_id: String,
    pub state: SessionState,
    pub listeners: Listeners,
}

impl<P: EngineSession> From<&Session<P>> for SessionInfo {
    fn from(session: &Session<P>) -> Self {
        Self {
            remote_id: session.remote_id.clone(),
            state: session.state(),
            listeners: session.listeners(),
        }
    }
}
