use crate::error::{ConnectorError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Active sessions keyed by remote socket id. At most one entry per id.
#[derive(Debug)]
pub struct ConnectionRegistry<S> {
    connections: HashMap<String, Arc<S>>,
}

impl<S> Default for ConnectionRegistry<S> {
    fn default() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }
}

impl<S> ConnectionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, socket_id: &str, session: Arc<S>) -> Result<()> {
        if self.connections.contains_key(socket_id) {
            return Err(ConnectorError::DuplicateConnection(socket_id.to_string()));
        }
        self.connections.insert(socket_id.to_string(), session);
        Ok(())
    }

    pub fn get(&self, socket_id: &str) -> Result<Arc<S>> {
        self.connections
            .get(socket_id)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(socket_id.to_string()))
    }

    /// Deletes the entry; the id can be registered again right away.
    pub fn remove(&mut self, socket_id: &str) -> Result<Arc<S>> {
        self.connections
            .remove(socket_id)
            .ok_or_else(|| ConnectorError::NotFound(socket_id.to_string()))
    }

    pub fn contains(&self, socket_id: &str) -> bool {
        self.connections.contains_key(socket_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.connections.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_the_same_session() {
        let mut registry = ConnectionRegistry::new();
        let session = Arc::new("pc-1");
        registry.set("b", session.clone()).unwrap();

        assert!(Arc::ptr_eq(&registry.get("b").unwrap(), &session));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_set_is_rejected_and_keeps_the_original() {
        let mut registry = ConnectionRegistry::new();
        registry.set("b", Arc::new(1)).unwrap();

        let err = registry.set("b", Arc::new(2)).unwrap_err();
        assert!(matches!(err, ConnectorError::DuplicateConnection(id) if id == "b"));
        assert_eq!(*registry.get("b").unwrap(), 1);
    }

    #[test]
    fn get_and_remove_of_unknown_id_fail() {
        let mut registry: ConnectionRegistry<u8> = ConnectionRegistry::new();
        assert!(matches!(registry.get("x"), Err(ConnectorError::NotFound(_))));
        assert!(matches!(registry.remove("x"), Err(ConnectorError::NotFound(_))));
    }

    #[test]
    fn removed_id_is_gone_and_reusable() {
        let mut registry = ConnectionRegistry::new();
        registry.set("b", Arc::new(1)).unwrap();
        registry.remove("b").unwrap();

        assert!(!registry.contains("b"));
        assert!(matches!(registry.get("b"), Err(ConnectorError::NotFound(_))));
        assert!(matches!(registry.remove("b"), Err(ConnectorError::NotFound(_))));

        registry.set("b", Arc::new(2)).unwrap();
        assert_eq!(*registry.get("b").unwrap(), 2);
    }

    #[test]
    fn ids_are_sorted() {
        let mut registry = ConnectionRegistry::new();
        for id in ["c", "a", "b"] {
            registry.set(id, Arc::new(())).unwrap();
        }
        assert_eq!(registry.ids(), vec!["a", "b", "c"]);
        assert!(!registry.is_empty());
    }
}
