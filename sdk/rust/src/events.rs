//! Filter lifecycle events and listener registry

use std::fmt;

/// Notification emitted by [`crate::FilterManager`]
///
/// Events carry the filter's short name rather than a reference; listeners
/// that need the full filter look it up on the manager afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    FilterAdded { short_name: String },
    FilterRemoved { short_name: String },
    FilterChanged {
        short_name: String,
        selected_value: Option<String>,
    },
    PileInfoLoaded,
    CharacterGroupsChanged,
    DefaultFiltersLoaded,
}

type Listener = Box<dyn Fn(&FilterEvent) + Send + Sync>;

/// Listener set, called synchronously in registration order
#[derive(Default)]
pub struct Listeners {
    listeners: Vec<Listener>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&FilterEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&self, event: FilterEvent) {
        tracing::trace!(event = ?event, listeners = self.listeners.len(), "Emitting filter event");
        for listener in &self.listeners {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_reaches_all_listeners_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();

        let first = seen.clone();
        listeners.subscribe(move |e| first.lock().unwrap().push(("first", e.clone())));
        let second = seen.clone();
        listeners.subscribe(move |e| second.lock().unwrap().push(("second", e.clone())));

        listeners.emit(FilterEvent::PileInfoLoaded);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("first", FilterEvent::PileInfoLoaded),
                ("second", FilterEvent::PileInfoLoaded),
            ]
        );
    }

    #[test]
    fn test_emit_without_listeners() {
        let listeners = Listeners::new();
        assert!(listeners.is_empty());
        listeners.emit(FilterEvent::DefaultFiltersLoaded);
    }
}
