//! Change notifications for UI panels.
//!
//! DESIGN
//! ======
//! Panels (properties, entity lists, the undo menu) subscribe to an
//! `EventBus` owned by the session. Emission is synchronous and in
//! subscription order; handlers receive the event by reference and cannot
//! reach back into the session, so a notification can never re-enter an
//! edit in progress.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

/// Something observable about the session changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    SelectionChanged,
    /// Document contents changed (an edit, undo/redo, or a load).
    DataChanged,
    UndoStackChanged,
    FileLoaded { path: Option<String> },
    FileSaved { path: String },
    DirtyChanged(bool),
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&EditorEvent)>;

/// Synchronous multi-subscriber observer list.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("subscribers", &self.handlers.len()).finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        before != self.handlers.len()
    }

    pub fn emit(&mut self, event: &EditorEvent) {
        tracing::trace!(?event, subscribers = self.handlers.len(), "emit");
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
