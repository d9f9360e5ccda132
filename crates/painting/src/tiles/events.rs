//! Change notifications raised by a tile set.

use std::fmt;

use crate::types::TileId;

/// Events raised after a tile set changes.
///
/// Listeners receive the id only; they read pixels back through the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSetEvent {
    /// A new definition was created (including duplicates).
    TileAdded { id: TileId },
    /// A definition's canonical pixels were replaced.
    TileUpdated { id: TileId },
    /// A definition was removed. Its id is never handed out again.
    TileRemoved { id: TileId },
}

/// Handle returned by [`TileSet::subscribe`](super::TileSet::subscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&TileSetEvent) + Send + Sync>;

/// Registered observers, in subscription order.
#[derive(Default)]
pub(crate) struct TileListeners {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for TileListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileListeners")
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl TileListeners {
    pub(crate) fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&TileSetEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub(crate) fn emit(&self, event: TileSetEvent) {
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}
