use std::collections::BTreeMap;

use foundation::ListenerId;

/// Map surface events the viewer reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    /// The viewport settled after a pan/zoom/rotate.
    MoveEnd,
    /// A new basemap style finished loading; previously added sources and
    /// layers are gone at this point.
    StyleLoad,
}

/// One delivery of an event to one registered listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MapEvent {
    pub listener: ListenerId,
    pub kind: MapEventKind,
}

/// Listener table keyed by the token returned from `subscribe`.
///
/// Delivery order is ascending token order, i.e. registration order.
#[derive(Debug, Default)]
pub struct EventBus {
    next_id: u64,
    listeners: BTreeMap<ListenerId, MapEventKind>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: MapEventKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId::new(self.next_id);
        self.listeners.insert(id, kind);
        id
    }

    /// Returns `true` if the token was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn listeners_for(&self, kind: MapEventKind) -> impl Iterator<Item = ListenerId> + '_ {
        self.listeners
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(id, _)| *id)
    }

    /// Fan an event out to every listener registered for `kind`.
    pub fn emit(&self, kind: MapEventKind) -> Vec<MapEvent> {
        self.listeners_for(kind)
            .map(|listener| MapEvent { listener, kind })
            .collect()
    }
}
