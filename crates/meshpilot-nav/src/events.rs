use std::collections::BTreeMap;
use std::fmt;

use meshpilot_geom::Vec2;

use crate::agents::AgentId;
use crate::graph::NodeId;
use crate::layers::FilterKind;
use crate::obstacles::{EdgeId, ObstacleId};
use crate::pathfinder::PathEndpoint;

/// Discriminant of a [`NavEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    PolygonAdded,
    GraphBuilt,
    GraphUpdated,
    ObstacleAdded,
    ObstacleRemoved,
    PathRequested,
    PathFound,
    PathBlocked,
    AgentCreated,
    AgentPathUpdated,
    AgentUpdated,
    LayerRegistered,
    FilterAdded,
    ProfileRegistered,
    Error,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::PolygonAdded => "polygon-added",
            EventKind::GraphBuilt => "graph-built",
            EventKind::GraphUpdated => "graph-updated",
            EventKind::ObstacleAdded => "obstacle-added",
            EventKind::ObstacleRemoved => "obstacle-removed",
            EventKind::PathRequested => "path-requested",
            EventKind::PathFound => "path-found",
            EventKind::PathBlocked => "path-blocked",
            EventKind::AgentCreated => "agent-created",
            EventKind::AgentPathUpdated => "agent-path-updated",
            EventKind::AgentUpdated => "agent-updated",
            EventKind::LayerRegistered => "layer-registered",
            EventKind::FilterAdded => "filter-added",
            EventKind::ProfileRegistered => "profile-registered",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What caused a `GraphUpdated` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphChange {
    ObstacleAdded,
    ObstacleRemoved,
    ObstacleUpdated,
    BlockedEdgesApplied,
    FilterAdded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    PolygonAdded {
        node: NodeId,
        layer: String,
    },
    GraphBuilt {
        nodes: usize,
        edges: usize,
        obstacle_aware: bool,
    },
    GraphUpdated {
        change: GraphChange,
    },
    ObstacleAdded {
        id: ObstacleId,
        blocked_edges: Vec<EdgeId>,
    },
    ObstacleRemoved {
        id: ObstacleId,
        unblocked_edges: Vec<EdgeId>,
    },
    PathRequested {
        start: PathEndpoint,
        end: PathEndpoint,
    },
    PathFound {
        nodes: Vec<NodeId>,
        complete: bool,
    },
    PathBlocked {
        start: PathEndpoint,
        end: PathEndpoint,
    },
    AgentCreated {
        agent: AgentId,
    },
    AgentPathUpdated {
        agent: AgentId,
        points: Vec<Vec2>,
    },
    AgentUpdated {
        agent: AgentId,
        position: Vec2,
    },
    LayerRegistered {
        name: String,
    },
    FilterAdded {
        layer: String,
        kind: FilterKind,
    },
    ProfileRegistered {
        name: String,
    },
    Error {
        operation: &'static str,
        message: String,
    },
}

impl NavEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NavEvent::PolygonAdded { .. } => EventKind::PolygonAdded,
            NavEvent::GraphBuilt { .. } => EventKind::GraphBuilt,
            NavEvent::GraphUpdated { .. } => EventKind::GraphUpdated,
            NavEvent::ObstacleAdded { .. } => EventKind::ObstacleAdded,
            NavEvent::ObstacleRemoved { .. } => EventKind::ObstacleRemoved,
            NavEvent::PathRequested { .. } => EventKind::PathRequested,
            NavEvent::PathFound { .. } => EventKind::PathFound,
            NavEvent::PathBlocked { .. } => EventKind::PathBlocked,
            NavEvent::AgentCreated { .. } => EventKind::AgentCreated,
            NavEvent::AgentPathUpdated { .. } => EventKind::AgentPathUpdated,
            NavEvent::AgentUpdated { .. } => EventKind::AgentUpdated,
            NavEvent::LayerRegistered { .. } => EventKind::LayerRegistered,
            NavEvent::FilterAdded { .. } => EventKind::FilterAdded,
            NavEvent::ProfileRegistered { .. } => EventKind::ProfileRegistered,
            NavEvent::Error { .. } => EventKind::Error,
        }
    }
}

/// Handle returned by [`EventBus::on`] / [`EventBus::on_any`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&NavEvent) + Send>;

/// Synchronous publish/subscribe hub.
///
/// Listeners run on the emitting thread, before `emit` returns. Global listeners see every
/// event and run first; kind-specific listeners follow, each list in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: BTreeMap<EventKind, Vec<(ListenerId, Listener)>>,
    global: Vec<(ListenerId, Listener)>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&NavEvent) + Send + 'static,
    {
        let id = self.allocate_id();
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    pub fn on_any<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&NavEvent) + Send + 'static,
    {
        let id = self.allocate_id();
        self.global.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed to `kind`.
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        before != list.len()
    }

    pub fn off_any(&mut self, id: ListenerId) -> bool {
        let before = self.global.len();
        self.global.retain(|(lid, _)| *lid != id);
        before != self.global.len()
    }

    pub fn listener_count(&self) -> usize {
        self.global.len() + self.listeners.values().map(Vec::len).sum::<usize>()
    }

    pub fn emit(&mut self, event: NavEvent) {
        let kind = event.kind();
        tracing::trace!(event = %kind, "emit");
        for (_, listener) in &mut self.global {
            listener(&event);
        }
        if let Some(list) = self.listeners.get_mut(&kind) {
            for (_, listener) in list {
                listener(&event);
            }
        }
    }
}
