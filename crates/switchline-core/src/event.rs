//! Typed event system with pre-allocated ring buffers.
//!
//! The session emits events while authoring and while ticking, then delivers
//! them in one batch at the end of each call. Each event kind has its own
//! [`EventBuffer`] ring buffer with a configurable capacity. Rendering, audio
//! and progress layers subscribe with passive listeners.
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that kind.

use crate::color::Color;
use crate::fixed::Millis;
use crate::grid::GridPosition;
use crate::id::{AgentId, OutletId, StationId};
use crate::sim::{Completion, FailureReason};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// An engine event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Authoring --
    PathChanged {
        outlet: OutletId,
        length: usize,
    },
    PathsCleared,
    JunctionToggled {
        position: GridPosition,
        owner: OutletId,
    },

    // -- Run lifecycle --
    RunStarted {
        agents: usize,
    },
    RunStopped,
    RunCompleted(Completion),

    // -- Agents --
    AgentReleased {
        agent: AgentId,
        outlet: OutletId,
        at: Millis,
    },
    ColorChanged {
        agent: AgentId,
        position: GridPosition,
        from: Color,
        to: Color,
    },
    AgentArrived {
        agent: AgentId,
        station: StationId,
    },
    AgentFailed {
        agent: AgentId,
        reason: FailureReason,
    },

    // -- Collisions --
    /// Explosion effect for the rendering layer.
    Crash {
        first: AgentId,
        second: AgentId,
        position: GridPosition,
    },
    Merge {
        survivor: AgentId,
        absorbed: AgentId,
        position: GridPosition,
        color: Color,
    },
    Cross {
        first: AgentId,
        second: AgentId,
        position: GridPosition,
        mixed: Option<Color>,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PathChanged,
    PathsCleared,
    JunctionToggled,
    RunStarted,
    RunStopped,
    RunCompleted,
    AgentReleased,
    ColorChanged,
    AgentArrived,
    AgentFailed,
    Crash,
    Merge,
    Cross,
}

const EVENT_KIND_COUNT: usize = 13;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PathChanged { .. } => EventKind::PathChanged,
            Event::PathsCleared => EventKind::PathsCleared,
            Event::JunctionToggled { .. } => EventKind::JunctionToggled,
            Event::RunStarted { .. } => EventKind::RunStarted,
            Event::RunStopped => EventKind::RunStopped,
            Event::RunCompleted(_) => EventKind::RunCompleted,
            Event::AgentReleased { .. } => EventKind::AgentReleased,
            Event::ColorChanged { .. } => EventKind::ColorChanged,
            Event::AgentArrived { .. } => EventKind::AgentArrived,
            Event::AgentFailed { .. } => EventKind::AgentFailed,
            Event::Crash { .. } => EventKind::Crash,
            Event::Merge { .. } => EventKind::Merge,
            Event::Cross { .. } => EventKind::Cross,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer for events; when full, the oldest events are
/// dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        // Once full, head points at the oldest entry.
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let capacity = self.capacity();
        (0..self.len).filter_map(move |i| self.events[(start + i) % capacity].as_ref())
    }

    /// Drop buffered events. `total_written` is kept.
    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// One ring buffer per event kind, listeners per kind and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<PassiveListener>; EVENT_KIND_COUNT],
    default_capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
        }
    }

    /// Suppressed kinds are never allocated or buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Record an event for the next delivery.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Listeners run in registration order during delivery.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Hand every buffered event to its listeners, oldest first, then clear
    /// the buffers.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }
            for event in buffer.iter() {
                for listener in &mut self.listeners[idx] {
                    listener(event);
                }
            }
            buffer.clear();
        }
    }

    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Events emitted for a kind since creation, including delivered and dropped ones.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.total_written())
            .unwrap_or(0)
    }

    /// Clear all buffers. Listeners and suppression settings stay.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
