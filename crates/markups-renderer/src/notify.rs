//! Render notifications from the host engine.
//!
//! The host owns one [`RenderNotifier`] per engine context and publishes
//! exactly one [`RenderEvent::RenderCompleted`] per completed render of a
//! target, before it accepts the next render request for that target.

use crate::target::RenderTargetId;

/// Event published by the host render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
    /// A full render of the target finished.
    RenderCompleted(RenderTargetId),
    /// The target was destroyed.
    TargetDestroyed(RenderTargetId),
}

impl RenderEvent {
    /// Returns the target the event refers to.
    pub fn target(&self) -> RenderTargetId {
        match self {
            RenderEvent::RenderCompleted(target) | RenderEvent::TargetDestroyed(target) => *target,
        }
    }
}

/// Handle returned by [`RenderNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&RenderEvent) + Send>;

/// Subscription stream for render events.
pub struct RenderNotifier {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl RenderNotifier {
    /// Creates a notifier with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a listener. Listeners are called in subscription order.
    pub fn subscribe(&mut self, listener: impl FnMut(&RenderEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Delivers an event to every listener.
    pub fn notify(&mut self, event: RenderEvent) {
        tracing::trace!("Render event {:?} to {} listeners", event, self.listeners.len());
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    /// Publishes [`RenderEvent::RenderCompleted`].
    pub fn render_completed(&mut self, target: RenderTargetId) {
        self.notify(RenderEvent::RenderCompleted(target));
    }

    /// Publishes [`RenderEvent::TargetDestroyed`].
    pub fn target_destroyed(&mut self, target: RenderTargetId) {
        self.notify(RenderEvent::TargetDestroyed(target));
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for RenderNotifier {
    fn default() -> Self {
        Self::new()
    }
}
