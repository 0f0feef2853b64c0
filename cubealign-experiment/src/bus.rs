//! Synchronous lifecycle event multicast.
//!
//! Handlers run on the publishing thread, in subscription order, before
//! [`EventBus::publish`] returns. Handlers never receive a reference to the
//! bus, so subscribing or unsubscribing from inside a handler is not
//! possible; collaborators that need to react must be captured by the
//! handler itself.

use cubealign_core::LifecycleEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type EventHandler = Box<dyn FnMut(LifecycleEvent)>;
type LabelHandler = Box<dyn FnMut(&str)>;

struct Subscription {
    id: SubscriptionId,
    kinds: Vec<LifecycleEvent>,
    handler: EventHandler,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
    label_handlers: Vec<(SubscriptionId, LabelHandler)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: LifecycleEvent,
        handler: impl FnMut(LifecycleEvent) + 'static,
    ) -> SubscriptionId {
        self.subscribe_many(&[kind], handler)
    }

    /// One handler for several event kinds.
    pub fn subscribe_many(
        &mut self,
        kinds: &[LifecycleEvent],
        handler: impl FnMut(LifecycleEvent) + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.subscriptions.push(Subscription {
            id,
            kinds: kinds.to_vec(),
            handler: Box::new(handler),
        });
        id
    }

    /// Receives the label of every labelled event, after that event's own handlers.
    pub fn subscribe_labels(&mut self, handler: impl FnMut(&str) + 'static) -> SubscriptionId {
        let id = self.allocate_id();
        self.label_handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len() + self.label_handlers.len();
        self.subscriptions.retain(|s| s.id != id);
        self.label_handlers.retain(|(sid, _)| *sid != id);
        before != self.subscriptions.len() + self.label_handlers.len()
    }

    pub fn publish(&mut self, event: LifecycleEvent) {
        for sub in self.subscriptions.iter_mut() {
            if sub.kinds.contains(&event) {
                (sub.handler)(event);
            }
        }
        if let Some(label) = event.label() {
            for (_, handler) in self.label_handlers.iter_mut() {
                handler(label);
            }
        }
    }

    pub fn subscriber_count(&self, kind: LifecycleEvent) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.kinds.contains(&kind))
            .count()
    }

    pub fn label_subscriber_count(&self) -> usize {
        self.label_handlers.len()
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("label_handlers", &self.label_handlers.len())
            .finish()
    }
}
