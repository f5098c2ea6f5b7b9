use crate::hotspot::{HotspotId, InteractionRef, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    HotspotSelected {
        hotspot: HotspotId,
    },
    HotspotDeselected {
        hotspot: HotspotId,
    },
    InteractionFired {
        hotspot: HotspotId,
        interaction: InteractionRef,
        item: Option<ItemId>,
    },
    DoubleClickFired {
        hotspot: HotspotId,
    },
    ReachedTarget {
        hotspot: HotspotId,
    },
    MovementCancelled {
        hotspot: HotspotId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    HotspotSelected,
    HotspotDeselected,
    InteractionFired,
    DoubleClickFired,
    ReachedTarget,
    MovementCancelled,
}

impl Notification {
    pub fn kind(self) -> NotificationKind {
        match self {
            Self::HotspotSelected { .. } => NotificationKind::HotspotSelected,
            Self::HotspotDeselected { .. } => NotificationKind::HotspotDeselected,
            Self::InteractionFired { .. } => NotificationKind::InteractionFired,
            Self::DoubleClickFired { .. } => NotificationKind::DoubleClickFired,
            Self::ReachedTarget { .. } => NotificationKind::ReachedTarget,
            Self::MovementCancelled { .. } => NotificationKind::MovementCancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationCounts {
    pub total: u32,
    pub hotspot_selected: u32,
    pub hotspot_deselected: u32,
    pub interaction_fired: u32,
    pub double_click_fired: u32,
    pub reached_target: u32,
    pub movement_cancelled: u32,
}

impl NotificationCounts {
    fn record(&mut self, kind: NotificationKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            NotificationKind::HotspotSelected => {
                self.hotspot_selected = self.hotspot_selected.saturating_add(1)
            }
            NotificationKind::HotspotDeselected => {
                self.hotspot_deselected = self.hotspot_deselected.saturating_add(1)
            }
            NotificationKind::InteractionFired => {
                self.interaction_fired = self.interaction_fired.saturating_add(1)
            }
            NotificationKind::DoubleClickFired => {
                self.double_click_fired = self.double_click_fired.saturating_add(1)
            }
            NotificationKind::ReachedTarget => {
                self.reached_target = self.reached_target.saturating_add(1)
            }
            NotificationKind::MovementCancelled => {
                self.movement_cancelled = self.movement_cancelled.saturating_add(1)
            }
        }
    }
}

/// Lifetime of a subscription. Scene observers are dropped when the scene
/// deactivates; persistent ones live until explicitly removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverScope {
    Persistent,
    Scene,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&Notification)>;

struct ObserverEntry {
    id: ObserverId,
    scope: ObserverScope,
    callback: Observer,
}

/// Delivers each notification to observers as it is emitted, so listeners
/// hear about a fire before its handler runs. The step's notifications are
/// also kept until `flush` for the step report and counts.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<ObserverEntry>,
    pending: Vec<Notification>,
    last_step_counts: NotificationCounts,
}

impl ObserverRegistry {
    pub fn subscribe(
        &mut self,
        scope: ObserverScope,
        callback: impl FnMut(&Notification) + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.observers.push(ObserverEntry {
            id,
            scope,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|entry| entry.id != id);
        before != self.observers.len()
    }

    pub fn release_scope(&mut self, scope: ObserverScope) -> usize {
        let before = self.observers.len();
        self.observers.retain(|entry| entry.scope != scope);
        before - self.observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn emit(&mut self, notification: Notification) {
        for entry in &mut self.observers {
            (entry.callback)(&notification);
        }
        self.pending.push(notification);
    }

    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    pub fn flush(&mut self) -> Vec<Notification> {
        let delivered = std::mem::take(&mut self.pending);
        let mut counts = NotificationCounts::default();
        for notification in &delivered {
            counts.record(notification.kind());
        }
        self.last_step_counts = counts;
        delivered
    }

    pub fn last_step_counts(&self) -> NotificationCounts {
        self.last_step_counts
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder(registry: &mut ObserverRegistry, scope: ObserverScope) -> Rc<RefCell<Vec<Notification>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        registry.subscribe(scope, move |notification| {
            sink.borrow_mut().push(*notification)
        });
        seen
    }

    #[test]
    fn observers_hear_notifications_on_emit() {
        let mut registry = ObserverRegistry::default();
        let seen = recorder(&mut registry, ObserverScope::Persistent);
        registry.emit(Notification::HotspotSelected {
            hotspot: HotspotId(1),
        });
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(registry.pending().len(), 1);
        let delivered = registry.flush();
        assert_eq!(delivered.len(), 1);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(registry.last_step_counts().hotspot_selected, 1);
        assert!(registry.pending().is_empty());
    }

    #[test]
    fn releasing_scene_scope_keeps_persistent_observers() {
        let mut registry = ObserverRegistry::default();
        let persistent = recorder(&mut registry, ObserverScope::Persistent);
        let scene = recorder(&mut registry, ObserverScope::Scene);
        assert_eq!(registry.release_scope(ObserverScope::Scene), 1);
        registry.emit(Notification::ReachedTarget {
            hotspot: HotspotId(2),
        });
        registry.flush();
        assert_eq!(persistent.borrow().len(), 1);
        assert!(scene.borrow().is_empty());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut registry = ObserverRegistry::default();
        let seen = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&seen);
        let id = registry.subscribe(ObserverScope::Persistent, move |_| {
            *sink.borrow_mut() += 1;
        });
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.emit(Notification::DoubleClickFired {
            hotspot: HotspotId(3),
        });
        registry.flush();
        assert_eq!(*seen.borrow(), 0);
        assert_eq!(registry.last_step_counts().total, 1);
    }
}
