//! Screen-wide notifications icons subscribe to.

use bitflags::bitflags;
use indexmap::IndexMap;

bitflags! {
    /// What part of the icon appearance changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AppearanceFlags: u8 {
        const TEXTURE = 1 << 0;
        const FONT = 1 << 1;
        const COLOR = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    IconAppearanceChanged(AppearanceFlags),
    IconTileChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    IconAppearanceChanged,
    IconTileChanged,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::IconAppearanceChanged(_) => NotificationKind::IconAppearanceChanged,
            Notification::IconTileChanged => NotificationKind::IconTileChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Maps notification kinds to the observers interested in them.
///
/// Posting does not call anything: it returns the observers so that the
/// caller, which owns them, can dispatch.
#[derive(Debug)]
pub struct NotificationCenter<T> {
    next_id: u64,
    subscriptions: IndexMap<SubscriptionId, (NotificationKind, T)>,
}

impl<T> Default for NotificationCenter<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscriptions: IndexMap::new(),
        }
    }
}

impl<T: Copy + PartialEq> NotificationCenter<T> {
    pub fn subscribe(&mut self, kind: NotificationKind, observer: T) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.insert(id, (kind, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.subscriptions.shift_remove(&id).is_none() {
            tracing::debug!("unknown subscription {:?}", id);
        }
    }

    /// Observers of `notification`, in subscription order.
    pub fn post(&self, notification: &Notification) -> Vec<T> {
        let kind = notification.kind();
        let mut observers: Vec<T> = Vec::new();
        for (subscribed, observer) in self.subscriptions.values() {
            if *subscribed == kind && !observers.contains(observer) {
                observers.push(*observer);
            }
        }
        observers
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_reaches_subscribers_of_kind() {
        let mut center = NotificationCenter::default();
        center.subscribe(NotificationKind::IconTileChanged, 1);
        center.subscribe(NotificationKind::IconAppearanceChanged, 2);
        center.subscribe(NotificationKind::IconTileChanged, 3);

        assert_eq!(center.post(&Notification::IconTileChanged), vec![1, 3]);
        assert_eq!(
            center.post(&Notification::IconAppearanceChanged(AppearanceFlags::FONT)),
            vec![2]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut center = NotificationCenter::default();
        let id = center.subscribe(NotificationKind::IconTileChanged, 1);
        center.unsubscribe(id);
        center.unsubscribe(id);

        assert!(center.post(&Notification::IconTileChanged).is_empty());
        assert!(center.is_empty());
    }
}
