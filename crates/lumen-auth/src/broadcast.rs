//! Auth state broadcaster.
//!
//! An explicit observer registry over session changes. Observers register
//! a callback and get back a [`Subscription`] handle; every emission
//! invokes the callbacks in registration order with the event tag and the
//! new session (or `None`). Unsubscribing is idempotent: the handle can
//! be cancelled any number of times, and cancellation also runs on drop.

use crate::session::Session;
use std::sync::{Arc, Mutex, Weak};

/// What changed about the authoritative session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// First resolution during bootstrap (session or none)
    InitialSession,
    /// A session was installed after a sign-in or sign-up
    SignedIn,
    /// The session was torn down
    SignedOut,
    /// The session's tokens were replaced by a refresh
    TokenRefreshed,
    /// The user record behind the session changed
    UserUpdated,
    /// A password-recovery link installed the session
    PasswordRecovery,
}

/// Observer callback. Receives the event tag and the new session.
pub type AuthCallback = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

struct Registry {
    next_id: u64,
    listeners: Vec<(u64, AuthCallback)>,
}

/// Ordered observer registry for session changes.
#[derive(Clone)]
pub struct AuthBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl AuthBroadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register an observer. Callbacks fire in registration order on
    /// every emission until the returned handle is cancelled.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(callback)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Notify every observer, in registration order.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        // Snapshot the callbacks so an observer may subscribe or
        // unsubscribe from inside its callback without deadlocking.
        let callbacks: Vec<AuthCallback> = {
            let registry = self.registry.lock().unwrap();
            registry.listeners.iter().map(|(_, cb)| cb.clone()).collect()
        };

        for callback in callbacks {
            callback(event, session);
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry.lock().unwrap().listeners.len()
    }

    /// True when nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuthBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation handle returned by [`AuthBroadcaster::subscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the observer. Safe to call more than once; removing an
    /// already-removed observer is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap();
            registry.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callbacks_fire_in_registration_order() {
        let broadcaster = AuthBroadcaster::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_a = order.clone();
        let _sub_a = broadcaster.subscribe(move |_, _| order_a.lock().unwrap().push("a"));
        let order_b = order.clone();
        let _sub_b = broadcaster.subscribe(move |_, _| order_b.lock().unwrap().push("b"));
        let order_c = order.clone();
        let _sub_c = broadcaster.subscribe(move |_, _| order_c.lock().unwrap().push("c"));

        broadcaster.emit(AuthEvent::SignedIn, None);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let broadcaster = AuthBroadcaster::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let sub = broadcaster.subscribe(move |_, _| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        broadcaster.emit(AuthEvent::SignedIn, None);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        broadcaster.emit(AuthEvent::SignedOut, None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(broadcaster.is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let broadcaster = AuthBroadcaster::new();
        let count = Arc::new(AtomicUsize::new(0));

        {
            let count_clone = count.clone();
            let _sub = broadcaster.subscribe(move |_, _| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
            broadcaster.emit(AuthEvent::SignedIn, None);
        }

        broadcaster.emit(AuthEvent::SignedOut, None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_and_session_are_delivered() {
        let broadcaster = AuthBroadcaster::new();
        let seen = Arc::new(Mutex::new(None));

        let seen_clone = seen.clone();
        let _sub = broadcaster.subscribe(move |event, session| {
            *seen_clone.lock().unwrap() = Some((event, session.map(|s| s.access_token.clone())));
        });

        broadcaster.emit(AuthEvent::InitialSession, None);
        assert_eq!(
            *seen.lock().unwrap(),
            Some((AuthEvent::InitialSession, None))
        );
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let broadcaster = AuthBroadcaster::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let sub = Arc::new(Mutex::new(None::<Subscription>));
        let sub_clone = sub.clone();
        let handle = broadcaster.subscribe(move |_, _| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(s) = sub_clone.lock().unwrap().take() {
                s.unsubscribe();
            }
        });
        *sub.lock().unwrap() = Some(handle);

        broadcaster.emit(AuthEvent::SignedIn, None);
        broadcaster.emit(AuthEvent::SignedIn, None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
