//! A lightweight actor runtime.
//!
//! An actor owns its state exclusively and handles one message at a time
//! on its own task, so handlers never interleave. Background work reports
//! back by sending messages, usually through a [`WeakActor`] so that it
//! doesn't keep a torn-down actor alive.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod scheduler;

pub use error::ActorDeadError;
pub use handle::{Actor, WeakActor};
pub use mailbox::{ActorState, Message};

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
        on_stopped: Option<oneshot::Sender<u32>>,
    }

    impl ActorState for Counter {
        fn stopped(&mut self) {
            if let Some(tx) = self.on_stopped.take() {
                tx.send(self.value).ok();
            }
        }
    }

    #[derive(Debug)]
    struct Add(u32);

    impl Message<Counter> for Add {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            state.value += self.0;
        }
    }

    #[derive(Debug)]
    struct Get(oneshot::Sender<u32>);

    impl Message<Counter> for Get {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            self.0.send(state.value).unwrap();
        }
    }

    #[tokio::test]
    async fn test_send_message() {
        let actor = Actor::spawn(Counter::default(), None);
        actor.send(Add(42)).unwrap();

        let (tx, rx) = oneshot::channel();
        actor.send(Get(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_stopped_after_kill() {
        let (stopped_tx, stopped_rx) = oneshot::channel();
        let actor = Actor::spawn(
            Counter {
                value: 0,
                on_stopped: Some(stopped_tx),
            },
            Some("counter"),
        );
        actor.send(Add(7)).unwrap();
        let (tx, rx) = oneshot::channel();
        actor.send(Get(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 7);

        actor.try_kill();
        assert!(!actor.is_alive());
        assert!(actor.send(Add(1)).is_err());
        assert_eq!(stopped_rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_weak_handle_does_not_keep_alive() {
        let (stopped_tx, stopped_rx) = oneshot::channel();
        let actor = Actor::spawn(
            Counter {
                value: 0,
                on_stopped: Some(stopped_tx),
            },
            None,
        );
        let weak = actor.downgrade();
        weak.send(Add(3)).unwrap();
        let (tx, rx) = oneshot::channel();
        weak.send(Get(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 3);

        drop(actor);
        assert!(weak.send(Add(1)).is_err());
        assert_eq!(stopped_rx.await.unwrap(), 3);
    }
}
