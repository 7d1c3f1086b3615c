//! The dispatch loop: the single consumer of a machine's event queue.

use super::error::MachineError;
use super::machine::{lock, Shared};
use crate::core::Event;
use std::sync::Weak;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

/// A queued event, optionally paired with a waiter for its outcome.
pub(crate) struct Envelope {
    pub(crate) event: Event,
    done: Option<oneshot::Sender<Result<(), MachineError>>>,
}

impl Envelope {
    pub(crate) fn new(event: Event) -> Self {
        Self { event, done: None }
    }

    pub(crate) fn waiting(event: Event) -> (Self, oneshot::Receiver<Result<(), MachineError>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                event,
                done: Some(tx),
            },
            rx,
        )
    }
}

/// Process envelopes in FIFO order until shutdown is signalled, the queue
/// closes, or the machine is dropped.
pub(crate) async fn run<D>(
    machine: Weak<Shared<D>>,
    mut queue: mpsc::Receiver<Envelope>,
    mut shutdown: watch::Receiver<bool>,
) where
    D: Send + Sync + 'static,
{
    debug!("dispatch loop started");
    loop {
        let envelope = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stopped| *stopped) => break,
            envelope = queue.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
        };
        let Some(shared) = machine.upgrade() else {
            break;
        };
        dispatch(&shared, envelope);
    }

    // Waiters on discarded events resolve with `Stopped` once their
    // senders drop.
    queue.close();
    let mut discarded = 0usize;
    while queue.try_recv().is_ok() {
        discarded += 1;
    }
    debug!(discarded, "dispatch loop stopped");
}

fn dispatch<D>(shared: &Shared<D>, envelope: Envelope)
where
    D: Send + Sync + 'static,
{
    let Envelope { event, done } = envelope;
    let outcome = {
        let mut runtime = lock(&shared.runtime);
        shared.process_event(&mut runtime, &event)
    };

    let result = match outcome {
        Ok(change) => {
            shared.notify(change);
            Ok(())
        }
        Err(error) => {
            if done.is_none() {
                warn!(event = %event.id(), %error, "transition failed");
            } else {
                debug!(event = %event.id(), %error, "transition failed");
            }
            Err(error)
        }
    };

    if let Some(done) = done {
        // The waiter may have given up; nothing to report then.
        let _ = done.send(result);
    }
}
