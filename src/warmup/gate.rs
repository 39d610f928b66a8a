//! Heartbeat-driven settlement gate.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

/// Detects when message traffic has gone quiet.
///
/// A freshly started consumer typically receives a burst of historical
/// redeliveries. The gate distinguishes "still draining backlog" (ticks
/// arriving faster than the timeout) from "caught up" (no tick within
/// the timeout). It is single-use: once settled it never returns to the
/// warming state.
///
/// Internally one background thread consumes ticks from a channel with
/// a timed receive; the first lapse marks the gate settled and releases
/// every waiter at once.
///
/// ## Example
///
/// ```
/// use routed_rust::WarmupGate;
/// use std::time::Duration;
///
/// let gate = WarmupGate::new(Duration::from_millis(20));
/// gate.tick();
/// gate.wait(); // returns once 20ms pass with no further tick
/// assert!(gate.is_settled());
/// ```
pub struct WarmupGate {
    // The sender lives behind a Mutex so the gate is Sync; a tick is a
    // lock + non-blocking send.
    tick_tx: Option<Mutex<Sender<()>>>,
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl WarmupGate {
    /// Create a gate that settles after `timeout` with no tick.
    ///
    /// A zero timeout disables gating: the gate is born settled and no
    /// background thread is spawned.
    pub fn new(timeout: Duration) -> Self {
        if timeout.is_zero() {
            return WarmupGate {
                tick_tx: None,
                state: Arc::new((Mutex::new(true), Condvar::new())),
            };
        }

        let (tx, rx) = mpsc::channel::<()>();
        let state = Arc::new((Mutex::new(false), Condvar::new()));

        let thread_state = Arc::clone(&state);
        thread::spawn(move || {
            // Drain ticks until one full timeout lapses without any.
            // A disconnected channel (gate dropped) settles as well.
            while rx.recv_timeout(timeout).is_ok() {}

            let (settled, wake) = &*thread_state;
            *settled.lock().unwrap() = true;
            wake.notify_all();
        });

        WarmupGate {
            tick_tx: Some(Mutex::new(tx)),
            state,
        }
    }

    /// Signal activity. A no-op once the gate has settled.
    pub fn tick(&self) {
        if let Some(tx) = &self.tick_tx {
            // The send fails only after the background thread has
            // exited, at which point the tick is meaningless anyway.
            let _ = tx.lock().unwrap().send(());
        }
    }

    /// Block the calling thread until the gate settles.
    ///
    /// All concurrent waiters are released together; once settled this
    /// returns immediately.
    pub fn wait(&self) {
        let (settled, wake) = &*self.state;
        let mut done = settled.lock().unwrap();
        while !*done {
            done = wake.wait(done).unwrap();
        }
    }

    /// Non-blocking probe used by the delivery pipeline.
    pub fn is_settled(&self) -> bool {
        *self.state.0.lock().unwrap()
    }
}
