//! Bus configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::codec::Codec;
use crate::ident::{IdGenerator, UuidGenerator};

use super::error::DeliveryError;

pub(crate) type NameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub(crate) type GetSequenceFn = Arc<dyn Fn(&str) -> u64 + Send + Sync>;
pub(crate) type UpdateSequenceFn = Arc<dyn Fn(&str, u64) + Send + Sync>;
pub(crate) type ErrorSink = Arc<dyn Fn(&DeliveryError) + Send + Sync>;

/// Tunables consumed by [`Bus::new`](crate::Bus::new).
///
/// Everything is optional; the defaults give a bus with duplicate
/// suppression and warm-up gating disabled, uuid message ids, and
/// errors reported through `tracing` only.
///
/// ## Example
///
/// ```
/// use routed_rust::Options;
/// use std::time::Duration;
///
/// let options = Options::new()
///     .with_dedup_capacity(128)
///     .with_warm_up_timeout(Duration::from_secs(2))
///     .with_queue_name(|path| format!("billing.{}", path));
/// ```
pub struct Options {
    pub(crate) warm_up_timeout: Duration,
    pub(crate) dedup_capacity: usize,
    pub(crate) ack_wait: Option<Duration>,
    pub(crate) durable_name: Option<NameFn>,
    pub(crate) queue_name: Option<NameFn>,
    pub(crate) get_sequence: Option<GetSequenceFn>,
    pub(crate) update_sequence: Option<UpdateSequenceFn>,
    pub(crate) error_sink: Option<ErrorSink>,
    pub(crate) id_generator: Arc<dyn IdGenerator>,
    pub(crate) codecs: Vec<Arc<dyn Codec>>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            warm_up_timeout: Duration::ZERO,
            dedup_capacity: 0,
            ack_wait: None,
            durable_name: None,
            queue_name: None,
            get_sequence: None,
            update_sequence: None,
            error_sink: None,
            id_generator: Arc::new(UuidGenerator),
            codecs: Vec::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle the warm-up gate after this long with no inbound
    /// message. Zero (the default) disables gating: queue handlers run
    /// immediately.
    pub fn with_warm_up_timeout(mut self, timeout: Duration) -> Self {
        self.warm_up_timeout = timeout;
        self
    }

    /// Keep a rotating window of this many recently-seen message ids
    /// and acknowledge repeats without running handlers. Zero (the
    /// default) disables duplicate suppression.
    ///
    /// The window is local to this process; it is best-effort, not a
    /// group-wide exactly-once guarantee.
    pub fn with_dedup_capacity(mut self, capacity: usize) -> Self {
        self.dedup_capacity = capacity;
        self
    }

    /// Ask the transport to redeliver after this long without an
    /// acknowledge.
    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = Some(ack_wait);
        self
    }

    /// Derive a durable name from a subject. Returning an empty string
    /// skips the durable name for that subject.
    pub fn with_durable_name<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.durable_name = Some(Arc::new(f));
        self
    }

    /// Derive a queue-group name from a subject. Required before any
    /// `handle_queue` registration.
    pub fn with_queue_name<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.queue_name = Some(Arc::new(f));
        self
    }

    /// Supply the persisted resume sequence for a subject; delivery
    /// resumes strictly after it.
    pub fn with_get_sequence<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> u64 + Send + Sync + 'static,
    {
        self.get_sequence = Some(Arc::new(f));
        self
    }

    /// Persist a new resume sequence. Called once per successfully
    /// acknowledged delivery.
    pub fn with_update_sequence<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u64) + Send + Sync + 'static,
    {
        self.update_sequence = Some(Arc::new(f));
        self
    }

    /// Receive every delivery-path error (decode failures, handler
    /// failures, ack failures). Errors are logged via `tracing`
    /// whether or not a sink is configured.
    pub fn with_error_sink<F>(mut self, f: F) -> Self
    where
        F: Fn(&DeliveryError) + Send + Sync + 'static,
    {
        self.error_sink = Some(Arc::new(f));
        self
    }

    /// Replace the uuid-v4 default id generator.
    pub fn with_id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(generator);
        self
    }

    /// Append a payload codec to the chain. Codecs run in registration
    /// order on encode and in reverse order on decode.
    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codecs.push(Arc::new(codec));
        self
    }
}
