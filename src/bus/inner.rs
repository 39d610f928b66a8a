//! Shared state behind a bus and every receiver it hands out.

use std::sync::Arc;

use crate::codec::Codec;
use crate::dedup::IdempotencyCache;
use crate::transport::{SubscribeOptions, Transport};
use crate::warmup::WarmupGate;

use super::error::DeliveryError;
use super::options::Options;

pub(crate) struct BusInner {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) options: Options,
    pub(crate) gate: WarmupGate,
    pub(crate) cache: Option<IdempotencyCache>,
    pub(crate) codecs: Arc<Vec<Arc<dyn Codec>>>,
}

impl BusInner {
    pub(crate) fn new(transport: Arc<dyn Transport>, options: Options) -> Self {
        let gate = WarmupGate::new(options.warm_up_timeout);
        let cache = match options.dedup_capacity {
            0 => None,
            capacity => Some(IdempotencyCache::new(capacity)),
        };
        let codecs = Arc::new(options.codecs.clone());

        BusInner {
            transport,
            options,
            gate,
            cache,
            codecs,
        }
    }

    /// Duplicate check; with no cache configured every id is new.
    pub(crate) fn is_unique(&self, id: &str) -> bool {
        match &self.cache {
            Some(cache) => cache.is_unique(id),
            None => true,
        }
    }

    /// Log the error and hand it to the configured sink, if any.
    pub(crate) fn report(&self, err: DeliveryError) {
        match &err {
            DeliveryError::Decode { subject, source } => {
                tracing::warn!(subject = %subject, error = %source, "dropping undecodable message");
            }
            DeliveryError::Handler {
                subject,
                id,
                source,
            } => {
                tracing::warn!(
                    subject = %subject,
                    id = %id,
                    error = %source,
                    "handler failed; message left unacknowledged"
                );
            }
            DeliveryError::Ack { subject, source } => {
                tracing::warn!(subject = %subject, error = %source, "acknowledge failed");
            }
        }

        if let Some(sink) = &self.options.error_sink {
            sink(&err);
        }
    }

    /// Build subscription options for a subject from the configured
    /// generators and callbacks.
    pub(crate) fn subscribe_options(&self, path: &str) -> SubscribeOptions {
        SubscribeOptions {
            durable_name: self
                .options
                .durable_name
                .as_ref()
                .map(|f| f(path))
                .filter(|name| !name.is_empty()),
            start_sequence: self.options.get_sequence.as_ref().map(|f| f(path)),
            ack_wait: self.options.ack_wait,
        }
    }
}
