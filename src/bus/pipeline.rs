//! The per-delivery pipeline shared by fan-out and queue subscriptions.

use std::sync::Arc;

use crate::handler::Handler;
use crate::message::Message;
use crate::transport::{Delivery, DeliveryCallback};
use crate::wire::Envelope;

use super::error::DeliveryError;
use super::inner::BusInner;

/// Build the transport callback for one subscription.
///
/// Each delivery attempt walks the same states:
/// decode → dedupe → warm-up gate → handler → acknowledge.
///
/// - An undecodable envelope is acknowledged and dropped: redelivery
///   cannot change the bytes.
/// - A duplicate id is acknowledged without running the handler.
/// - While the warm-up gate has not settled, queue-group handlers are
///   acknowledged and skipped: they exist to generate side effects,
///   which are prohibited during warm-up. Fan-out handlers run
///   regardless.
/// - Handler success acknowledges and advances the persisted resume
///   sequence; handler failure leaves the message unacknowledged so
///   the transport redelivers it.
pub(crate) fn delivery_callback(
    inner: Arc<BusInner>,
    path: String,
    handler: Arc<dyn Handler>,
    queue_group: bool,
) -> DeliveryCallback {
    Arc::new(move |delivery: Delivery| {
        inner.gate.tick();

        let envelope = match Envelope::decode(&delivery.payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                inner.report(DeliveryError::Decode {
                    subject: path.clone(),
                    source: err,
                });
                ack(&inner, &path, &delivery);
                return;
            }
        };

        if !inner.is_unique(&envelope.id) {
            tracing::debug!(subject = %path, id = %envelope.id, "dropping duplicate message");
            ack(&inner, &path, &delivery);
            return;
        }

        if queue_group && !inner.gate.is_settled() {
            tracing::debug!(
                subject = %path,
                id = %envelope.id,
                "skipping queue handler during warm-up"
            );
            ack(&inner, &path, &delivery);
            return;
        }

        let message = Message::from_parts(
            envelope.id,
            envelope.aggregate_id,
            path.clone(),
            envelope.body,
            delivery.sequence,
            delivery.timestamp,
            Arc::clone(&inner.codecs),
        );

        match handler.handle(&message) {
            Ok(()) => {
                if ack(&inner, &path, &delivery) {
                    if let Some(update) = &inner.options.update_sequence {
                        update(&path, delivery.sequence);
                    }
                }
            }
            Err(err) => {
                inner.report(DeliveryError::Handler {
                    subject: path.clone(),
                    id: message.id.clone(),
                    source: err,
                });
            }
        }
    })
}

/// Acknowledge, reporting failure to the error sink. Returns whether
/// the acknowledge went through.
fn ack(inner: &BusInner, path: &str, delivery: &Delivery) -> bool {
    match delivery.ack() {
        Ok(()) => true,
        Err(err) => {
            inner.report(DeliveryError::Ack {
                subject: path.to_string(),
                source: err,
            });
            false
        }
    }
}
