//! In-memory transport for testing and single-process scenarios.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::{Delivery, DeliveryCallback, SubscribeOptions, Subscription, Transport, TransportError};

/// In-memory transport for testing and single-process use.
///
/// Features:
/// - Thread-safe; `Clone` shares the same broker state
/// - Per-subject append-only logs with 1-based sequences
/// - Fan-out and round-robin queue-group subscriptions
/// - Manual acknowledge with per-subscription tracking
/// - Deterministic redelivery via [`InMemoryTransport::redeliver_unacked`]
///
/// Delivery is synchronous: `publish` invokes matching callbacks on the
/// calling thread before returning. Messages that were delivered but
/// never acknowledged are redelivered only when `redeliver_unacked` is
/// called, which keeps at-least-once tests free of timing races.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    shared: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    subjects: HashMap<String, SubjectState>,
    next_sub_id: u64,
    closed: bool,
}

#[derive(Default)]
struct SubjectState {
    log: Vec<Stored>,
    fanout: Vec<FanoutSub>,
    groups: HashMap<String, Group>,
}

struct Stored {
    payload: Vec<u8>,
    sequence: u64,
}

struct FanoutSub {
    id: u64,
    callback: DeliveryCallback,
    delivered: HashSet<u64>,
    acked: HashSet<u64>,
}

struct GroupMember {
    id: u64,
    callback: DeliveryCallback,
}

#[derive(Default)]
struct Group {
    members: Vec<GroupMember>,
    next_member: usize,
    delivered: HashSet<u64>,
    acked: HashSet<u64>,
}

/// Where an acknowledge lands.
#[derive(Clone)]
enum AckTarget {
    Fanout(u64),
    Group(String),
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages published to `subject`.
    pub fn message_count(&self, subject: &str) -> usize {
        let state = self.shared.lock().unwrap();
        state.subjects.get(subject).map_or(0, |s| s.log.len())
    }

    /// The highest sequence assigned on `subject` (0 when none).
    pub fn last_sequence(&self, subject: &str) -> u64 {
        let state = self.shared.lock().unwrap();
        state
            .subjects
            .get(subject)
            .map_or(0, |s| s.log.len() as u64)
    }

    /// Redeliver every message on `subject` that was delivered but not
    /// acknowledged.
    ///
    /// This is the in-memory stand-in for a broker's ack-wait timer:
    /// tests trigger redelivery explicitly instead of waiting on one.
    pub fn redeliver_unacked(&self, subject: &str) {
        let mut pending = Vec::new();

        {
            let mut state = self.shared.lock().unwrap();
            let subject_state = match state.subjects.get_mut(subject) {
                Some(s) => s,
                None => return,
            };

            for sub in &mut subject_state.fanout {
                let mut unacked: Vec<u64> = sub.delivered.difference(&sub.acked).copied().collect();
                unacked.sort_unstable();
                for sequence in unacked {
                    let stored = &subject_state.log[(sequence - 1) as usize];
                    pending.push((
                        Arc::clone(&sub.callback),
                        stored.payload.clone(),
                        sequence,
                        AckTarget::Fanout(sub.id),
                    ));
                }
            }

            for (name, group) in &mut subject_state.groups {
                if group.members.is_empty() {
                    continue;
                }

                let mut unacked: Vec<u64> =
                    group.delivered.difference(&group.acked).copied().collect();
                unacked.sort_unstable();
                for sequence in unacked {
                    let member = &group.members[group.next_member % group.members.len()];
                    group.next_member = group.next_member.wrapping_add(1);
                    let stored = &subject_state.log[(sequence - 1) as usize];
                    pending.push((
                        Arc::clone(&member.callback),
                        stored.payload.clone(),
                        sequence,
                        AckTarget::Group(name.clone()),
                    ));
                }
            }
        }

        for (callback, payload, sequence, target) in pending {
            callback(self.delivery(subject, payload, sequence, target));
        }
    }

    fn delivery(
        &self,
        subject: &str,
        payload: Vec<u8>,
        sequence: u64,
        target: AckTarget,
    ) -> Delivery {
        let shared = Arc::clone(&self.shared);
        let subject = subject.to_string();

        Delivery::new(payload, sequence, Utc::now(), move || {
            let mut state = shared.lock().unwrap();
            let subject_state = state
                .subjects
                .get_mut(&subject)
                .ok_or_else(|| TransportError::AckFailed(format!("unknown subject {}", subject)))?;

            match &target {
                AckTarget::Fanout(sub_id) => {
                    if let Some(sub) = subject_state.fanout.iter_mut().find(|s| s.id == *sub_id) {
                        sub.acked.insert(sequence);
                    }
                }
                AckTarget::Group(name) => {
                    if let Some(group) = subject_state.groups.get_mut(name) {
                        group.acked.insert(sequence);
                    }
                }
            }
            Ok(())
        })
    }
}

impl Transport for InMemoryTransport {
    fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), TransportError> {
        let mut pending = Vec::new();

        {
            let mut state = self.shared.lock().unwrap();
            if state.closed {
                return Err(TransportError::Closed);
            }

            let subject_state = state.subjects.entry(subject.to_string()).or_default();
            let sequence = subject_state.log.len() as u64 + 1;
            subject_state.log.push(Stored {
                payload: payload.to_vec(),
                sequence,
            });

            for sub in &mut subject_state.fanout {
                sub.delivered.insert(sequence);
                pending.push((
                    Arc::clone(&sub.callback),
                    payload.to_vec(),
                    sequence,
                    AckTarget::Fanout(sub.id),
                ));
            }

            for (name, group) in &mut subject_state.groups {
                if group.members.is_empty() {
                    continue;
                }
                let member = &group.members[group.next_member % group.members.len()];
                group.next_member = group.next_member.wrapping_add(1);
                group.delivered.insert(sequence);
                pending.push((
                    Arc::clone(&member.callback),
                    payload.to_vec(),
                    sequence,
                    AckTarget::Group(name.clone()),
                ));
            }
        }

        for (callback, payload, sequence, target) in pending {
            callback(self.delivery(subject, payload, sequence, target));
        }

        Ok(())
    }

    fn subscribe(
        &self,
        subject: &str,
        options: SubscribeOptions,
        callback: DeliveryCallback,
    ) -> Result<Box<dyn Subscription>, TransportError> {
        let mut backlog = Vec::new();
        let sub_id;

        {
            let mut state = self.shared.lock().unwrap();
            if state.closed {
                return Err(TransportError::Closed);
            }

            sub_id = state.next_sub_id;
            state.next_sub_id += 1;

            let subject_state = state.subjects.entry(subject.to_string()).or_default();
            let start = options.start_sequence.unwrap_or(0);

            let mut sub = FanoutSub {
                id: sub_id,
                callback: Arc::clone(&callback),
                delivered: HashSet::new(),
                acked: HashSet::new(),
            };

            for stored in &subject_state.log {
                if stored.sequence > start {
                    sub.delivered.insert(stored.sequence);
                    backlog.push((stored.payload.clone(), stored.sequence));
                }
            }

            subject_state.fanout.push(sub);
        }

        for (payload, sequence) in backlog {
            callback(self.delivery(subject, payload, sequence, AckTarget::Fanout(sub_id)));
        }

        Ok(Box::new(InMemorySubscription {
            shared: Arc::clone(&self.shared),
            subject: subject.to_string(),
            kind: SubKind::Fanout(sub_id),
        }))
    }

    fn queue_subscribe(
        &self,
        subject: &str,
        group: &str,
        options: SubscribeOptions,
        callback: DeliveryCallback,
    ) -> Result<Box<dyn Subscription>, TransportError> {
        let mut backlog = Vec::new();
        let member_id;

        {
            let mut state = self.shared.lock().unwrap();
            if state.closed {
                return Err(TransportError::Closed);
            }

            member_id = state.next_sub_id;
            state.next_sub_id += 1;

            let subject_state = state.subjects.entry(subject.to_string()).or_default();
            let group_state = subject_state.groups.entry(group.to_string()).or_default();
            let start = options.start_sequence.unwrap_or(0);

            // Backlog the group has never consumed goes to the joining
            // member.
            for stored in &subject_state.log {
                if stored.sequence > start && !group_state.delivered.contains(&stored.sequence) {
                    group_state.delivered.insert(stored.sequence);
                    backlog.push((stored.payload.clone(), stored.sequence));
                }
            }

            group_state.members.push(GroupMember {
                id: member_id,
                callback: Arc::clone(&callback),
            });
        }

        for (payload, sequence) in backlog {
            callback(self.delivery(
                subject,
                payload,
                sequence,
                AckTarget::Group(group.to_string()),
            ));
        }

        Ok(Box::new(InMemorySubscription {
            shared: Arc::clone(&self.shared),
            subject: subject.to_string(),
            kind: SubKind::Group {
                name: group.to_string(),
                member: member_id,
            },
        }))
    }

    fn close(&self) -> Result<(), TransportError> {
        let mut state = self.shared.lock().unwrap();
        state.closed = true;
        for subject_state in state.subjects.values_mut() {
            subject_state.fanout.clear();
            subject_state.groups.clear();
        }
        Ok(())
    }
}

enum SubKind {
    Fanout(u64),
    Group { name: String, member: u64 },
}

struct InMemorySubscription {
    shared: Arc<Mutex<State>>,
    subject: String,
    kind: SubKind,
}

impl Subscription for InMemorySubscription {
    fn unsubscribe(&mut self) -> Result<(), TransportError> {
        let mut state = self.shared.lock().unwrap();
        if let Some(subject_state) = state.subjects.get_mut(&self.subject) {
            match &self.kind {
                SubKind::Fanout(id) => subject_state.fanout.retain(|s| s.id != *id),
                SubKind::Group { name, member } => {
                    if let Some(group) = subject_state.groups.get_mut(name) {
                        group.members.retain(|m| m.id != *member);
                    }
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // No broker-side durable state to preserve in memory.
        self.unsubscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn collector() -> (Arc<StdMutex<Vec<(u64, Vec<u8>)>>>, DeliveryCallback) {
        let seen: Arc<StdMutex<Vec<(u64, Vec<u8>)>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: DeliveryCallback = Arc::new(move |delivery: Delivery| {
            sink.lock()
                .unwrap()
                .push((delivery.sequence, delivery.payload.clone()));
            delivery.ack().unwrap();
        });
        (seen, callback)
    }

    #[test]
    fn fanout_delivers_to_every_subscriber() {
        let transport = InMemoryTransport::new();

        let (seen_a, cb_a) = collector();
        let (seen_b, cb_b) = collector();
        transport
            .subscribe("orders", SubscribeOptions::default(), cb_a)
            .unwrap();
        transport
            .subscribe("orders", SubscribeOptions::default(), cb_b)
            .unwrap();

        transport.publish("orders", b"one").unwrap();
        transport.publish("orders", b"two").unwrap();

        assert_eq!(seen_a.lock().unwrap().len(), 2);
        assert_eq!(seen_b.lock().unwrap().len(), 2);
        assert_eq!(transport.last_sequence("orders"), 2);
    }

    #[test]
    fn queue_group_round_robins() {
        let transport = InMemoryTransport::new();

        let (seen_a, cb_a) = collector();
        let (seen_b, cb_b) = collector();
        transport
            .queue_subscribe("work", "workers", SubscribeOptions::default(), cb_a)
            .unwrap();
        transport
            .queue_subscribe("work", "workers", SubscribeOptions::default(), cb_b)
            .unwrap();

        for payload in [b"1", b"2", b"3", b"4"] {
            transport.publish("work", payload).unwrap();
        }

        let a = seen_a.lock().unwrap().len();
        let b = seen_b.lock().unwrap().len();
        assert_eq!(a + b, 4);
        assert_eq!(a, 2);
        assert_eq!(b, 2);
    }

    #[test]
    fn subscriber_sees_backlog_from_start_sequence() {
        let transport = InMemoryTransport::new();

        transport.publish("events", b"first").unwrap();
        transport.publish("events", b"second").unwrap();
        transport.publish("events", b"third").unwrap();

        let (seen, callback) = collector();
        transport
            .subscribe(
                "events",
                SubscribeOptions {
                    start_sequence: Some(2),
                    ..Default::default()
                },
                callback,
            )
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (3, b"third".to_vec()));
    }

    #[test]
    fn unacked_deliveries_can_be_redelivered() {
        let transport = InMemoryTransport::new();

        let attempts: Arc<StdMutex<Vec<u64>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&attempts);
        // Never acks: every delivery stays pending.
        let callback: DeliveryCallback = Arc::new(move |delivery: Delivery| {
            sink.lock().unwrap().push(delivery.sequence);
        });
        transport
            .subscribe("retries", SubscribeOptions::default(), callback)
            .unwrap();

        transport.publish("retries", b"flaky").unwrap();
        transport.redeliver_unacked("retries");
        transport.redeliver_unacked("retries");

        assert_eq!(*attempts.lock().unwrap(), vec![1, 1, 1]);
    }

    #[test]
    fn acked_deliveries_are_not_redelivered() {
        let transport = InMemoryTransport::new();

        let (seen, callback) = collector();
        transport
            .subscribe("done", SubscribeOptions::default(), callback)
            .unwrap();

        transport.publish("done", b"ok").unwrap();
        transport.redeliver_unacked("done");

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let transport = InMemoryTransport::new();

        let (seen, callback) = collector();
        let mut sub = transport
            .subscribe("quiet", SubscribeOptions::default(), callback)
            .unwrap();

        transport.publish("quiet", b"heard").unwrap();
        sub.unsubscribe().unwrap();
        transport.publish("quiet", b"unheard").unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn closed_transport_rejects_operations() {
        let transport = InMemoryTransport::new();
        transport.close().unwrap();

        assert!(matches!(
            transport.publish("any", b"x"),
            Err(TransportError::Closed)
        ));

        let (_, callback) = collector();
        assert!(transport
            .subscribe("any", SubscribeOptions::default(), callback)
            .is_err());
    }
}
