//! Receiver - the route tree.

use std::sync::Arc;

use crate::bus::{delivery_callback, BusInner};
use crate::handler::{wrap, Handler, Middleware};
use crate::transport::{Subscription, TransportError};

use super::path::merge_path;

/// A node in the subject-path tree.
///
/// A receiver is scoped to a path and carries the middleware
/// accumulated from its ancestors. Branching (`route`, `group`) copies
/// the middleware stack by value, so additions to a parent after a
/// child was declared never leak into that child, and siblings never
/// see each other's middleware.
///
/// Declare the whole tree during startup; the tree is read-only during
/// steady-state delivery.
///
/// ## Example
///
/// ```
/// use routed_rust::{Bus, InMemoryTransport, Message, Options};
/// use std::sync::Arc;
///
/// let bus = Bus::new(Arc::new(InMemoryTransport::new()), Options::new());
///
/// bus.receiver().route("root.billing", |r| {
///     r.use_middleware(routed_rust::middleware::logging());
///
///     r.handle("invoice.created", |msg: &Message| {
///         println!("{}", msg.subject);
///         Ok(())
///     })
///     .unwrap();
/// });
/// ```
pub struct Receiver {
    inner: Arc<BusInner>,
    path: String,
    middlewares: Vec<Middleware>,
}

impl Receiver {
    pub(crate) fn root(inner: Arc<BusInner>) -> Self {
        Receiver {
            inner,
            path: String::new(),
            middlewares: Vec::new(),
        }
    }

    /// The full subject path this receiver is scoped to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append middleware to this receiver's stack.
    ///
    /// Middleware registered first wraps outermost. Only handlers
    /// registered after this call, on this receiver or on children
    /// branched from it afterwards, are affected.
    pub fn use_middleware<F>(&mut self, middleware: F)
    where
        F: Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Declare a child route at `sub_path`, scoped by `configure`.
    ///
    /// The child's subject is this receiver's path joined with
    /// `sub_path`; its middleware stack is a copy of this receiver's.
    ///
    /// # Panics
    ///
    /// Panics when `sub_path` is empty or starts or ends with `'.'`:
    /// a configuration error caught at declaration time.
    pub fn route<F>(&self, sub_path: &str, configure: F) -> Receiver
    where
        F: FnOnce(&mut Receiver),
    {
        let path = match merge_path(&self.path, sub_path) {
            Ok(path) => path,
            Err(err) => panic!("invalid route path {:?}: {}", sub_path, err),
        };

        let mut child = Receiver {
            inner: Arc::clone(&self.inner),
            path,
            middlewares: self.middlewares.clone(),
        };

        configure(&mut child);
        child
    }

    /// Declare a sibling receiver at the same path.
    ///
    /// Useful to scope extra middleware to a subset of handlers
    /// without changing the subject.
    pub fn group<F>(&self, configure: F) -> Receiver
    where
        F: FnOnce(&mut Receiver),
    {
        let mut sibling = Receiver {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
            middlewares: self.middlewares.clone(),
        };

        configure(&mut sibling);
        sibling
    }

    /// Bind a fan-out handler: every subscriber instance receives a
    /// copy of every message on the subject.
    ///
    /// The final subject is this receiver's path joined with
    /// `subject`. The handler is wrapped in the accumulated middleware
    /// and subscribed with manual acknowledge, a durable name when a
    /// generator is configured, and a resume sequence when a getter is
    /// configured.
    ///
    /// # Panics
    ///
    /// Panics when `subject` fails path validation.
    pub fn handle<H>(
        &self,
        subject: &str,
        handler: H,
    ) -> Result<Box<dyn Subscription>, TransportError>
    where
        H: Handler + 'static,
    {
        self.bind(subject, None, handler)
    }

    /// Bind a load-balanced handler: each message goes to exactly one
    /// member of the queue group.
    ///
    /// The group name comes from the configured queue-name generator.
    /// Queue handlers are the side-effecting kind: while the warm-up
    /// gate has not settled, their deliveries are acknowledged and
    /// skipped.
    ///
    /// # Panics
    ///
    /// Panics when `subject` fails path validation, when no queue-name
    /// generator is configured, or when the generator returns an empty
    /// name. All are declaration-time configuration errors.
    pub fn handle_queue<H>(
        &self,
        subject: &str,
        handler: H,
    ) -> Result<Box<dyn Subscription>, TransportError>
    where
        H: Handler + 'static,
    {
        let path = self.merged(subject);

        let generator = self
            .inner
            .options
            .queue_name
            .as_ref()
            .expect("queue name generator must be configured");

        let group = generator(&path);
        if group.is_empty() {
            panic!("queue name generator returned an empty name for {:?}", path);
        }

        self.bind(subject, Some(group), handler)
    }

    /// Like [`Receiver::handle_queue`] with an explicit group name.
    ///
    /// # Panics
    ///
    /// Panics when `subject` fails path validation or `group` is
    /// empty.
    pub fn handle_queue_as<H>(
        &self,
        subject: &str,
        group: &str,
        handler: H,
    ) -> Result<Box<dyn Subscription>, TransportError>
    where
        H: Handler + 'static,
    {
        if group.is_empty() {
            panic!("queue group name must not be empty");
        }
        self.bind(subject, Some(group.to_string()), handler)
    }

    fn merged(&self, subject: &str) -> String {
        match merge_path(&self.path, subject) {
            Ok(path) => path,
            Err(err) => panic!("invalid subject {:?}: {}", subject, err),
        }
    }

    fn bind<H>(
        &self,
        subject: &str,
        group: Option<String>,
        handler: H,
    ) -> Result<Box<dyn Subscription>, TransportError>
    where
        H: Handler + 'static,
    {
        let path = self.merged(subject);

        let wrapped = wrap(&self.middlewares, Arc::new(handler));
        let options = self.inner.subscribe_options(&path);
        let callback = delivery_callback(
            Arc::clone(&self.inner),
            path.clone(),
            wrapped,
            group.is_some(),
        );

        match group {
            Some(group) => self
                .inner
                .transport
                .queue_subscribe(&path, &group, options, callback),
            None => self.inner.transport.subscribe(&path, options, callback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::transport::InMemoryTransport;
    use crate::{Bus, Options};
    use std::sync::Mutex;

    fn test_bus() -> Bus {
        Bus::new(Arc::new(InMemoryTransport::new()), Options::new())
    }

    #[test]
    #[should_panic(expected = "invalid route path")]
    fn leading_separator_is_fatal_at_declaration() {
        test_bus().receiver().route(".a.b", |_| {});
    }

    #[test]
    #[should_panic(expected = "invalid subject")]
    fn trailing_separator_is_fatal_at_declaration() {
        test_bus().receiver().route("root", |r| {
            let _ = r.handle("a.b.", |_msg: &Message| Ok(()));
        });
    }

    #[test]
    #[should_panic(expected = "queue name generator must be configured")]
    fn handle_queue_without_generator_is_fatal() {
        test_bus().receiver().route("root", |r| {
            let _ = r.handle_queue("work", |_msg: &Message| Ok(()));
        });
    }

    #[test]
    fn routes_join_paths() {
        let bus = test_bus();
        let receiver = bus.receiver().route("root.a", |_| {});
        assert_eq!(receiver.path(), "root.a");

        let nested = receiver.route("b.c", |_| {});
        assert_eq!(nested.path(), "root.a.b.c");
    }

    #[test]
    fn later_parent_middleware_does_not_reach_existing_children() {
        let bus = test_bus();
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let mut parent = bus.receiver().route("root", |_| {});

        // Child branched before the parent gains middleware.
        let early_log = Arc::clone(&log);
        let early = parent.group(|_| {});

        let mw_log = Arc::clone(&log);
        parent.use_middleware(move |next: Arc<dyn Handler>| {
            let mw_log = Arc::clone(&mw_log);
            Arc::new(move |msg: &Message| {
                mw_log.lock().unwrap().push("parent-mw");
                next.handle(msg)
            }) as Arc<dyn Handler>
        });

        early
            .handle("early", move |_msg: &Message| {
                early_log.lock().unwrap().push("early");
                Ok(())
            })
            .unwrap();

        let late_log = Arc::clone(&log);
        parent
            .handle("late", move |_msg: &Message| {
                late_log.lock().unwrap().push("late");
                Ok(())
            })
            .unwrap();

        let sender = bus.sender();
        sender.publish_bytes("root.early", Vec::new()).unwrap();
        sender.publish_bytes("root.late", Vec::new()).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["early", "parent-mw", "late"]);
    }
}
