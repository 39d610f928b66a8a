//! Handler trait and middleware composition.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::message::{Message, MessageError};

/// Error type returned by message handlers.
#[derive(Debug)]
pub enum HandlerError {
    /// Business logic rejected the message.
    Rejected(String),
    /// Payload extraction failed.
    Payload(MessageError),
    /// Other error.
    Other(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Rejected(msg) => write!(f, "rejected: {}", msg),
            HandlerError::Payload(e) => write!(f, "payload error: {}", e),
            HandlerError::Other(e) => write!(f, "handler error: {}", e),
        }
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HandlerError::Payload(e) => Some(e),
            HandlerError::Other(e) => Some(e.as_ref()),
            HandlerError::Rejected(_) => None,
        }
    }
}

impl From<MessageError> for HandlerError {
    fn from(err: MessageError) -> Self {
        HandlerError::Payload(err)
    }
}

impl From<Box<dyn Error + Send + Sync>> for HandlerError {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        HandlerError::Other(err)
    }
}

/// Something that consumes one delivered message.
///
/// Returning `Err` leaves the message unacknowledged so the transport
/// redelivers it; returning `Ok` acknowledges it.
///
/// Blanket-implemented for closures, so a plain
/// `|msg: &Message| { ... Ok(()) }` is a handler.
pub trait Handler: Send + Sync {
    fn handle(&self, msg: &Message) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Message) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, msg: &Message) -> Result<(), HandlerError> {
        self(msg)
    }
}

/// A middleware transforms a handler into a wrapping handler with the
/// same interface.
///
/// Middleware must tolerate concurrent invocation; the two stateful
/// middleware shipped by this crate (duplicate suppression, inactivity
/// detection) synchronize internally.
pub type Middleware = Arc<dyn Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync>;

/// Compose a middleware stack around a terminal handler.
///
/// The middleware registered FIRST wraps OUTERMOST: for a stack
/// `[a, b]` over handler `h`, each message flows a → b → h.
pub fn wrap(middlewares: &[Middleware], handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
    middlewares
        .iter()
        .rev()
        .fold(handler, |wrapped, middleware| middleware(wrapped))
}
