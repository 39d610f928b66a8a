//! Bus - provider, configuration, and the publish/delivery glue.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Bus (per service)                       │
//! │  owns: warm-up gate, idempotency cache, options             │
//! │  hands out: Sender (publish) + root Receiver (routes)       │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                   │
//!          ▼                                   ▼
//! ┌─────────────────┐             ┌───────────────────────────┐
//! │     Sender      │             │     Receiver (router)     │
//! │ id gen, codecs, │             │ route/group/handle/…      │
//! │ envelope encode │             │ middleware copy-on-branch │
//! └─────────────────┘             └───────────────────────────┘
//!          │                                   │
//!          ▼                                   ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Transport (durable pub/sub broker)             │
//! │  publish / subscribe / queue_subscribe / manual ack         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each delivered message runs the pipeline in `pipeline.rs`:
//! decode → dedupe → warm-up gate → handler → ack + resume bookkeeping.

mod bus;
mod error;
mod inner;
mod options;
mod pipeline;
mod sender;

pub use bus::Bus;
pub use error::{DeliveryError, PublishError};
pub use options::Options;
pub use sender::{MessageOptions, OutboundMessage, Sender};

pub(crate) use inner::BusInner;
pub(crate) use pipeline::delivery_callback;
