//! Router - hierarchical subject routes bound to transport
//! subscriptions.
//!
//! A service declares a tree of dot-separated subject paths, attaches
//! middleware per subtree, and binds terminal handlers either fan-out
//! (`handle`) or load-balanced (`handle_queue`). Middleware is copied
//! when a branch is declared, never shared, so configuration on one
//! branch cannot leak into another.

mod path;
mod receiver;

pub use path::{check_path, merge_path, PathError, SEPARATOR};
pub use receiver::Receiver;
