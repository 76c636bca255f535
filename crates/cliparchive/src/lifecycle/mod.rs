//! Clip processing lifecycle.
//!
//! A clip's queue entry moves `pending → queued → transcoding → finished`,
//! or to `error` from any non-terminal state. `finished` and `error` are
//! terminal. Every transition is a conditional update in the store, so two
//! callers racing on the same entry cannot both win.

pub mod controller;
pub mod entry;
pub mod status;

pub use controller::LifecycleController;
pub use entry::{Operation, QueueEntry};
pub use status::QueueStatus;
