//! Tag vocabulary and per-clip tag reconciliation.

pub mod reconciler;
pub mod vocabulary;

pub use reconciler::{ReconcileOutcome, TagReconciler};
pub use vocabulary::{Tag, TagVocabulary};
