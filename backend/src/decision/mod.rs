//! Final disposition from severity and sanction hint

pub mod reconciler;

pub use reconciler::{base_disposition, decide, Decision};
