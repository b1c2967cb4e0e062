//! Policy configuration
//!
//! Flag definitions and risk triggers, loaded from JSON and edited through
//! [`PolicyStore`]. Every pipeline run evaluates against one immutable
//! [`PolicySnapshot`].
//!
//! # Example
//!
//! ```rust
//! use cryptopix_risk_core::flags::FlagDefinition;
//! use cryptopix_risk_core::policy::PolicyStore;
//!
//! let store = PolicyStore::default();
//! store.create_flag(FlagDefinition::new("unverified_receiver", vec![], 0.4)).unwrap();
//!
//! let snapshot = store.snapshot();
//! assert_eq!(snapshot.flags.len(), 1);
//! ```

pub mod snapshot;
pub mod store;
pub mod validation;

pub use snapshot::{LoadedPolicy, PolicyError, PolicySnapshot};
pub use store::PolicyStore;
pub use validation::{describe, validate_flag, validate_trigger, ConfigError, ValidationResult};
