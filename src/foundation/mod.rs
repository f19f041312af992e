//! Shared building blocks: errors, configuration, runtime context and small math helpers.

/// Runtime configuration (serde + environment overrides).
pub mod config;
/// Explicit runtime context replacing process-wide singletons.
pub mod context;
/// Error taxonomy and the `contract!` macro.
pub mod error;
pub(crate) mod math;
