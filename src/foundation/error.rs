/// Convenience result type used across flitter.
pub type FlitterResult<T> = Result<T, FlitterError>;

/// Top-level error taxonomy used by runtime APIs.
///
/// Programmer-contract violations are not represented here: they are checked with
/// [`contract!`](crate::contract) in debug builds and left unchecked in release builds.
#[derive(thiserror::Error, Debug)]
pub enum FlitterError {
    /// Invalid user-provided data (config, sprite sheets, tween steps).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while building or sampling tweens and timelines.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors from scene graph operations (stale handles, illegal topology).
    #[error("scene error: {0}")]
    Scene(String),

    /// Errors raised by render backends and image surfaces.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlitterError {
    /// Build a [`FlitterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlitterError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`FlitterError::Scene`] value.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    /// Build a [`FlitterError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FlitterError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Check a programmer contract.
///
/// Debug builds panic with an "invariant violated" message; release builds compile the check
/// away entirely.
#[macro_export]
macro_rules! contract {
    ($cond:expr, $($msg:tt)+) => {
        debug_assert!($cond, "invariant violated: {}", format_args!($($msg)+))
    };
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
