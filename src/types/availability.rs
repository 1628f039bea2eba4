//! Loaded-or-unavailable wrapper for optional artifacts.

/// Outcome of loading an optional artifact (a classifier, the anomaly
/// detector, the optimizer bundle).
///
/// Missing optional artifacts are an expected deployment state, not an
/// error, so they travel as data with the human-readable cause attached.
#[derive(Debug, Clone)]
pub enum Availability<T> {
    /// Artifact loaded and ready for inference
    Loaded(T),
    /// Artifact could not be loaded; `reason` explains why
    Unavailable { reason: String },
}

impl<T> Availability<T> {
    /// Shorthand for an unavailable artifact.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Borrow the loaded value, if any.
    pub fn as_loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(v) => Some(v),
            Self::Unavailable { .. } => None,
        }
    }

    /// The unavailability reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Loaded(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

impl<T> From<Option<T>> for Availability<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Loaded(v),
            None => Self::unavailable("not provided"),
        }
    }
}
