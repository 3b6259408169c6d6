use tracing::{error, info};

/// A collaborator that is loaded once at startup and may be unavailable.
///
/// Absence is an ordinary state: call sites match on it per request instead
/// of failing at load time.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Available(T),
    Missing { name: String, reason: String },
}

impl<T> Capability<T> {
    /// Record a capability that failed to load and emit the startup diagnostic.
    pub fn missing(name: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!(
            dependency = name,
            %reason,
            "missing dependency, related features are unavailable"
        );
        Capability::Missing {
            name: name.to_string(),
            reason,
        }
    }

    /// Record a capability the user switched off. Not a failure, so it is
    /// only noted at `info`.
    pub fn disabled(name: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        info!(dependency = name, %reason, "dependency disabled");
        Capability::Missing {
            name: name.to_string(),
            reason,
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Missing { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}
