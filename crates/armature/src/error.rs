//! Error handling types

use thiserror::Error;

/// Result type alias for container operations that can fail
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Main error type for the armature container
///
/// The taxonomy follows two fatal families plus recoverable outcomes:
///
/// | Family | Variants | Meaning |
/// |--------|----------|---------|
/// | Configuration | `Configuration`, `IllegalOverride`, `StaticInjectionNotAllowed` | caller/config mistake |
/// | Processing | `Processing`, `CyclicReference`, `InvalidComponentState` | wraps a root cause or broken build state |
///
/// Recoverable outcomes (by-name miss, by-type miss or ambiguity, an
/// autowire reference left unresolved) are ordinary `Ok(None)` return
/// values, never errors.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Configuration-related error (caller or definition mistake)
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration mistake
        message: String,
    },

    /// An override source tried to replace a non-literal component
    #[error(
        "illegal override of non-literal component. override can replace literal values only. \
         key = [{key}], previous type = [{previous_type}]"
    )]
    IllegalOverride {
        /// Name of the component the source tried to replace
        key: String,
        /// Declared type of the existing, non-literal component
        previous_type: String,
    },

    /// Injection into a class-level target without the process-wide opt-in
    #[error(
        "static property injection not allowed. component = [{component}], property = [{property}]"
    )]
    StaticInjectionNotAllowed {
        /// Name of the component whose reference targets static state
        component: String,
        /// Property the reference would have set
        property: String,
    },

    /// Processing error (wraps a root cause)
    #[error("processing error: {message}")]
    Processing {
        /// Description of the processing failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A cyclic component reference was detected during resolution
    #[error("recursive reference was found. {message}{trace}")]
    CyclicReference {
        /// Which lookup hit the cycle
        message: String,
        /// Rendered reference stack of in-flight resolutions
        trace: String,
    },

    /// A lookup reached a holder in a state that yields no usable instance
    #[error("component state was invalid. component name = [{name}], component state = [{state}]")]
    InvalidComponentState {
        /// Name of the component (or its id when unnamed)
        name: String,
        /// The state the holder was found in
        state: String,
    },
}

impl ContainerError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a processing error
    pub fn processing<S: Into<String>>(message: S) -> Self {
        Self::Processing {
            message: message.into(),
            source: None,
        }
    }

    /// Create a processing error with source
    pub fn processing_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Processing {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// `true` for the configuration family of errors
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::IllegalOverride { .. }
                | Self::StaticInjectionNotAllowed { .. }
        )
    }

    /// `true` for the processing family of errors
    pub fn is_processing(&self) -> bool {
        !self.is_configuration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_override_names_key_and_previous_type() {
        let err = ContainerError::IllegalOverride {
            key: "db.pool".to_string(),
            previous_type: "pool::ConnectionPool".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("db.pool"), "message: {rendered}");
        assert!(
            rendered.contains("pool::ConnectionPool"),
            "message: {rendered}"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn processing_error_preserves_root_cause() {
        let cause = "x".parse::<i64>().unwrap_err();
        let err = ContainerError::processing_with_source("component instantiation failed", cause);
        assert!(err.is_processing());
        assert!(std::error::Error::source(&err).is_some());
    }
}
