//! Runtime configuration for the casework services.
//!
//! Configuration is plain data: callers deserialize it from JSON (or build it
//! in code) and hand the relevant parts to each service.
//!
//! ```
//! use casework::config::CaseworkConfig;
//!
//! let config = CaseworkConfig::from_json(r#"{ "lifecycle": { "max_sequence_retries": 3 } }"#)?;
//! assert_eq!(config.lifecycle.max_sequence_retries, 3);
//! assert_eq!(config.lifecycle.max_text_length, 5_000);
//! # Ok::<(), casework::config::ConfigError>(())
//! ```

use crate::task_tree::domain::SlugPath;
use crate::validation_request::domain::RequestType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseworkConfig {
    /// Request lifecycle limits.
    pub lifecycle: LifecycleConfig,
    /// Task each request type reacts on.
    pub bindings: RequestTaskBindings,
    /// Root of the task subtree revealed when consultation is required.
    ///
    /// `None` disables consultation toggling.
    pub consultation_task_path: Option<SlugPath>,
}

impl Default for CaseworkConfig {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleConfig::default(),
            bindings: RequestTaskBindings::default(),
            consultation_task_path: SlugPath::parse("consultation").ok(),
        }
    }
}

impl CaseworkConfig {
    /// Parses and checks a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields and
    /// [`ConfigError::Invalid`] for out-of-range limits.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(ConfigError::Parse)?;
        config.lifecycle.validate()?;
        Ok(config)
    }
}

/// Limits applied by the request lifecycle service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Attempts at storing a new request before a sequence clash is reported.
    pub max_sequence_retries: u32,
    /// Maximum length, in characters, of any officer or applicant text.
    pub max_text_length: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_sequence_retries: 5,
            max_text_length: 5_000,
        }
    }
}

impl LifecycleConfig {
    /// Checks that both limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when either limit is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sequence_retries == 0 {
            return Err(ConfigError::Invalid(
                "lifecycle.max_sequence_retries must be at least 1",
            ));
        }
        if self.max_text_length == 0 {
            return Err(ConfigError::Invalid(
                "lifecycle.max_text_length must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Maps each request type to the slug path of the task it reacts on.
///
/// Types without a binding cause no task reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestTaskBindings(HashMap<RequestType, SlugPath>);

impl Default for RequestTaskBindings {
    fn default() -> Self {
        const DEFAULTS: [(RequestType, &str); 6] = [
            (
                RequestType::DescriptionChange,
                "check-and-validate/check-application-details/check-description",
            ),
            (
                RequestType::RedLineBoundaryChange,
                "check-and-validate/check-application-details/check-red-line-boundary",
            ),
            (
                RequestType::AdditionalDocument,
                "check-and-validate/check-documents/check-supplied-documents",
            ),
            (
                RequestType::ReplacementDocument,
                "check-and-validate/check-documents/check-supplied-documents",
            ),
            (
                RequestType::FeeChange,
                "check-and-validate/check-application-details/check-fee",
            ),
            (
                RequestType::OtherChange,
                "check-and-validate/review/other-change-requests",
            ),
        ];
        Self(
            DEFAULTS
                .into_iter()
                .filter_map(|(request_type, raw)| {
                    SlugPath::parse(raw).ok().map(|path| (request_type, path))
                })
                .collect(),
        )
    }
}

impl RequestTaskBindings {
    /// Creates bindings with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Binds `request_type` to `path`, replacing any earlier binding.
    #[must_use]
    pub fn with_binding(mut self, request_type: RequestType, path: SlugPath) -> Self {
        self.0.insert(request_type, path);
        self
    }

    /// Returns the task path bound to `request_type`.
    #[must_use]
    pub fn path_for(&self, request_type: RequestType) -> Option<&SlugPath> {
        self.0.get(&request_type)
    }

    /// Returns `true` when both request types react on the same task.
    #[must_use]
    pub fn share_task(&self, left: RequestType, right: RequestType) -> bool {
        match (self.path_for(left), self.path_for(right)) {
            (Some(left_path), Some(right_path)) => left_path == right_path,
            _ => false,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid configuration JSON.
    #[error("failed to parse casework configuration: {0}")]
    Parse(#[source] serde_json::Error),

    /// A value is out of range.
    #[error("invalid casework configuration: {0}")]
    Invalid(&'static str),
}
