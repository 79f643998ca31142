//! Slug and slug-path value types used to address tasks.

use super::TaskTreeDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One path segment addressing a task among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskSlug(String);

impl TaskSlug {
    /// Creates a validated slug.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeDomainError::InvalidSlug`] unless the value is made
    /// of lowercase ASCII letters, digits and hyphens, with no leading,
    /// trailing or doubled hyphen.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskTreeDomainError> {
        let raw = value.into();
        let is_valid = !raw.is_empty()
            && raw
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
            && !raw.starts_with('-')
            && !raw.ends_with('-')
            && !raw.contains("--");
        if !is_valid {
            return Err(TaskTreeDomainError::InvalidSlug(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the slug as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskSlug {
    type Error = TaskTreeDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskSlug> for String {
    fn from(slug: TaskSlug) -> Self {
        slug.0
    }
}

impl AsRef<str> for TaskSlug {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Slash-delimited path of slugs from the case root to a task.
///
/// # Examples
///
/// ```
/// use casework::task_tree::domain::SlugPath;
///
/// let path = SlugPath::parse("check-and-validate/check-application-details")?;
/// assert_eq!(path.segments().len(), 2);
/// assert_eq!(path.to_string(), "check-and-validate/check-application-details");
/// # Ok::<(), casework::task_tree::domain::TaskTreeDomainError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlugPath(Vec<TaskSlug>);

impl SlugPath {
    /// Parses a slash-delimited path.
    ///
    /// Leading and trailing slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeDomainError::EmptySlugPath`] for an empty path or
    /// [`TaskTreeDomainError::InvalidSlug`] for a malformed segment.
    pub fn parse(value: &str) -> Result<Self, TaskTreeDomainError> {
        let trimmed = value.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(TaskTreeDomainError::EmptySlugPath);
        }
        let segments = trimmed
            .split('/')
            .map(TaskSlug::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(segments))
    }

    /// Creates a path from already-validated segments.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeDomainError::EmptySlugPath`] when no segments are
    /// supplied.
    pub fn from_segments(
        segments: impl IntoIterator<Item = TaskSlug>,
    ) -> Result<Self, TaskTreeDomainError> {
        let collected: Vec<TaskSlug> = segments.into_iter().collect();
        if collected.is_empty() {
            return Err(TaskTreeDomainError::EmptySlugPath);
        }
        Ok(Self(collected))
    }

    /// Creates a one-segment path.
    #[must_use]
    pub fn from_single(slug: TaskSlug) -> Self {
        Self(vec![slug])
    }

    /// Returns the path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[TaskSlug] {
        &self.0
    }

    /// Returns a new path with `slug` appended.
    #[must_use]
    pub fn child(&self, slug: TaskSlug) -> Self {
        let mut segments = self.0.clone();
        segments.push(slug);
        Self(segments)
    }
}

impl TryFrom<String> for SlugPath {
    type Error = TaskTreeDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SlugPath> for String {
    fn from(path: SlugPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for SlugPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(TaskSlug::as_str)
            .collect::<Vec<_>>()
            .join("/");
        f.write_str(&joined)
    }
}
