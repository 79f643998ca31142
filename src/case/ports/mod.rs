//! Port contracts for case records.

pub mod repository;
pub mod template_source;

pub use repository::{CaseRepository, CaseRepositoryError, CaseRepositoryResult};
pub use template_source::{TaskTemplateSource, TemplateSourceError, TemplateSourceResult};
