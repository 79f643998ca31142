//! [`TaskTemplateSource`](crate::case::ports::TaskTemplateSource) adapters.

mod builtin;
mod directory;

pub use builtin::BuiltinTemplateSource;
pub use directory::DirectoryTemplateSource;
