//! Task templates read from a directory of JSON files.
//!
//! Each case type is looked up as `<case_type>.json`, for example
//! `planning_application.json`, holding a serialized [`TaskTemplate`].

use crate::case::{
    domain::CaseType,
    ports::{TaskTemplateSource, TemplateSourceError, TemplateSourceResult},
};
use crate::task_tree::domain::TaskTemplate;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

/// Template source confined to one directory.
#[derive(Debug)]
pub struct DirectoryTemplateSource {
    dir: Dir,
}

impl DirectoryTemplateSource {
    /// Wraps an already opened directory capability.
    #[must_use]
    pub const fn new(dir: Dir) -> Self {
        Self { dir }
    }

    /// Opens `path` with ambient authority.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateSourceError::Io`] when the directory cannot be
    /// opened.
    pub fn open(path: &Utf8Path) -> TemplateSourceResult<Self> {
        let dir =
            Dir::open_ambient_dir(path, ambient_authority()).map_err(TemplateSourceError::io)?;
        Ok(Self::new(dir))
    }

    /// Returns the file name holding the template for `case_type`.
    #[must_use]
    pub fn file_name(case_type: CaseType) -> String {
        format!("{}.json", case_type.as_str())
    }
}

impl TaskTemplateSource for DirectoryTemplateSource {
    fn template_for(&self, case_type: CaseType) -> TemplateSourceResult<TaskTemplate> {
        let contents = match self.dir.read_to_string(Self::file_name(case_type)) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateSourceError::Missing(case_type));
            }
            Err(err) => return Err(TemplateSourceError::io(err)),
        };
        let template: TaskTemplate =
            serde_json::from_str(&contents).map_err(TemplateSourceError::io)?;
        template
            .validate()
            .map_err(|source| TemplateSourceError::Invalid { case_type, source })?;
        Ok(template)
    }
}
