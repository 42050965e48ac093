use std::path::PathBuf;

use crate::Error;
use crate::files;

/// Folder suggested to the dialog when none is given. Interpreted by the
/// portal, not expanded here.
pub const DEFAULT_FOLDER: &str = "~";

/// A validated copy request: what to copy and where the dialog should start
#[derive(Debug, Clone, PartialEq)]
pub struct CopyJob {
    pub source: PathBuf,
    pub folder: String,
    pub name: String,
}

impl CopyJob {
    /// Validate arguments before any bus activity.
    ///
    /// `source` must be an existing regular file. `folder` defaults to
    /// [`DEFAULT_FOLDER`], `name` to the base name of `source`.
    pub fn new(
        source: impl Into<PathBuf>,
        folder: Option<String>,
        name: Option<String>,
    ) -> Result<Self, Error> {
        let source = source.into();
        if !files::is_regular_file(&source) {
            return Err(Error::Usage(format!(
                "source file {} does not exist or is not a regular file",
                source.display()
            )));
        }

        let name = match name {
            Some(name) => name,
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::Usage(format!("cannot derive a file name from {}", source.display()))
                })?,
        };
        if name.is_empty() {
            return Err(Error::Usage("target name must not be empty".to_string()));
        }

        let folder = folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string());
        if folder.is_empty() {
            return Err(Error::Usage("target directory must not be empty".to_string()));
        }

        Ok(Self {
            source,
            folder,
            name,
        })
    }
}
