use crate::error::{CriteriaError, CriterionCreationError};
use crate::utils::file_stem;
use crate::version::Version;
use std::path::{Path, PathBuf};

/// How files found in a directory are ordered before being inserted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileOrdering {
    /// Lexical order of absolute paths.
    #[default]
    ByAbsolutePath,
    /// Order of the version the file stem holds, like `1.2.0.novella`.
    ByVersionNumber,
    Inverse(Box<FileOrdering>),
}

impl FileOrdering {
    /// Reversed ordering. Inverting an inversion gives the original ordering back.
    pub fn inverse(&self) -> FileOrdering {
        match self {
            FileOrdering::Inverse(inner) => (**inner).clone(),
            other => FileOrdering::Inverse(Box::new(other.clone())),
        }
    }

    /// Sorts the files, or fails with every file whose sort key could not be derived.
    pub fn sort(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>, CriteriaError> {
        match self {
            FileOrdering::ByAbsolutePath => {
                let mut sorted = files.to_vec();
                sorted.sort_by_key(|file| absolute(file));
                Ok(sorted)
            }
            FileOrdering::ByVersionNumber => {
                let mut keyed = Vec::with_capacity(files.len());
                let mut failures = Vec::new();
                for file in files {
                    match Version::parse(&file_stem(file)) {
                        Ok(version) => keyed.push((version, absolute(file), file.clone())),
                        Err(err) => failures.push(CriterionCreationError {
                            path: file.clone(),
                            message: err.to_string(),
                        }),
                    }
                }
                if !failures.is_empty() {
                    return Err(CriteriaError { failures });
                }
                keyed.sort();
                Ok(keyed.into_iter().map(|(_, _, file)| file).collect())
            }
            FileOrdering::Inverse(inner) => {
                let mut sorted = inner.sort(files)?;
                sorted.reverse();
                Ok(sorted)
            }
        }
    }
}

fn absolute(file: &Path) -> PathBuf {
    std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf())
}
