use crate::error::Result;
use std::collections::HashSet;
use std::io::{Error, ErrorKind};
use std::path::Path;
use walkdir::WalkDir;

/// Names present in the target directory when the run started.
///
/// Captured once and never refreshed; files written during the run are not
/// added.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    names: HashSet<String>,
}

impl DirectorySnapshot {
    pub fn capture<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let root = directory.as_ref();

        if !root.is_dir() {
            let kind = if root.exists() {
                ErrorKind::InvalidInput
            } else {
                ErrorKind::NotFound
            };
            return Err(Error::new(kind, format!("{} is not a directory", root.display())).into());
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        let mut names = HashSet::new();
        for entry in walker {
            let entry = entry.map_err(Error::from)?;

            // Non UTF-8 names can never match a manifest token
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }

        tracing::debug!(
            directory = %root.display(),
            entries = names.len(),
            "captured directory snapshot"
        );

        Ok(Self { names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
