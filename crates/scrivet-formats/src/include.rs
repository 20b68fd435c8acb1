// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use scrivet_engine::IncludeLoader;

/// Loads `$include` paths from files beneath a root directory.
///
/// Paths are resolved relative to the root; absolute paths and any path with
/// a `..` component are rejected before touching the filesystem. No cycle
/// detection is performed — a template that includes itself recurses until
/// the stack runs out, so keep include graphs acyclic or wrap the loader
/// with a depth budget.
pub struct DirLoader {
    root: PathBuf,
}

#[derive(Debug, Error)]
#[error("include path {path:?} escapes the template root")]
struct EscapesRoot {
    path: String,
}

impl DirLoader {
    /// Creates a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, EscapesRoot> {
        let relative = Path::new(path);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir));
        if escapes {
            return Err(EscapesRoot {
                path: path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl IncludeLoader for DirLoader {
    fn load(&self, path: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let full = self.resolve(path)?;
        Ok(fs::read_to_string(full)?)
    }
}
