//! Working-tree implementation of [`ChildrenSource`].
//!
//! Lists directories on disk. With gitignore handling enabled, ignored build
//! output is treated as absent, as it would be in the committed tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::error::{CorrelateError, CorrelateResult};
use super::existence::ChildrenSource;

/// Lists children of directories under a repository checkout.
pub struct WorkingTree {
    repo_dir: PathBuf,
    respect_gitignore: bool,
}

impl WorkingTree {
    pub fn new(repo_dir: impl Into<PathBuf>, respect_gitignore: bool) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            respect_gitignore,
        }
    }

    fn list(&self, dir: &str) -> CorrelateResult<Vec<String>> {
        let path = if dir.is_empty() {
            self.repo_dir.clone()
        } else {
            self.repo_dir.join(dir)
        };

        let mut builder = WalkBuilder::new(&path);
        builder
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_global(false)
            .git_exclude(self.respect_gitignore)
            .ignore(false)
            .parents(self.respect_gitignore)
            .follow_links(false)
            .max_depth(Some(1))
            .require_git(false);

        let mut children = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| CorrelateError::ChildrenSource {
                reason: format!("{}: {e}", path.display()),
            })?;
            if entry.depth() == 0 || entry.file_name() == ".git" {
                continue;
            }
            children.push(self.relative(entry.path())?);
        }

        children.sort_unstable();
        Ok(children)
    }

    fn relative(&self, path: &Path) -> CorrelateResult<String> {
        let relative = path
            .strip_prefix(&self.repo_dir)
            .map_err(|_| CorrelateError::ChildrenSource {
                reason: format!("{} is outside {}", path.display(), self.repo_dir.display()),
            })?;

        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

impl ChildrenSource for WorkingTree {
    fn children(&self, dirs: &[String]) -> CorrelateResult<HashMap<String, Vec<String>>> {
        dirs.iter()
            .map(|dir| Ok((dir.clone(), self.list(dir)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lists_immediate_children() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("pkg/inner")).unwrap();
        fs::write(root.join("main.go"), "package main").unwrap();
        fs::write(root.join("pkg/foo.go"), "package pkg").unwrap();
        fs::write(root.join("pkg/inner/bar.go"), "package inner").unwrap();

        let tree = WorkingTree::new(root, true);
        let listing = tree
            .children(&["".to_string(), "pkg".to_string()])
            .unwrap();

        assert_eq!(listing[""], vec!["main.go", "pkg"]);
        assert_eq!(listing["pkg"], vec!["pkg/foo.go", "pkg/inner"]);
    }

    #[test]
    fn test_gitignore_respected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "generated.go\n").unwrap();
        fs::write(root.join("generated.go"), "package main").unwrap();
        fs::write(root.join("kept.go"), "package main").unwrap();

        let listing = WorkingTree::new(root, true)
            .children(&["".to_string()])
            .unwrap();
        assert!(listing[""].contains(&"kept.go".to_string()));
        assert!(!listing[""].contains(&"generated.go".to_string()));

        let listing = WorkingTree::new(root, false)
            .children(&["".to_string()])
            .unwrap();
        assert!(listing[""].contains(&"generated.go".to_string()));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let tree = WorkingTree::new(temp_dir.path(), true);
        assert!(tree.children(&["nope".to_string()]).is_err());
    }
}
