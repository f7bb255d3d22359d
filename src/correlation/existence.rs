//! Ground truth for which document paths exist in the repository.
//!
//! The repository tree is only reachable through a [`ChildrenSource`], which
//! lists the immediate children of a batch of directories. The checker walks
//! the tree breadth-first from the root, descending only into directories that
//! are ancestors of some document, and remembers every listing it sees.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::error::CorrelateResult;

/// Lists the children of repository directories.
///
/// Directory and child paths are repository-relative, `/`-separated, with the
/// repository root spelled as the empty string. Children are returned as full
/// repository-relative paths (`"src/main.go"`, not `"main.go"`).
pub trait ChildrenSource {
    fn children(&self, dirs: &[String]) -> CorrelateResult<HashMap<String, Vec<String>>>;
}

impl<F> ChildrenSource for F
where
    F: Fn(&[String]) -> CorrelateResult<HashMap<String, Vec<String>>>,
{
    fn children(&self, dirs: &[String]) -> CorrelateResult<HashMap<String, Vec<String>>> {
        self(dirs)
    }
}

#[derive(Debug, Default)]
pub struct ExistenceChecker {
    root: String,
    directory_contents: HashMap<String, HashSet<String>>,
}

impl ExistenceChecker {
    /// Walk the repository far enough to answer for every path in `paths`.
    ///
    /// `paths` are relative to `root`, which is itself relative to the
    /// repository root.
    pub fn new<'a>(
        root: &str,
        paths: impl IntoIterator<Item = &'a str>,
        source: &dyn ChildrenSource,
    ) -> CorrelateResult<Self> {
        let mut needed_dirs: HashSet<String> = HashSet::new();
        for path in paths {
            let Some(path) = clean_path(&join_path(root, path)) else {
                continue;
            };
            let mut dir = parent_dir(&path).to_string();
            while needed_dirs.insert(dir.clone()) && !dir.is_empty() {
                dir = parent_dir(&dir).to_string();
            }
        }

        let mut directory_contents = HashMap::new();
        let mut frontier: Vec<String> = if needed_dirs.contains("") {
            vec![String::new()]
        } else {
            Vec::new()
        };
        let mut depth = 0usize;

        while !frontier.is_empty() {
            let mut listing = source.children(&frontier)?;
            let mut next = Vec::new();

            for dir in frontier {
                let children: HashSet<String> =
                    listing.remove(&dir).unwrap_or_default().into_iter().collect();
                next.extend(
                    children
                        .iter()
                        .filter(|child| needed_dirs.contains(child.as_str()))
                        .cloned(),
                );
                directory_contents.insert(dir, children);
            }

            next.sort_unstable();
            debug!(depth, directories = next.len(), "descending repository tree");
            frontier = next;
            depth += 1;
        }

        Ok(Self {
            root: root.to_string(),
            directory_contents,
        })
    }

    /// Whether `path` (relative to the root) names a file in the repository.
    pub fn should_include(&self, path: &str) -> bool {
        let Some(path) = clean_path(&join_path(&self.root, path)) else {
            return false;
        };
        self.directory_contents
            .get(parent_dir(&path))
            .is_some_and(|children| children.contains(&path))
    }
}

fn join_path(root: &str, path: &str) -> String {
    if root.is_empty() {
        path.to_string()
    } else {
        format!("{root}/{path}")
    }
}

/// Lexically normalize a `/`-separated path. `None` if it escapes the root.
pub fn clean_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            _ => parts.push(part),
        }
    }
    Some(parts.join("/"))
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}
