//! Checks for paths that must stay below a root directory

use std::path::{Component, Path};

/// Check that `path` names something strictly below the directory it is
/// joined onto
///
/// Rejects empty and absolute paths, `..` components, and paths such as `.`
/// that resolve to the root itself. Returns the reason on failure.
pub fn check_relative(path: &Path) -> Result<(), &'static str> {
    let mut named = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => named = true,
            Component::CurDir => {}
            Component::ParentDir => return Err("may not contain .."),
            Component::RootDir | Component::Prefix(_) => return Err("must be relative"),
        }
    }

    if path.as_os_str().is_empty() {
        Err("empty path")
    } else if !named {
        Err("must name something below the root")
    } else {
        Ok(())
    }
}
