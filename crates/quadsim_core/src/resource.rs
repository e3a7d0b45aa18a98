//! Resource lookup
//!
//! Resource paths in scene files are relative (`anymal/anymal.urdf`). They
//! are resolved against an ordered list of root directories; the first root
//! containing the file wins.

use std::path::{Path, PathBuf};

use crate::asset_error::AssetError;

#[derive(Clone, Debug, Default)]
pub struct ResourceLocator {
    roots: Vec<PathBuf>,
}

impl ResourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.add_root(root);
        self
    }

    pub fn add_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find an existing file; absolute paths are checked as-is
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf, AssetError> {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            if relative.is_file() {
                return Ok(relative.to_path_buf());
            }
        } else if let Some(found) = self
            .roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
        {
            log::debug!("Resolved {} to {}", relative.display(), found.display());
            return Ok(found);
        }

        Err(AssetError::NotFound {
            path: relative.display().to_string(),
            searched: self.roots.iter().map(|r| r.display().to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("quadsim_resource_{}_{}", name, std::process::id()));
        fs::create_dir_all(dir.join("robot")).unwrap();
        dir
    }

    #[test]
    fn test_first_root_wins() {
        let a = temp_root("first_a");
        let b = temp_root("first_b");
        fs::write(a.join("robot/model.urdf"), "a").unwrap();
        fs::write(b.join("robot/model.urdf"), "b").unwrap();

        let locator = ResourceLocator::new().with_root(&a).with_root(&b);
        assert_eq!(locator.resolve("robot/model.urdf").unwrap(), a.join("robot/model.urdf"));

        fs::remove_dir_all(a).ok();
        fs::remove_dir_all(b).ok();
    }

    #[test]
    fn test_falls_through_to_later_root() {
        let a = temp_root("fall_a");
        let b = temp_root("fall_b");
        fs::write(b.join("robot/model.urdf"), "b").unwrap();

        let locator = ResourceLocator::new().with_root(&a).with_root(&b);
        assert_eq!(locator.resolve("robot/model.urdf").unwrap(), b.join("robot/model.urdf"));

        fs::remove_dir_all(a).ok();
        fs::remove_dir_all(b).ok();
    }

    #[test]
    fn test_missing_resource() {
        let locator = ResourceLocator::new().with_root("/definitely/not/here");
        match locator.resolve("robot/model.urdf") {
            Err(AssetError::NotFound { path, searched }) => {
                assert_eq!(path, "robot/model.urdf");
                assert_eq!(searched, vec!["/definitely/not/here".to_string()]);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_is_not_a_resource() {
        let a = temp_root("dir");
        let locator = ResourceLocator::new().with_root(&a);
        assert!(locator.resolve("robot").is_err());
        fs::remove_dir_all(a).ok();
    }
}
