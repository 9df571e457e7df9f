use std::env;
use std::path::{Path, PathBuf};

pub const ROOT_VARIABLE: &str = "SIGMO_ROOT";
pub const EXTENSION: &str = "mo";

/// Where `(import name)` looks for `name.mo`.
#[derive(Debug, Clone)]
pub struct Config {
    pub import_root: PathBuf,
    pub extension: &'static str,
}

impl Config {
    pub fn new<P: Into<PathBuf>>(import_root: P) -> Self {
        Self {
            import_root: import_root.into(),
            extension: EXTENSION,
        }
    }

    /// Reads the import root from `SIGMO_ROOT`, falling back to the working
    /// directory.
    pub fn from_env() -> Self {
        match env::var_os(ROOT_VARIABLE) {
            Some(root) => Self::new(root),
            None => Self::default(),
        }
    }

    pub fn module_path(&self, name: &str) -> PathBuf {
        self.import_root
            .join(format!("{}.{}", name, self.extension))
    }

    pub fn import_root(&self) -> &Path {
        &self.import_root
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_paths_join_root_and_extension() {
        let config = Config::new("/lib/sigmo");
        assert_eq!(
            config.module_path("math"),
            PathBuf::from("/lib/sigmo/math.mo")
        );
        assert_eq!(
            config.module_path("core/list"),
            PathBuf::from("/lib/sigmo/core/list.mo")
        );
    }
}
