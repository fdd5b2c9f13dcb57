//! Where the registry, template workbooks and preview images live

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default registry file name
pub const DEFAULT_REGISTRY_FILE: &str = "models.json";
/// Default template workbook directory
pub const DEFAULT_TEMPLATES_DIR: &str = "models_excel";
/// Default preview image directory
pub const DEFAULT_IMAGES_DIR: &str = "models_images";

/// File locations, relative to the working directory unless rooted
/// with [`Settings::with_root`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub registry_file: PathBuf,
    pub templates_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_file: PathBuf::from(DEFAULT_REGISTRY_FILE),
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
        }
    }
}

impl Settings {
    /// Default layout under `root`
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self::default().rooted_at(root)
    }

    /// Resolve every relative location against `root`. Absolute ones are kept.
    pub fn rooted_at<P: AsRef<Path>>(self, root: P) -> Self {
        let root = root.as_ref();
        Self {
            registry_file: root.join(self.registry_file),
            templates_dir: root.join(self.templates_dir),
            images_dir: root.join(self.images_dir),
        }
    }
}
