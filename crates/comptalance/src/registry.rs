//! The list of workbook templates a user can merge balances into
//!
//! Templates are described in a JSON array:
//!
//! ```json
//! [
//!   { "nom": "Modèle A", "file_path": "modele_a.xlsx", "description": "Liasse simplifiée", "imgs": ["a1.png"] }
//! ]
//! ```
//!
//! `file_path` is relative to the template directory and every `imgs` entry
//! to the image directory (see [`Settings`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// One entry of the template registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    #[serde(rename = "nom")]
    pub name: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imgs", default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// A preview image of a template, resolved against the image directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateImage {
    pub path: PathBuf,
    pub exists: bool,
}

/// Ordered, read-only list of templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateRegistry {
    templates: Vec<TemplateDescriptor>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<TemplateDescriptor>) -> Self {
        Self { templates }
    }

    /// Read the registry file. Never fails: a missing or malformed file
    /// gives an empty registry and a warning.
    pub fn load_all<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("cannot read template registry {}: {e}", path.display());
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(registry) => {
                log::debug!("{} templates in {}", registry.len(), path.display());
                registry
            }
            Err(e) => {
                log::warn!("ignoring malformed template registry {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json).map(Self::new)
    }

    pub fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TemplateDescriptor> {
        self.templates.get(index)
    }

    /// Position of the template called `name`, ignoring case.
    ///
    /// Falls back to 0, the first template, when nothing matches.
    pub fn index_of(&self, name: &str) -> usize {
        let wanted = name.to_lowercase();
        self.templates
            .iter()
            .position(|template| template.name.to_lowercase() == wanted)
            .unwrap_or(0)
    }

    /// Workbook file of the template at `index`
    pub fn template_path(&self, index: usize, settings: &Settings) -> Option<PathBuf> {
        self.get(index)
            .map(|template| settings.templates_dir.join(&template.file_path))
    }

    /// Preview images of the template at `index`. Missing files are kept in
    /// the list, flagged and reported with a warning.
    pub fn image_paths(&self, index: usize, settings: &Settings) -> Vec<TemplateImage> {
        let Some(template) = self.get(index) else {
            return Vec::new();
        };

        template
            .images
            .iter()
            .map(|image| {
                let path = settings.images_dir.join(image);
                let exists = path.is_file();
                if !exists {
                    log::warn!("image not found: {}", path.display());
                }
                TemplateImage { path, exists }
            })
            .collect()
    }
}
