//! Feature model file service
//!
//! Loads and stores feature models through a [`FileSystem`] and a [`FeatureModelFormat`].

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::format::FeatureModelFormat;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::FeatureModel;
use crate::infrastructure::traits::FileSystem;

/// Service for reading and writing feature model files.
pub struct ModelService {
    fs: Arc<dyn FileSystem>,
    format: Arc<dyn FeatureModelFormat>,
    settings: Arc<Settings>,
}

impl ModelService {
    /// Create a new model service.
    pub fn new(fs: Arc<dyn FileSystem>, format: Arc<dyn FeatureModelFormat>, settings: Arc<Settings>) -> Self {
        Self { fs, format, settings }
    }

    pub fn format(&self) -> &dyn FeatureModelFormat {
        self.format.as_ref()
    }

    /// Parse a model file; identifiers come from a fresh chain built from the settings.
    pub fn load(&self, path: &Path) -> ApplicationResult<FeatureModel> {
        debug!("load: path={} format={}", path.display(), self.format.name());
        let text = self
            .fs
            .read_to_string(path)
            .map_err(|e| ApplicationError::file("read feature model", path, e))?;
        self.format.parse(&text, self.settings.identifier_factory())
    }

    /// Serialize a model and write it, creating parent directories as needed.
    pub fn store(&self, model: &FeatureModel, path: &Path) -> ApplicationResult<()> {
        debug!("store: path={} format={}", path.display(), self.format.name());
        let text = self.format.serialize(model)?;
        self.fs
            .ensure_parent(path)
            .map_err(|e| ApplicationError::file("create directory for", path, e))?;
        self.fs
            .write(path, &text)
            .map_err(|e| ApplicationError::file("write feature model", path, e))
    }

    /// Serialize without touching the filesystem.
    pub fn print(&self, model: &FeatureModel) -> ApplicationResult<String> {
        self.format.serialize(model)
    }
}
