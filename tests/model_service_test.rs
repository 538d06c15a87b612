//! Tests for ModelService

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use featmodel::application::services::ModelService;
use featmodel::application::{ApplicationError, JsonFormat};
use featmodel::config::{Settings, StrategyName};
use featmodel::domain::{Expression, FeatureModel, IdentifierFactory, IdentifierStrategy, Identifiable, Mutable};
use featmodel::infrastructure::di::ServiceContainer;
use featmodel::infrastructure::traits::{FileSystem, RealFileSystem};
use featmodel::util::testing;

/// In-memory filesystem recording created directories.
#[derive(Default)]
struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
    dirs: Mutex<Vec<PathBuf>>,
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.dirs.lock().unwrap().iter().any(|dir| dir == path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.dirs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

fn sample_model() -> FeatureModel {
    let mut model = FeatureModel::new(IdentifierFactory::counter()).unwrap();
    let root = model.root_feature().identifier().clone();
    let child = model.mutate().create_feature(&root, None).unwrap();
    model.mutate_feature(&root).unwrap().set_name("Editor");
    model.mutate_feature(&child).unwrap().set_name("Spellcheck");
    model
        .mutate()
        .create_constraint(Expression::implies(Expression::var("Spellcheck"), Expression::var("Editor")), None)
        .unwrap();
    model
}

#[test]
fn given_model_when_stored_and_loaded_then_files_are_identical() {
    testing::init_test_setup();
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("models").join("editor.json");
    let container = ServiceContainer::new(Settings::default());

    // Act
    container.models.store(&sample_model(), &path).unwrap();
    let loaded = container.models.load(&path).unwrap();

    // Assert
    assert!(path.exists());
    assert_eq!(loaded.number_of_features(), 2);
    assert_eq!(loaded.number_of_constraints(), 1);
    assert_eq!(
        container.models.print(&loaded).unwrap(),
        std::fs::read_to_string(&path).unwrap()
    );
}

#[test]
fn given_missing_file_when_loading_then_operation_failed_with_path() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.json");
    let service = ModelService::new(
        Arc::new(RealFileSystem),
        Arc::new(JsonFormat::default()),
        Arc::new(Settings::default()),
    );

    let result = service.load(&path);

    match result {
        Err(ApplicationError::OperationFailed { context, .. }) => assert!(context.contains("missing.json")),
        Err(other) => panic!("expected operation failure, got {}", other),
        Ok(_) => panic!("expected operation failure, got a model"),
    }
}

#[test]
fn given_memory_filesystem_when_storing_then_parent_directory_is_created_first() {
    testing::init_test_setup();
    let fs = Arc::new(MemoryFileSystem::default());
    let container = ServiceContainer::with_deps(Settings::default(), fs.clone());
    let path = PathBuf::from("/virtual/models/editor.json");

    container.models.store(&sample_model(), &path).unwrap();

    assert_eq!(*fs.dirs.lock().unwrap(), vec![PathBuf::from("/virtual/models")]);
    let written = fs.read_to_string(&path).unwrap();
    assert!(written.contains("Spellcheck"));
    assert_eq!(container.models.format().name(), "json");
}

#[test]
fn given_uuid_settings_when_loading_then_model_uses_uuid_identifiers() {
    testing::init_test_setup();
    let fs = Arc::new(MemoryFileSystem::default());
    let mut settings = Settings::default();
    settings.identifiers.strategy = StrategyName::Uuid;
    settings.format.pretty = false;
    let container = ServiceContainer::with_deps(settings, fs);
    let path = PathBuf::from("editor.json");
    container.models.store(&sample_model(), &path).unwrap();

    let loaded = container.models.load(&path).unwrap();

    assert_eq!(loaded.identifier_factory().strategy(), IdentifierStrategy::Uuid);
    assert_eq!(loaded.root_feature().identifier().strategy(), IdentifierStrategy::Uuid);
    assert_eq!(container.models.print(&loaded).unwrap().lines().count(), 1);
}
