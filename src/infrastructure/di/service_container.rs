//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{ChangeLogService, ContentLoader, ExportService};
use crate::config::Settings;
use crate::infrastructure::traits::{CommandRunner, FileSystem, RealCommandRunner, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(RealCommandRunner),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, cmd }
    }

    pub fn loader(&self) -> ContentLoader {
        ContentLoader::new(Arc::clone(&self.fs))
    }

    pub fn changelog(&self) -> ChangeLogService {
        ChangeLogService::new(
            Arc::clone(&self.cmd),
            self.settings.versions.tag_rules(),
            self.settings.versions.released_only,
        )
    }

    pub fn exporter(&self) -> ExportService {
        ExportService::new(Arc::clone(&self.fs), self.settings.export_options())
    }
}
