//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner)
//! but are themselves concrete structs, not traits.

mod changelog;
mod export;
mod loader;

pub use changelog::ChangeLogService;
pub use export::{
    ExportOptions, ExportService, ExportSummary, IndexEntry, ObjectDocument, TransitionDocument,
    DEFAULT_TECH_TREE_DEPTH,
};
pub use loader::{
    Category, ContentLoader, RawId, TransitionRecord, CATEGORIES_DIR, OBJECTS_DIR,
    TRANSITIONS_FILE,
};
