//! Content loading service
//!
//! Reads a content directory into an [`ObjectGraph`]:
//! - `objects/<id>.txt`: one object per file
//! - `categories/<id>.txt`: optional category listings
//! - `transitions.json`: transition records
//!
//! The difficulty classifier runs once everything is wired.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    classify_depths, DomainError, GameObject, ObjectGraph, ObjectId, ObjectRef, Transition,
};
use crate::infrastructure::traits::FileSystem;

pub const OBJECTS_DIR: &str = "objects";
pub const CATEGORIES_DIR: &str = "categories";
pub const TRANSITIONS_FILE: &str = "transitions.json";

/// Object reference as written in `transitions.json`; both `"12"` and `12`
/// are accepted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    /// `None` for the "no object" markers (`""`, `"0"`, `"-1"`).
    fn resolve(&self) -> Option<String> {
        let id = match self {
            RawId::Text(s) => s.trim().to_string(),
            RawId::Number(n) => n.to_string(),
        };
        match id.as_str() {
            "" | "0" | "-1" => None,
            _ => Some(id),
        }
    }
}

/// One entry of `transitions.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    #[serde(rename = "actorID")]
    pub actor_id: Option<RawId>,
    #[serde(rename = "targetID")]
    pub target_id: Option<RawId>,
    #[serde(rename = "newActorID")]
    pub new_actor_id: Option<RawId>,
    #[serde(rename = "newTargetID")]
    pub new_target_id: Option<RawId>,
    pub decay: Option<u32>,
    #[serde(default)]
    pub tool: bool,
    pub hand: Option<bool>,
}

/// A category file: its parent id and the objects it lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub parent: ObjectId,
    pub members: Vec<ObjectId>,
}

impl Category {
    /// Parse `parentID=<id>`, optional `pattern`, `numObjects=N`, then one
    /// id per line.
    pub fn parse(content: &str, path: &str) -> Result<Self, DomainError> {
        let invalid = |message: &str| DomainError::InvalidCategory {
            path: path.to_string(),
            message: message.to_string(),
        };

        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
        let parent = lines
            .next()
            .and_then(|l| l.strip_prefix("parentID="))
            .ok_or_else(|| invalid("missing parentID"))?;

        let mut members = Vec::new();
        let mut listing = false;
        for line in lines {
            if !listing {
                listing = line.starts_with("numObjects=");
                continue;
            }
            // weighted sets append `#<weight>` or a second column
            let id = line
                .split(|c: char| c == '#' || c.is_whitespace())
                .next()
                .unwrap_or_default();
            if !id.is_empty() {
                members.push(ObjectId::new(id));
            }
        }
        if !listing {
            return Err(invalid("missing numObjects"));
        }

        Ok(Self {
            parent: ObjectId::new(parent.trim()),
            members,
        })
    }
}

/// Content loading service.
pub struct ContentLoader {
    fs: Arc<dyn FileSystem>,
}

impl ContentLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load and classify a content directory.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, data_dir: &Path) -> ApplicationResult<ObjectGraph> {
        let objects_dir = data_dir.join(OBJECTS_DIR);
        if !self.fs.is_dir(&objects_dir) {
            return Err(ApplicationError::ContentNotFound(objects_dir));
        }

        let mut graph = ObjectGraph::new();
        self.load_objects(&objects_dir, &mut graph)?;
        self.load_categories(&data_dir.join(CATEGORIES_DIR), &mut graph)?;
        self.load_transitions(&data_dir.join(TRANSITIONS_FILE), &mut graph)?;
        classify_depths(&mut graph);

        info!(
            "Loaded {} objects, {} transitions",
            graph.object_count(),
            graph.transition_count()
        );
        Ok(graph)
    }

    fn load_objects(&self, dir: &Path, graph: &mut ObjectGraph) -> ApplicationResult<()> {
        for path in self.fs.list_files(dir, "txt").with_path_context("list objects", dir)? {
            if !is_numeric_stem(&path) {
                debug!("Skipping non-object file {}", path.display());
                continue;
            }
            let content = self
                .fs
                .read_to_string(&path)
                .with_path_context("read object", &path)?;
            let object = GameObject::parse(&content).map_err(|e| invalid_content(&path, e))?;
            graph
                .insert_object(object)
                .map_err(|e| invalid_content(&path, e))?;
        }
        Ok(())
    }

    fn load_categories(&self, dir: &Path, graph: &mut ObjectGraph) -> ApplicationResult<()> {
        if !self.fs.is_dir(dir) {
            debug!("No categories directory at {}", dir.display());
            return Ok(());
        }
        for path in self
            .fs
            .list_files(dir, "txt")
            .with_path_context("list categories", dir)?
        {
            if !is_numeric_stem(&path) {
                continue;
            }
            let content = self
                .fs
                .read_to_string(&path)
                .with_path_context("read category", &path)?;
            let category = Category::parse(&content, &path.to_string_lossy())?;
            for member in &category.members {
                match graph.lookup(member.as_str()) {
                    Some(object) => graph
                        .object_mut(object)
                        .categories
                        .push(category.parent.clone()),
                    None => warn!(
                        "Category {} lists unknown object {}",
                        category.parent, member
                    ),
                }
            }
        }
        Ok(())
    }

    fn load_transitions(&self, path: &Path, graph: &mut ObjectGraph) -> ApplicationResult<()> {
        if !self.fs.is_file(path) {
            warn!("No transitions file at {}", path.display());
            return Ok(());
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read transitions", path)?;
        let records: Vec<TransitionRecord> =
            serde_json::from_str(&content).map_err(|e| ApplicationError::InvalidContent {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut skipped = 0;
        for record in &records {
            match Self::resolve(graph, record) {
                Ok(transition) => {
                    graph.insert_transition(transition);
                }
                Err(id) => {
                    warn!("Skipping transition referencing unknown object {}", id);
                    skipped += 1;
                }
            }
        }
        debug!("Loaded {} transitions, skipped {}", records.len() - skipped, skipped);
        Ok(())
    }

    /// Turn a record into a transition; fails with the first unknown id.
    fn resolve(graph: &ObjectGraph, record: &TransitionRecord) -> Result<Transition, String> {
        let lookup = |raw: &Option<RawId>| -> Result<Option<ObjectRef>, String> {
            match raw.as_ref().and_then(RawId::resolve) {
                None => Ok(None),
                Some(id) => graph.lookup(&id).map(Some).ok_or(id),
            }
        };

        let actor = lookup(&record.actor_id)?;
        let target = lookup(&record.target_id)?;
        let decay = record.decay.filter(|d| *d > 0);
        let hand = record
            .hand
            .unwrap_or(actor.is_none() && decay.is_none() && target.is_some());

        Ok(Transition {
            actor,
            target,
            new_actor: lookup(&record.new_actor_id)?,
            new_target: lookup(&record.new_target_id)?,
            decay,
            tool: record.tool,
            hand,
        })
    }
}

fn is_numeric_stem(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
}

fn invalid_content(path: &Path, e: DomainError) -> ApplicationError {
    ApplicationError::InvalidContent {
        path: PathBuf::from(path),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_category_file_when_parsing_then_lists_members() {
        let content = "parentID=1000\npattern\nnumObjects=3\n10\n11 0.5\n12#2\n";

        let category = Category::parse(content, "categories/1000.txt").unwrap();

        assert_eq!(category.parent, ObjectId::new("1000"));
        assert_eq!(
            category.members,
            vec![ObjectId::new("10"), ObjectId::new("11"), ObjectId::new("12")]
        );
    }

    #[test]
    fn given_category_without_parent_when_parsing_then_errors() {
        let result = Category::parse("numObjects=1\n10\n", "categories/x.txt");
        assert!(matches!(result, Err(DomainError::InvalidCategory { .. })));
    }

    #[test]
    fn given_absent_markers_when_resolving_raw_id_then_none() {
        assert_eq!(RawId::Text("0".into()).resolve(), None);
        assert_eq!(RawId::Text("-1".into()).resolve(), None);
        assert_eq!(RawId::Text(" ".into()).resolve(), None);
        assert_eq!(RawId::Number(-1).resolve(), None);
        assert_eq!(RawId::Number(30).resolve(), Some("30".to_string()));
    }

    #[test]
    fn given_record_json_when_deserializing_then_accepts_strings_and_numbers() {
        let records: Vec<TransitionRecord> = serde_json::from_str(
            r#"[{"actorID": "33", "targetID": 32, "newTargetID": "34", "tool": true}]"#,
        )
        .unwrap();

        assert_eq!(records[0].actor_id, Some(RawId::Text("33".into())));
        assert_eq!(records[0].target_id, Some(RawId::Number(32)));
        assert!(records[0].tool);
        assert_eq!(records[0].hand, None);
    }
}
