//! Version population from git history
//!
//! The baseline tag versions every object present at that tag; each later
//! tag versions the objects added since the previous one.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ChangeLog, ObjectGraph, TagRules};
use crate::infrastructure::traits::CommandRunner;

/// Git-backed version classifier.
pub struct ChangeLogService {
    cmd: Arc<dyn CommandRunner>,
    rules: TagRules,
    released_only: bool,
    object_path: Regex,
}

impl ChangeLogService {
    pub fn new(cmd: Arc<dyn CommandRunner>, rules: TagRules, released_only: bool) -> Self {
        Self {
            cmd,
            rules,
            released_only,
            object_path: Regex::new(r"(?:^|/)objects/(\d+)\.txt$").expect("static regex"),
        }
    }

    /// Read the tag listing of `git_dir`.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch(&self, git_dir: &Path) -> ApplicationResult<ChangeLog> {
        let stdout = self.git(git_dir, &["tag"])?;
        let tags: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
        let log = ChangeLog::from_tags(&tags, &self.rules, self.released_only);
        for version in log.versions() {
            debug!("Found version: {}", version);
        }
        Ok(log)
    }

    /// Assign versions to objects; returns how many were assigned.
    ///
    /// Objects that already carry a version keep it.
    #[instrument(level = "debug", skip(self, log, graph))]
    pub fn populate(
        &self,
        git_dir: &Path,
        log: &ChangeLog,
        graph: &mut ObjectGraph,
    ) -> ApplicationResult<usize> {
        let mut assigned = 0;
        let mut previous: Option<&str> = None;
        for (number, tag) in log.tagged() {
            let listing = match previous {
                None => self.git(git_dir, &["ls-tree", "--name-only", tag.as_str(), "objects/"])?,
                Some(prev) => self.git(
                    git_dir,
                    &[
                        "diff",
                        "--name-only",
                        "--diff-filter=A",
                        prev,
                        tag.as_str(),
                        "--",
                        "objects/",
                    ],
                )?,
            };
            for id in self.object_ids(&listing) {
                let Some(object) = graph.lookup(id) else {
                    continue;
                };
                let object = graph.object_mut(object);
                if object.version.is_none() {
                    object.version = Some(*number);
                    assigned += 1;
                }
            }
            previous = Some(tag.as_str());
        }
        debug!("Assigned {} versions", assigned);
        Ok(assigned)
    }

    /// Count objects without a version, logging the count unless suppressed.
    pub fn report_missing(&self, graph: &ObjectGraph, suppress: bool) -> usize {
        let missing = graph.objects().filter(|(_, o)| o.version.is_none()).count();
        if !suppress {
            info!("{} objects are missing version", missing);
        }
        missing
    }

    fn object_ids<'a>(&self, listing: &'a str) -> Vec<&'a str> {
        listing
            .lines()
            .filter_map(|line| self.object_path.captures(line.trim()))
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    fn git(&self, git_dir: &Path, args: &[&str]) -> ApplicationResult<String> {
        let dir = git_dir.to_string_lossy();
        let mut full = vec!["-C", &*dir];
        full.extend_from_slice(args);

        let output = self
            .cmd
            .run("git", &full)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("run git {}", args.join(" ")),
                source: Box::new(e),
            })?;
        if !output.status.success() {
            return Err(ApplicationError::Git {
                message: format!(
                    "git {}: {}",
                    args.join(" "),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::process::Output;

    struct NoGit;

    impl CommandRunner for NoGit {
        fn run(&self, _cmd: &str, _args: &[&str]) -> io::Result<Output> {
            Err(io::Error::new(io::ErrorKind::NotFound, "git not installed"))
        }
    }

    #[test]
    fn given_listing_when_extracting_ids_then_keeps_object_files_only() {
        let service = ChangeLogService::new(Arc::new(NoGit), TagRules::new("v", vec![], 3), false);
        let listing = "objects/12.txt\nobjects/nextObjectNumber.txt\nsprites/3.tga\nobjects/7.txt\n";

        assert_eq!(service.object_ids(listing), vec!["12", "7"]);
    }

    #[test]
    fn given_failing_runner_when_fetching_then_reports_operation() {
        let service = ChangeLogService::new(Arc::new(NoGit), TagRules::new("v", vec![], 3), false);

        let err = service.fetch(Path::new("/nowhere")).unwrap_err();

        assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    }
}
