//! Batch conversion across projects.
//!
//! Projects are directories holding files that match [`ProjectPatterns`].
//! Units of work (projects, or single files) run on a bounded pool: a
//! semaphore caps concurrency at `max_workers` and each unit runs its file
//! I/O on tokio's blocking pool. Every input unit yields exactly one result,
//! in input order, whatever happens to the others.

mod patterns;

pub use patterns::{ProjectPatterns, DEFAULT_EXCLUDES, DEFAULT_PATTERNS};

use crate::convert::{ConversionResult, Converter};
use crate::error::{Error, Result};
use crate::report::{BatchResult, ProjectResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn};

/// How a unit of work ended.
enum Outcome<R> {
    Done(R),
    Skipped,
    Failed(String),
}

/// Discovers projects and runs the converter across them.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    converter: Converter,
    patterns: Arc<ProjectPatterns>,
    timeout: Option<Duration>,
}

impl BatchProcessor {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter,
            patterns: Arc::new(ProjectPatterns::default()),
            timeout: None,
        }
    }

    pub fn with_patterns(mut self, patterns: ProjectPatterns) -> Self {
        self.patterns = Arc::new(patterns);
        self
    }

    /// Units that have not started when the timeout expires are skipped.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn patterns(&self) -> &ProjectPatterns {
        &self.patterns
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Directories under `root` that hold matching files.
    ///
    /// Only the outermost qualifying directory is reported, so `roles/`
    /// inside a project is never a project of its own. Hidden directories
    /// are never entered.
    pub fn discover_projects(&self, root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::file_access_msg(root, "not a directory"));
        }

        let projects = self.patterns.project_roots(root)?;
        for project in &projects {
            debug!("Discovered project {}", project.display());
        }

        info!("Discovered {} project(s) under {}", projects.len(), root.display());
        Ok(projects)
    }

    /// Converts every matching file of one project.
    ///
    /// Never fails: an unreadable project yields a failed result.
    pub fn convert_project(&self, project: impl AsRef<Path>, dry_run: bool) -> ProjectResult {
        let project = project.as_ref();
        let _span = info_span!("convert_project", path = %project.display()).entered();
        let started = Instant::now();

        if !project.is_dir() {
            let err = Error::file_access_msg(project, "project directory does not exist");
            warn!("{}", err);
            return ProjectResult::failed(project, err.to_string());
        }

        let files = match self.patterns.matching_files(project) {
            Ok(files) => files,
            Err(e) => {
                warn!("{}", e);
                return ProjectResult::failed(project, e.to_string());
            }
        };

        let file_results: Vec<ConversionResult> = files
            .iter()
            .map(|file| self.converter.convert_file(file, dry_run))
            .collect();

        let result = ProjectResult::from_files(project, file_results, started.elapsed());
        info!(
            "{}: {} file(s), {} module(s) converted",
            result.status, result.files_processed, result.modules_converted
        );
        result
    }

    /// Converts many projects on at most `max_workers` workers.
    ///
    /// Results come back in input order, one per input.
    pub async fn process_projects(
        &self,
        projects: &[PathBuf],
        dry_run: bool,
        max_workers: usize,
    ) -> Vec<ProjectResult> {
        let this = self.clone();
        let outcomes = fan_out(projects.to_vec(), max_workers, self.timeout, move |project| {
            this.convert_project(&project, dry_run)
        })
        .await;

        projects
            .iter()
            .zip(outcomes)
            .map(|(project, outcome)| match outcome {
                Outcome::Done(result) => result,
                Outcome::Skipped => {
                    warn!("Skipped {}: deadline reached", project.display());
                    ProjectResult::skipped(project, "not started before the batch deadline")
                }
                Outcome::Failed(message) => ProjectResult::failed(project, message),
            })
            .collect()
    }

    /// Converts individual files on at most `max_workers` workers.
    ///
    /// Results come back in input order, one per input.
    pub async fn convert_files(
        &self,
        files: &[PathBuf],
        dry_run: bool,
        max_workers: usize,
    ) -> Vec<ConversionResult> {
        let converter = self.converter.clone();
        let outcomes = fan_out(files.to_vec(), max_workers, self.timeout, move |file| {
            converter.convert_file(&file, dry_run)
        })
        .await;

        files
            .iter()
            .zip(outcomes)
            .map(|(file, outcome)| match outcome {
                Outcome::Done(result) => result,
                Outcome::Skipped => unit_failure(file, "not started before the batch deadline"),
                Outcome::Failed(message) => unit_failure(file, &message),
            })
            .collect()
    }

    /// Discovers projects under `root` and converts them.
    pub async fn run(
        &self,
        root: impl AsRef<Path>,
        dry_run: bool,
        max_workers: usize,
    ) -> Result<BatchResult> {
        let started = Instant::now();
        let root = root.as_ref().to_path_buf();
        let this = self.clone();
        let projects = tokio::task::spawn_blocking(move || this.discover_projects(&root))
            .await
            .map_err(|e| Error::Internal(format!("discovery task failed: {}", e)))??;

        let results = self.process_projects(&projects, dry_run, max_workers).await;
        Ok(BatchResult::new(results, started.elapsed()))
    }
}

fn unit_failure(file: &Path, message: &str) -> ConversionResult {
    ConversionResult::failure(Some(file.to_path_buf()), Error::Internal(message.to_string()))
}

/// Runs `work` over `units` with bounded concurrency.
async fn fan_out<T, R, F>(
    units: Vec<T>,
    max_workers: usize,
    timeout: Option<Duration>,
    work: F,
) -> Vec<Outcome<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
    let work = Arc::new(work);
    let total = units.len();

    let mut set = JoinSet::new();
    for (idx, unit) in units.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let work = Arc::clone(&work);
        set.spawn(async move {
            let permit = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, semaphore.acquire_owned()).await {
                        Ok(Ok(permit)) => permit,
                        _ => return (idx, Outcome::Skipped),
                    }
                }
                None => match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (idx, Outcome::Skipped),
                },
            };
            if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                return (idx, Outcome::Skipped);
            }
            let joined = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                work(unit)
            })
            .await;
            match joined {
                Ok(result) => (idx, Outcome::Done(result)),
                Err(e) => (idx, Outcome::Failed(format!("worker failed: {}", e))),
            }
        });
    }

    let mut slots: Vec<Option<Outcome<R>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, outcome)) => slots[idx] = Some(outcome),
            Err(e) => warn!("Batch worker aborted: {}", e),
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Outcome::Failed("worker did not report a result".into())))
        .collect()
}
