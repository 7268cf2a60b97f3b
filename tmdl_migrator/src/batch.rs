//! Batch migration of a folder of table definition documents
//!
//! Runs a `MigrationRequest` over its documents in request order, sequentially or
//! across worker threads, and aggregates the per-document reports. Only
//! folder-level problems (missing folder, nothing to do, too many files) are
//! errors here; everything that goes wrong inside one document is carried in its
//! `FileReport`.

use crate::config::compile_time::batch_processing::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::config::runtime::{BatchPreferences, FileProcessorPreferences};
use crate::document;
use crate::file_processor::FileProcessor;
use crate::logging::codes;
use crate::migration::{FileReport, MigrationRequest, RequestError};
use crate::pipeline;
use crate::rewrite::ConnectionTarget;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

/// Reported after each document reaches its terminal state
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Monotonically increasing across the run
    pub completed: usize,
    pub total: usize,
    pub report: FileReport,
}

pub type ProgressCallback = Arc<dyn Fn(&BatchProgress) + Send + Sync>;

#[derive(Clone)]
pub struct BatchConfig {
    /// 1 runs sequentially; capped at the build profile's worker limit
    pub max_threads: usize,
    /// Descend into subfolders when discovering documents
    pub recursive: bool,
    /// Print a progress line to stderr per document
    pub progress_reporting: bool,
    pub progress_callback: Option<ProgressCallback>,
    pub file_processor: FileProcessorPreferences,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let prefs = BatchPreferences::default();
        Self {
            max_threads: prefs.default_threads,
            recursive: false,
            progress_reporting: prefs.progress_reporting,
            progress_callback: None,
            file_processor: FileProcessorPreferences::default(),
        }
    }
}

impl BatchConfig {
    pub fn with_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_progress_reporting(mut self, enabled: bool) -> Self {
        self.progress_reporting = enabled;
        self
    }

    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BatchProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    fn effective_threads(&self) -> usize {
        self.max_threads.clamp(1, MAX_WORKER_THREADS)
    }
}

impl std::fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConfig")
            .field("max_threads", &self.max_threads)
            .field("recursive", &self.recursive)
            .field("progress_reporting", &self.progress_reporting)
            .field("progress_callback", &self.progress_callback.is_some())
            .field("file_processor", &self.file_processor)
            .finish()
    }
}

/// Aggregate outcome of a run, reports in request order
#[derive(Debug, Clone, Serialize)]
pub struct BatchResults {
    pub folder: PathBuf,
    pub target: ConnectionTarget,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub successes: usize,
    pub reports: Vec<FileReport>,
    #[serde(skip)]
    pub processing_duration: Duration,
}

impl BatchResults {
    fn new(folder: PathBuf, target: ConnectionTarget, started_at: DateTime<Utc>) -> Self {
        Self {
            folder,
            target,
            started_at,
            finished_at: started_at,
            total: 0,
            successes: 0,
            reports: Vec::new(),
            processing_duration: Duration::ZERO,
        }
    }

    fn finish(&mut self, reports: Vec<FileReport>, processing_duration: Duration) {
        self.total = reports.len();
        self.successes = status_counts(&reports).0;
        self.reports = reports;
        self.processing_duration = processing_duration;
        self.finished_at = Utc::now();
    }

    pub fn error_count(&self) -> usize {
        status_counts(&self.reports).2
    }

    pub fn skipped_count(&self) -> usize {
        status_counts(&self.reports).1
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Migration completed: {} of {} documents migrated, {} skipped, {} failed, {:.2}s total",
            self.successes,
            self.total,
            self.skipped_count(),
            self.error_count(),
            self.processing_duration.as_secs_f64()
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Invalid migration request: {0}")]
    Request(#[from] RequestError),

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No table definition documents found in: {path}")]
    NoFilesFound { path: String },

    #[error("Too many files: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("Worker thread failed: {message}")]
    ThreadError { message: String },
}

impl BatchError {
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::Request(inner) => inner.error_code(),
            Self::DirectoryNotFound { .. } => codes::batch::DIRECTORY_NOT_FOUND,
            Self::NoFilesFound { .. } => codes::batch::NO_FILES_FOUND,
            Self::TooManyFiles { .. } => codes::batch::TOO_MANY_FILES,
            Self::ThreadError { .. } => codes::batch::WORKER_FAILURE,
        }
    }
}

// ============================================================================
// FILE DISCOVERY
// ============================================================================

/// A `.tmdl` document that carries a partition marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredDocument {
    /// Name relative to the folder, as used in requests
    pub file: String,
    pub path: PathBuf,
    /// Default target table: the file stem
    pub table: String,
}

/// All `.tmdl` files under a folder, sorted by path
pub fn list_tmdl_files(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>, BatchError> {
    if !folder.is_dir() {
        return Err(BatchError::DirectoryNotFound {
            path: folder.display().to_string(),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| is_tmdl_file(path))
        .collect();

    files.sort();
    Ok(files)
}

/// Documents under `folder` that are eligible for migration
pub fn discover_documents(
    folder: &Path,
    recursive: bool,
) -> Result<Vec<DiscoveredDocument>, BatchError> {
    crate::log_info!("Starting document discovery",
        "directory" => folder.display(),
        "recursive" => recursive
    );

    let candidates = list_tmdl_files(folder, recursive)?;
    let processor = FileProcessor::new();
    let mut documents = Vec::new();

    for path in &candidates {
        // Unreadable documents are logged by the reader and left out.
        let Ok(file_result) = processor.process_file(path) else {
            continue;
        };
        if !document::has_partition_marker(&file_result.source) {
            continue;
        }

        let file = relative_name(folder, path);
        documents.push(DiscoveredDocument {
            table: crate::migration::default_table_name(&file),
            file,
            path: path.clone(),
        });
    }

    crate::log_success!(
        codes::success::DISCOVERY_COMPLETE,
        "Document discovery completed",
        "candidates" => candidates.len(),
        "eligible" => documents.len(),
        "directory" => folder.display()
    );

    Ok(documents)
}

fn is_tmdl_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("tmdl"))
            .unwrap_or(false)
}

fn relative_name(folder: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(folder).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

#[derive(Debug, Clone)]
struct WorkItem {
    index: usize,
    file: String,
    path: PathBuf,
    table: String,
}

/// Request order with repeated documents removed. Names that resolve to the
/// same file count as repeats; missing files are compared by joined path.
fn plan_work(request: &MigrationRequest, files: Vec<String>) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(files.len());

    for file in files {
        let path = request.folder.join(&file);
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            crate::log_warning!(codes::batch::DUPLICATE_FILE,
                "Duplicate document in request; processed once",
                "file" => &file);
            continue;
        }

        items.push(WorkItem {
            index: items.len(),
            table: request.table_name_for(&file),
            file,
            path,
        });
    }

    items
}

/// Run a migration request
pub fn run_migration(
    request: &MigrationRequest,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let started_at = Utc::now();

    request.validate()?;

    if !request.folder.is_dir() {
        let error = BatchError::DirectoryNotFound {
            path: request.folder.display().to_string(),
        };
        crate::log_error!(error.error_code(), "Table folder not found",
            "directory" => request.folder.display());
        return Err(error);
    }

    let files = match &request.files {
        Some(files) => files.clone(),
        None => discover_documents(&request.folder, config.recursive)?
            .into_iter()
            .map(|doc| doc.file)
            .collect(),
    };

    let items = plan_work(request, files);

    if items.is_empty() {
        let error = BatchError::NoFilesFound {
            path: request.folder.display().to_string(),
        };
        crate::log_error!(error.error_code(), "Nothing to migrate",
            "directory" => request.folder.display());
        return Err(error);
    }

    if items.len() > MAX_FILES_PER_BATCH {
        let error = BatchError::TooManyFiles {
            count: items.len(),
            max: MAX_FILES_PER_BATCH,
        };
        crate::log_error!(error.error_code(), "Request exceeds the per-batch file limit",
            "files" => items.len(),
            "limit" => MAX_FILES_PER_BATCH);
        return Err(error);
    }

    let target = request.connection_target();
    let threads = config.effective_threads();

    crate::log_info!("Starting batch migration",
        "directory" => request.folder.display(),
        "files" => items.len(),
        "threads" => threads,
        "target" => target.connect_expression()
    );

    let reports = if threads == 1 || items.len() == 1 {
        process_sequential(&items, &target, config)
    } else {
        process_parallel(&items, &target, config, threads)?
    };

    let mut results = BatchResults::new(request.folder.clone(), target, started_at);
    results.finish(reports, start_time.elapsed());

    crate::log_success!(
        codes::success::OPERATION_COMPLETED_SUCCESSFULLY,
        "Batch migration completed",
        "total" => results.total,
        "migrated" => results.successes,
        "skipped" => results.skipped_count(),
        "failed" => results.error_count(),
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );

    Ok(results)
}

fn process_sequential(
    items: &[WorkItem],
    target: &ConnectionTarget,
    config: &BatchConfig,
) -> Vec<FileReport> {
    let processor = FileProcessor::from_preferences(&config.file_processor);
    let completed = AtomicUsize::new(0);

    items
        .iter()
        .map(|item| {
            let report = run_item(&processor, item, target);
            report_progress(config, &completed, items.len(), &report);
            report
        })
        .collect()
}

/// Chunks of files are spread over `threads` workers; reports are put back in request order
fn process_parallel(
    items: &[WorkItem],
    target: &ConnectionTarget,
    config: &BatchConfig,
    threads: usize,
) -> Result<Vec<FileReport>, BatchError> {
    let chunk_size = calculate_chunk_size(items.len(), threads);
    let completed = Arc::new(AtomicUsize::new(0));
    let mut indexed: Vec<(usize, FileReport)> = Vec::with_capacity(items.len());

    crate::log_debug!("Parallel processing configuration",
        "total_files" => items.len(),
        "chunk_size" => chunk_size,
        "threads" => threads
    );

    for chunk in items.chunks(chunk_size) {
        indexed.extend(process_chunk_parallel(
            chunk,
            target,
            config,
            threads,
            items.len(),
            Arc::clone(&completed),
        )?);
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, report)| report).collect())
}

fn process_chunk_parallel(
    files: &[WorkItem],
    target: &ConnectionTarget,
    config: &BatchConfig,
    threads: usize,
    total: usize,
    completed: Arc<AtomicUsize>,
) -> Result<Vec<(usize, FileReport)>, BatchError> {
    let results = Arc::new(Mutex::new(Vec::with_capacity(files.len())));
    let files_per_thread = files.len().div_ceil(threads);
    let mut handles = Vec::new();

    for thread_files in files.chunks(files_per_thread) {
        let thread_files = thread_files.to_vec();
        let results = Arc::clone(&results);
        let completed = Arc::clone(&completed);
        let target = target.clone();
        let config = config.clone();

        handles.push(thread::spawn(move || {
            let processor = FileProcessor::from_preferences(&config.file_processor);
            for item in &thread_files {
                let report = run_item(&processor, item, &target);
                report_progress(&config, &completed, total, &report);
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((item.index, report));
            }
        }));
    }

    for handle in handles {
        handle.join().map_err(|_| {
            let error = BatchError::ThreadError {
                message: "Worker panicked during migration".to_string(),
            };
            crate::log_error!(error.error_code(), "Worker thread panicked");
            error
        })?;
    }

    let results = Arc::try_unwrap(results).map_err(|_| BatchError::ThreadError {
        message: "Failed to collect worker results".to_string(),
    })?;
    Ok(results.into_inner().unwrap_or_else(PoisonError::into_inner))
}

fn run_item(processor: &FileProcessor, item: &WorkItem, target: &ConnectionTarget) -> FileReport {
    pipeline::process_document(
        processor,
        &item.path,
        &item.file,
        item.index,
        target,
        &item.table,
    )
}

fn report_progress(
    config: &BatchConfig,
    completed: &AtomicUsize,
    total: usize,
    report: &FileReport,
) {
    let completed = completed.fetch_add(1, Ordering::SeqCst) + 1;

    if config.progress_reporting {
        eprintln!("[{}/{}] {}: {}", completed, total, report.file, report.status);
    }

    if let Some(callback) = &config.progress_callback {
        callback(&BatchProgress {
            completed,
            total,
            report: report.clone(),
        });
    }
}

fn calculate_chunk_size(files: usize, max_threads: usize) -> usize {
    const MIN_CHUNK_SIZE: usize = 1;
    const MAX_CHUNK_SIZE: usize = 50;

    files
        .div_ceil(max_threads.max(1))
        .clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

/// Successful, skipped and failed documents by status
pub fn status_counts(reports: &[FileReport]) -> (usize, usize, usize) {
    reports.iter().fold((0, 0, 0), |(ok, skipped, failed), r| {
        (
            ok + usize::from(r.status.is_success()),
            skipped + usize::from(r.status.is_skipped()),
            failed + usize::from(r.status.is_error()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::RewriteStatus;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    fn csv_doc(table: &str) -> String {
        format!(
            "table {t}\n\
             \tpartition {t} = m\n\
             \t\tmode: import\n\
             \t\tsource =\n\
             \t\t\t\tlet\n\
             \t\t\t\t    Source = Csv.Document(File.Contents(\"{t}.csv\"),[Delimiter=\",\"]),\n\
             \t\t\t\t    #\"Promoted Headers\" = Table.PromoteHeaders(Source, [PromoteAllScalars=true])\n\
             \t\t\t\tin\n\
             \t\t\t\t    #\"Promoted Headers\"\n\
             \n\
             \tannotation PBI_ResultType = Table\n",
            t = table
        )
    }

    const MEASURES: &str = "table Measures\n\tmeasure Total = 1\n";

    fn quiet() -> BatchConfig {
        BatchConfig::default()
            .with_threads(1)
            .with_progress_reporting(false)
    }

    #[test]
    fn test_discovery_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Sales.tmdl"), csv_doc("Sales")).unwrap();
        fs::write(dir.path().join("Measures.tmdl"), MEASURES).unwrap();
        fs::write(dir.path().join("notes.txt"), csv_doc("Notes")).unwrap();
        fs::write(dir.path().join("Orders.TMDL"), csv_doc("Orders")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/Lines.tmdl"), csv_doc("Lines")).unwrap();

        let flat = discover_documents(dir.path(), false).unwrap();
        let names: Vec<_> = flat.iter().map(|d| d.file.as_str()).collect();
        assert_eq!(names, ["Orders.TMDL", "Sales.tmdl"]);
        assert_eq!(flat[1].table, "Sales");

        let deep = discover_documents(dir.path(), true).unwrap();
        assert!(deep.iter().any(|d| d.file == "nested/Lines.tmdl" && d.table == "Lines"));
        assert_eq!(list_tmdl_files(dir.path(), true).unwrap().len(), 4);
    }

    #[test]
    fn test_missing_folder() {
        let request = MigrationRequest::new("/nonexistent/tables", "srv", "db");
        let err = run_migration(&request, &quiet()).unwrap_err();
        assert_matches!(err, BatchError::DirectoryNotFound { .. });
        assert_eq!(err.error_code(), codes::batch::DIRECTORY_NOT_FOUND);
    }

    #[test]
    fn test_invalid_request_is_rejected() {
        let dir = tempdir().unwrap();
        let request = MigrationRequest::new(dir.path(), "", "db");
        assert_matches!(
            run_migration(&request, &quiet()),
            Err(BatchError::Request(RequestError::EmptyConnectionField { .. }))
        );
    }

    #[test]
    fn test_no_eligible_documents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Measures.tmdl"), MEASURES).unwrap();

        let request = MigrationRequest::new(dir.path(), "srv", "db");
        assert_matches!(
            run_migration(&request, &quiet()),
            Err(BatchError::NoFilesFound { .. })
        );
    }

    #[test]
    fn test_mixed_run_isolates_failures() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Sales.tmdl"), csv_doc("Sales")).unwrap();
        fs::write(dir.path().join("Measures.tmdl"), MEASURES).unwrap();

        let request = MigrationRequest::new(dir.path(), "srv", "db")
            .with_files(vec![
                "Sales.tmdl".into(),
                "Ghost.tmdl".into(),
                "Measures.tmdl".into(),
                "Sales.tmdl".into(),
            ])
            .with_table("Sales.tmdl", "FactSales");

        let results = run_migration(&request, &quiet()).unwrap();

        assert_eq!(results.total, 3);
        assert_eq!(results.successes, 1);
        assert!(results.has_errors());

        let files: Vec<_> = results.reports.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, ["Sales.tmdl", "Ghost.tmdl", "Measures.tmdl"]);
        assert_eq!(results.reports[0].table.as_deref(), Some("FactSales"));
        assert_matches!(results.reports[1].status, RewriteStatus::Error(_));
        assert_eq!(results.reports[2].status, RewriteStatus::SkippedNoPartition);
        assert_eq!(status_counts(&results.reports), (1, 1, 1));

        let migrated = fs::read_to_string(dir.path().join("Sales.tmdl")).unwrap();
        assert!(migrated.contains("Item=\"FactSales\""));
    }

    #[test]
    fn test_aliased_names_are_processed_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("A.tmdl"), csv_doc("A")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let request = MigrationRequest::new(dir.path(), "srv", "db")
            .with_files(vec!["A.tmdl".into(), "sub/../A.tmdl".into(), "./A.tmdl".into()]);
        let results = run_migration(&request, &quiet().with_threads(2)).unwrap();

        assert_eq!(results.total, 1);
        assert_eq!(results.reports[0].file, "A.tmdl");
        assert_eq!(results.reports[0].status, RewriteStatus::Success);
    }

    #[test]
    fn test_parallel_run_keeps_request_order() {
        let dir = tempdir().unwrap();
        let names: Vec<String> = (0..9).map(|i| format!("T{}.tmdl", i)).collect();
        for (i, name) in names.iter().enumerate() {
            fs::write(dir.path().join(name), csv_doc(&format!("T{}", i))).unwrap();
        }
        let mut order = names.clone();
        order.reverse();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let config = quiet()
            .with_threads(4)
            .with_progress_callback(move |p| sink.lock().unwrap().push(p.completed));

        let request = MigrationRequest::new(dir.path(), "srv", "db").with_files(order.clone());
        let results = run_migration(&request, &config).unwrap();

        let files: Vec<_> = results.reports.iter().map(|r| r.file.clone()).collect();
        assert_eq!(files, order);
        assert_eq!(results.successes, 9);

        let mut counts = seen.lock().unwrap().clone();
        counts.sort_unstable();
        assert_eq!(counts, (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_second_run_skips_everything() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Sales.tmdl"), csv_doc("Sales")).unwrap();
        let request = MigrationRequest::new(dir.path(), "srv", "db");

        let first = run_migration(&request, &quiet()).unwrap();
        assert_eq!(first.successes, 1);

        let second = run_migration(&request, &quiet()).unwrap();
        assert_eq!(second.successes, 0);
        assert_eq!(second.reports[0].status, RewriteStatus::SkippedNoChange);
    }

    #[test]
    fn test_results_serialize() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Sales.tmdl"), csv_doc("Sales")).unwrap();
        let request = MigrationRequest::new(dir.path(), "srv", "db");

        let results = run_migration(&request, &quiet()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();

        assert_eq!(json["total"], 1);
        assert_eq!(json["successes"], 1);
        assert_eq!(json["target"]["server"], "srv");
        assert_eq!(json["reports"][0]["status"], "success");
        assert!(json["started_at"].is_string());
        assert!(results.summary().contains("1 of 1 documents migrated"));
    }

    #[test]
    fn test_chunk_size_calculation() {
        assert_eq!(calculate_chunk_size(100, 4), 25);
        assert_eq!(calculate_chunk_size(10, 4), 3);
        assert_eq!(calculate_chunk_size(1, 4), 1);
        assert_eq!(calculate_chunk_size(200, 4), 50);
    }

    #[test]
    fn test_thread_cap() {
        let config = quiet().with_threads(MAX_WORKER_THREADS + 10);
        assert_eq!(config.effective_threads(), MAX_WORKER_THREADS);
        assert_eq!(quiet().with_threads(0).effective_threads(), 1);
    }
}
