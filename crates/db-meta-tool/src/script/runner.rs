//! Transactional script runner.
//!
//! Applies a directory of script files to a [`ScriptTarget`]. Files run in
//! ascending path order, each inside its own transaction. A failing file is
//! rolled back; files committed before it stay committed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::splitter::StatementSplitter;
use crate::config::ScriptsConfig;
use crate::core::traits::ScriptTarget;
use crate::error::{MetaError, Result};

/// A script file read during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    pub path: PathBuf,
    pub file_name: String,
    pub text: String,
}

/// Statements applied from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_name: String,
    pub statements: usize,
}

/// Result of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files: Vec<FileSummary>,
    pub total_statements: usize,
}

impl RunSummary {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Discovers, validates, and applies script files.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    splitter: StatementSplitter,
    extension: String,
}

impl ScriptRunner {
    pub fn new(config: &ScriptsConfig) -> Self {
        Self {
            splitter: StatementSplitter::from_config(config),
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }

    /// Find and read every script file in `dir`, sorted by path.
    ///
    /// Fails before returning anything if the directory is missing, holds no
    /// matching files, or any matching file is empty.
    pub async fn discover(&self, dir: &Path) -> Result<Vec<ScriptFile>> {
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(MetaError::NotFound(dir.to_path_buf())),
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| MetaError::io(dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MetaError::io(dir, e))?
        {
            let path = entry.path();
            let is_file = entry
                .file_type()
                .await
                .map_err(|e| MetaError::io(&path, e))?
                .is_file();
            if is_file && self.matches_extension(&path) {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(MetaError::NoInputFiles {
                dir: dir.to_path_buf(),
                extension: self.extension.clone(),
            });
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| MetaError::io(&path, e))?;
            if text.is_empty() {
                return Err(MetaError::EmptyFile(path));
            }
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            files.push(ScriptFile {
                path,
                file_name,
                text,
            });
        }

        debug!("Discovered {} script files in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Discover and apply every script in `dir`.
    pub async fn run<T: ScriptTarget>(&self, target: &mut T, dir: &Path) -> Result<RunSummary> {
        let files = self.discover(dir).await?;
        self.run_files(target, &files).await
    }

    /// Apply already-discovered files in order, stopping at the first failure.
    pub async fn run_files<T: ScriptTarget>(
        &self,
        target: &mut T,
        files: &[ScriptFile],
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for file in files {
            info!("Executing script: {}", file.file_name);
            let statements = self.apply_file(target, file).await?;
            info!("{}: committed ({} statements)", file.file_name, statements);

            summary.total_statements += statements;
            summary.files.push(FileSummary {
                file_name: file.file_name.clone(),
                statements,
            });
        }

        Ok(summary)
    }

    async fn apply_file<T: ScriptTarget>(&self, target: &mut T, file: &ScriptFile) -> Result<usize> {
        let statements = self.splitter.split(&file.text);

        target
            .begin_transaction()
            .await
            .map_err(|e| MetaError::script(&file.file_name, message(e)))?;

        for (idx, sql) in statements.iter().enumerate() {
            debug!("{}: statement {}/{}", file.file_name, idx + 1, statements.len());
            if let Err(e) = target.execute(sql).await {
                error!("{}: statement {} failed, rolling back", file.file_name, idx + 1);
                rollback(target, &file.file_name).await;
                return Err(MetaError::script(&file.file_name, message(e)));
            }
        }

        if let Err(e) = target.commit().await {
            rollback(target, &file.file_name).await;
            return Err(MetaError::script(&file.file_name, message(e)));
        }

        Ok(statements.len())
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

async fn rollback<T: ScriptTarget>(target: &mut T, file_name: &str) {
    if let Err(e) = target.rollback().await {
        warn!("{}: rollback failed: {}", file_name, e);
    }
}

/// Driver message without the outer variant prefix.
fn message(err: MetaError) -> String {
    match err {
        MetaError::Database(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::fs;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Begin,
        Execute(String),
        Commit,
        Rollback,
    }

    /// Records calls and keeps committed statements, failing on a marker.
    #[derive(Default)]
    struct RecordingTarget {
        events: Vec<Event>,
        pending: Vec<String>,
        committed: Vec<String>,
        fail_marker: Option<&'static str>,
    }

    #[async_trait(?Send)]
    impl ScriptTarget for RecordingTarget {
        async fn begin_transaction(&mut self) -> Result<()> {
            self.events.push(Event::Begin);
            Ok(())
        }

        async fn execute(&mut self, sql: &str) -> Result<()> {
            self.events.push(Event::Execute(sql.to_string()));
            if self.fail_marker.is_some_and(|m| sql.contains(m)) {
                return Err(MetaError::Database("Table unknown NOPE".to_string()));
            }
            self.pending.push(sql.to_string());
            Ok(())
        }

        async fn commit(&mut self) -> Result<()> {
            self.events.push(Event::Commit);
            self.committed.append(&mut self.pending);
            Ok(())
        }

        async fn rollback(&mut self) -> Result<()> {
            self.events.push(Event::Rollback);
            self.pending.clear();
            Ok(())
        }
    }

    fn runner() -> ScriptRunner {
        ScriptRunner::new(&ScriptsConfig::default())
    }

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[tokio::test]
    async fn test_failing_file_rolls_back_and_earlier_files_persist() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "B.sql", "CREATE TABLE B1 (ID INTEGER)\n;\nINSERT INTO NOPE VALUES (1)\n;\nCREATE TABLE B2 (ID INTEGER)\n;\n");
        write(dir.path(), "A.sql", "CREATE TABLE A (ID INTEGER)\n;\n");

        let mut target = RecordingTarget {
            fail_marker: Some("NOPE"),
            ..Default::default()
        };
        let err = runner().run(&mut target, dir.path()).await.unwrap_err();

        match err {
            MetaError::ScriptExecutionFailed { file, message } => {
                assert_eq!(file, "B.sql");
                assert_eq!(message, "Table unknown NOPE");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(target.committed, ["CREATE TABLE A (ID INTEGER)"]);
        assert_eq!(
            target.events,
            [
                Event::Begin,
                Event::Execute("CREATE TABLE A (ID INTEGER)".to_string()),
                Event::Commit,
                Event::Begin,
                Event::Execute("CREATE TABLE B1 (ID INTEGER)".to_string()),
                Event::Execute("INSERT INTO NOPE VALUES (1)".to_string()),
                Event::Rollback,
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_file_blocks_entire_run() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "01_domains.sql", "CREATE DOMAIN D AS INTEGER\n;\n");
        write(dir.path(), "02_empty.sql", "");
        write(dir.path(), "03_tables.sql", "CREATE TABLE T (ID D)\n;\n");

        let mut target = RecordingTarget::default();
        let err = runner().run(&mut target, dir.path()).await.unwrap_err();

        assert!(matches!(err, MetaError::EmptyFile(ref p) if p.ends_with("02_empty.sql")));
        assert!(target.events.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = runner().discover(&missing).await.unwrap_err();
        assert!(matches!(err, MetaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_path_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.sql", "SELECT 1 FROM RDB$DATABASE\n;\n");
        let err = runner().discover(&dir.path().join("a.sql")).await.unwrap_err();
        assert!(matches!(err, MetaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_no_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "not a script");
        let err = runner().discover(dir.path()).await.unwrap_err();
        assert!(matches!(err, MetaError::NoInputFiles { .. }));
    }

    #[tokio::test]
    async fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "10_b.sql", "SELECT 1 FROM RDB$DATABASE\n;\n");
        write(dir.path(), "02_a.SQL", "SELECT 2 FROM RDB$DATABASE\n;\n");
        write(dir.path(), "readme.md", "docs");
        fs::create_dir(dir.path().join("nested.sql")).unwrap();

        let files = runner().discover(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["02_a.SQL", "10_b.sql"]);
    }

    #[tokio::test]
    async fn test_run_summary_counts_statements() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1.sql", "CREATE TABLE A (ID INTEGER)\n;\nCREATE TABLE B (ID INTEGER)\n;\n");
        write(dir.path(), "2.sql", "/* header only */\n");

        let mut target = RecordingTarget::default();
        let summary = runner().run(&mut target, dir.path()).await.unwrap();

        assert_eq!(summary.total_statements, 2);
        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.files[1].statements, 0);
        assert_eq!(target.committed.len(), 2);
        assert!(summary.to_json().unwrap().contains("\"total_statements\": 2"));
    }
}
