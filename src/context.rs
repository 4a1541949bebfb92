use crate::problem::Problem;
use crate::tree::SyntacticTree;
use crate::worker::WorkerPool;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command sees and may change. Commands return a new context instead of
/// changing the one they get.
#[derive(Debug, Clone)]
pub struct CommandExecutionContext {
    base_directory: PathBuf,
    book_directory: PathBuf,
    source_charset: String,
    rendering_charset: String,
    stylesheets: BTreeMap<String, String>,
    document_tree: Option<SyntacticTree>,
    problems: Vec<Problem>,
    worker_pool: Arc<WorkerPool>,
    novella_extensions: Vec<String>,
}

impl CommandExecutionContext {
    pub fn new(
        base_directory: impl Into<PathBuf>,
        book_directory: impl Into<PathBuf>,
        worker_pool: Arc<WorkerPool>,
    ) -> Self {
        CommandExecutionContext {
            base_directory: base_directory.into(),
            book_directory: book_directory.into(),
            source_charset: crate::config::DEFAULT_CHARSET.to_string(),
            rendering_charset: crate::config::DEFAULT_CHARSET.to_string(),
            stylesheets: BTreeMap::new(),
            document_tree: None,
            problems: Vec::new(),
            worker_pool,
            novella_extensions: vec!["novella".to_string(), "nlp".to_string()],
        }
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn book_directory(&self) -> &Path {
        &self.book_directory
    }

    pub fn source_charset(&self) -> &str {
        &self.source_charset
    }

    pub fn rendering_charset(&self) -> &str {
        &self.rendering_charset
    }

    pub fn stylesheets(&self) -> &BTreeMap<String, String> {
        &self.stylesheets
    }

    pub fn document_tree(&self) -> Option<&SyntacticTree> {
        self.document_tree.as_ref()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_problem(&self) -> bool {
        !self.problems.is_empty()
    }

    pub fn worker_pool(&self) -> &Arc<WorkerPool> {
        &self.worker_pool
    }

    pub fn novella_extensions(&self) -> &[String] {
        &self.novella_extensions
    }

    pub fn with_charsets(self, source: impl Into<String>, rendering: impl Into<String>) -> Self {
        CommandExecutionContext {
            source_charset: source.into(),
            rendering_charset: rendering.into(),
            ..self
        }
    }

    pub fn with_stylesheets(self, stylesheets: BTreeMap<String, String>) -> Self {
        CommandExecutionContext {
            stylesheets,
            ..self
        }
    }

    pub fn with_document_tree(self, document_tree: SyntacticTree) -> Self {
        CommandExecutionContext {
            document_tree: Some(document_tree),
            ..self
        }
    }

    pub fn with_novella_extensions(self, novella_extensions: Vec<String>) -> Self {
        CommandExecutionContext {
            novella_extensions,
            ..self
        }
    }

    pub fn with_problems(mut self, problems: impl IntoIterator<Item = Problem>) -> Self {
        self.problems.extend(problems);
        self
    }

    pub fn with_problem(self, problem: Problem) -> Self {
        self.with_problems([problem])
    }
}
