use crate::config::AssemblyConfig;
use crate::designator::Tag;
use crate::error::NovellaError;
use crate::node_kind::NodeKind;
use crate::novella::Novella;
use crate::opus::Opus;
use crate::problem::Problem;
use crate::serialization::{to_value, Value};
use crate::tree::{tree, SyntacticTree};
use crate::worker::WorkerPool;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// The outcome of an assembly: the final document, what went wrong on the way, and the
/// stylesheets the document asked for.
///
/// Problems do not prevent a result. A document assembled with problems is as complete as
/// the failures allowed, and carries no `_META` node.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyResult {
    pub document: SyntacticTree,
    pub problems: Vec<Problem>,
    pub stylesheets: BTreeMap<String, String>,
}

impl AssemblyResult {
    pub fn has_problem(&self) -> bool {
        !self.problems.is_empty()
    }

    /// The document as plain data.
    #[must_use]
    pub fn to_value(&self) -> Value {
        to_value(&self.document)
    }

    /// Serializes the whole result into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the whole result into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Assembles the Opus file at `opus_path`.
///
/// This is the primary entry point. Commands of the Opus insert Novella files, found
/// relative to the directory of the Opus file; resources must resolve under the base
/// directory of `config`.
///
/// # Errors
///
/// Returns a `NovellaError` when the worker pool cannot start, or when a document breaks an
/// invariant of the tree rewriting. Anything else ends up in [`AssemblyResult::problems`].
pub fn assemble(opus_path: &Path, config: &AssemblyConfig) -> Result<AssemblyResult, NovellaError> {
    let worker_pool = Arc::new(WorkerPool::new(config.worker_count)?);
    let opus = Opus::assemble(opus_path, config, worker_pool)?;
    Ok(AssemblyResult {
        document: opus.document_tree().clone(),
        problems: opus.problems().to_vec(),
        stylesheets: opus.stylesheets().clone(),
    })
}

/// Renders a single Novella file as a document of its own, filtered on the tags of `config`.
///
/// # Errors
///
/// Returns a `NovellaError` when the document breaks an invariant of the tree rewriting.
pub fn assemble_novella(
    novella_path: &Path,
    config: &AssemblyConfig,
) -> Result<AssemblyResult, NovellaError> {
    let novella = Novella::load(novella_path, &config.source_charset)?
        .relocate_resource_paths(&config.base_directory)
        .make_standalone(&Tag::to_tag_set(&config.tags));
    let document = novella
        .document_tree()
        .cloned()
        .unwrap_or_else(|| tree(NodeKind::Novella, []));
    Ok(AssemblyResult {
        document,
        problems: novella.problems().to_vec(),
        stylesheets: BTreeMap::new(),
    })
}
