use crate::command::create_commands;
use crate::config::AssemblyConfig;
use crate::context::CommandExecutionContext;
use crate::designator::tools::{
    find_collisions, remove_colliding_implicit_identifiers, tag_colliding_explicit_identifiers,
};
use crate::designator::Tag;
use crate::error::NovellaError;
use crate::mangling::{level, list, metadata, tag, tag_filter};
use crate::node_kind::NodeKind;
use crate::parser::{MarkupParser, SourceParser};
use crate::problem::{Location, Problem};
use crate::tree::{tree, SyntacticTree};
use crate::treepath::Treepath;
use crate::worker::WorkerPool;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A whole document, assembled by running the commands of an Opus file.
#[derive(Debug, Clone)]
pub struct Opus {
    document_tree: SyntacticTree,
    problems: Vec<Problem>,
    stylesheets: BTreeMap<String, String>,
}

impl Opus {
    /// Reads the commands from `opus_file`. Relative file names in commands resolve against
    /// the directory of `opus_file`.
    pub fn assemble(
        opus_file: &Path,
        config: &AssemblyConfig,
        worker_pool: Arc<WorkerPool>,
    ) -> Result<Opus, NovellaError> {
        let file_name = opus_file.display().to_string();
        let source = match fs::read_to_string(opus_file) {
            Ok(source) => source,
            Err(err) => {
                let message = format!("Could not read '{file_name}': {err}");
                return Ok(Opus::failed(Problem::at(Location::of_file(&file_name), message)));
            }
        };
        let book_directory = opus_file.parent().unwrap_or_else(|| Path::new("."));
        Self::assemble_source(&source, &file_name, book_directory, config, worker_pool)
    }

    pub fn assemble_source(
        source: &str,
        file_name: &str,
        book_directory: &Path,
        config: &AssemblyConfig,
        worker_pool: Arc<WorkerPool>,
    ) -> Result<Opus, NovellaError> {
        info!("Assembling '{}'", file_name);
        let command_tree = match MarkupParser.parse_opus(source, file_name) {
            Ok(command_tree) => command_tree,
            Err(err) => return Ok(Opus::failed(Problem::from_parser_error(&err))),
        };
        let (commands, problems) = create_commands(&command_tree);

        let mut context =
            CommandExecutionContext::new(&config.base_directory, book_directory, worker_pool)
                .with_charsets(&config.source_charset, &config.rendering_charset)
                .with_novella_extensions(config.novella_extensions.clone())
                .with_document_tree(tree(NodeKind::Opus, []))
                .with_problems(problems);
        for command in &commands {
            debug!("Evaluating command at {}", command.location());
            context = command.evaluate(context)?;
        }

        let document = context
            .document_tree()
            .cloned()
            .unwrap_or_else(|| tree(NodeKind::Opus, []));
        let processed = post_process(
            &Treepath::new(document),
            &Tag::to_tag_set(&config.tags),
            !context.has_problem(),
        )?;
        info!(
            "Assembled '{}' with {} problem(s)",
            file_name,
            context.problems().len()
        );
        Ok(Opus {
            document_tree: processed.tree_at_start().clone(),
            problems: context.problems().to_vec(),
            stylesheets: context.stylesheets().clone(),
        })
    }

    fn failed(problem: Problem) -> Opus {
        warn!("{}", problem);
        Opus {
            document_tree: tree(NodeKind::Opus, []),
            problems: vec![problem],
            stylesheets: BTreeMap::new(),
        }
    }

    pub fn document_tree(&self) -> &SyntacticTree {
        &self.document_tree
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_problem(&self) -> bool {
        !self.problems.is_empty()
    }

    /// MIME names to stylesheet resource names.
    pub fn stylesheets(&self) -> &BTreeMap<String, String> {
        &self.stylesheets
    }
}

/// Passes run once every Novella is in.
fn post_process(
    document: &Treepath,
    restricting_tags: &BTreeSet<Tag>,
    with_metadata: bool,
) -> Result<Treepath, NovellaError> {
    let collisions = find_collisions(document);
    let document = if collisions.is_empty() {
        document.clone()
    } else {
        debug!("Identifier collisions: {:?}", collisions);
        let document = remove_colliding_implicit_identifiers(&collisions, document)?;
        tag_colliding_explicit_identifiers(&collisions, &document)?
    };

    let explicit_tags = tag::find_explicit_tags(document.tree_at_start());
    let document = list::rehierarchize_lists(&document.start());
    let document = level::rehierarchize_levels(&document)?;
    let document = tag_filter::filter(&document, restricting_tags);
    let document = tag::promote(&document, &explicit_tags.iter().cloned().collect());
    Ok(if with_metadata {
        metadata::add_metadata(&document, &explicit_tags)
    } else {
        document
    })
}
