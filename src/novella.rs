use crate::designator::{DesignatorInterpreter, Tag};
use crate::error::ManglingError;
use crate::mangling::{self, list, metadata, tag, tag_filter};
use crate::parser::{MarkupParser, SourceParser};
use crate::problem::{Location, Problem};
use crate::resource::ResourceRelocator;
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

const SUPPORTED_CHARSETS: [&str; 2] = ["UTF-8", "UTF8"];

/// One source file, read and mangled.
///
/// Reading failures do not fail the loading: they leave the Novella without a tree, with
/// problems telling why.
#[derive(Debug, Clone)]
pub struct Novella {
    file: PathBuf,
    directory: Option<PathBuf>,
    tree: Option<SyntacticTree>,
    problems: Vec<Problem>,
}

impl Novella {
    /// Reads the file with the built-in reader.
    pub fn load(path: &Path, source_charset: &str) -> Result<Novella, ManglingError> {
        Self::load_with(path, source_charset, &MarkupParser)
    }

    pub fn load_with(
        path: &Path,
        source_charset: &str,
        parser: &dyn SourceParser,
    ) -> Result<Novella, ManglingError> {
        let file = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let file_name = file.display().to_string();
        let directory = file.parent().map(Path::to_path_buf);
        debug!("Loading novella '{}'", file_name);

        if !SUPPORTED_CHARSETS
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(source_charset))
        {
            return Ok(Novella::failed(
                file,
                Problem::at(
                    Location::of_file(file_name),
                    format!("Unsupported charset: '{source_charset}'"),
                ),
            ));
        }

        let source = match fs::read_to_string(&file) {
            Ok(source) => source,
            Err(err) => {
                let problem = Problem::at(
                    Location::of_file(&file_name),
                    format!("Could not read '{file_name}': {err}"),
                );
                return Ok(Novella::failed(file, problem));
            }
        };
        let mut novella = Self::parse_with(&source, &file_name, parser)?;
        novella.file = file;
        novella.directory = directory;
        Ok(novella)
    }

    /// Reads some source that comes from no file. Resources of such a Novella are not relocated.
    pub fn from_source(source: &str, file_name: &str) -> Result<Novella, ManglingError> {
        Self::parse_with(source, file_name, &MarkupParser)
    }

    fn parse_with(
        source: &str,
        file_name: &str,
        parser: &dyn SourceParser,
    ) -> Result<Novella, ManglingError> {
        let raw = match parser.parse(source, file_name) {
            Ok(raw) => raw,
            Err(err) => {
                return Ok(Novella::failed(
                    PathBuf::from(file_name),
                    Problem::from_parser_error(&err),
                ))
            }
        };
        let mangled = mangling::mangle_novella(&Treepath::new(raw))?;
        Ok(Novella {
            file: PathBuf::from(file_name),
            directory: None,
            tree: Some(mangled.tree_at_start().clone()),
            problems: Vec::new(),
        })
    }

    fn failed(file: PathBuf, problem: Problem) -> Novella {
        warn!("{}", problem);
        Novella {
            file,
            directory: None,
            tree: None,
            problems: vec![problem],
        }
    }

    /// The mangled tree, or `None` when reading failed.
    pub fn document_tree(&self) -> Option<&SyntacticTree> {
        self.tree.as_ref()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_problem(&self) -> bool {
        !self.problems.is_empty()
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Makes image locations relative to `base_directory`. Failures become problems of the
    /// returned Novella.
    pub fn relocate_resource_paths(&self, base_directory: &Path) -> Novella {
        let (Some(tree), Some(directory)) = (&self.tree, &self.directory) else {
            warn!("Resource paths of '{}' not relocated", self.file.display());
            return self.clone();
        };
        let relocator =
            ResourceRelocator::new(base_directory, directory, &self.file.display().to_string());
        let (relocated, relocation_problems) = relocator.relocate(tree);
        let mut problems = self.problems.clone();
        problems.extend(relocation_problems);
        Novella {
            tree: Some(relocated),
            problems,
            ..self.clone()
        }
    }

    /// Gives the Novella the shape of a whole document, as if it were an Opus of its own.
    pub fn make_standalone(&self, restricting_tags: &BTreeSet<Tag>) -> Novella {
        let Some(tree) = &self.tree else {
            return self.clone();
        };
        let listed = list::rehierarchize_lists(&Treepath::new(tree.clone()));
        let interpreter = DesignatorInterpreter::new(&listed);
        let explicit_tags = tag::find_explicit_tags(tree);
        let filtered = tag_filter::filter(interpreter.enriched_treepath(), restricting_tags);
        let promoted = tag::promote(&filtered, &explicit_tags.iter().cloned().collect());
        let with_metadata = metadata::add_metadata(&promoted, &explicit_tags);

        let mut problems = self.problems.clone();
        problems.extend(interpreter.problems().iter().cloned());
        Novella {
            tree: Some(with_metadata.tree_at_start().clone()),
            problems,
            ..self.clone()
        }
    }
}

impl Display for Novella {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file.display())
    }
}
