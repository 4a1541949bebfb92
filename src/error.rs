use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum NovellaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mangling(#[from] ManglingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Command(#[from] CommandParameterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Criteria(#[from] CriteriaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Designator(#[from] DesignatorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug, Diagnostic, Clone)]
#[error("Parser Error")]
pub enum ParserError {
    #[error("Unexpected token")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The reader found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unclosed double quotes")]
    #[diagnostic(
        code(parser::unclosed_quotes),
        help("A block opened with '\"' must be closed on the same paragraph.")
    )]
    UnclosedQuotes {
        #[source_code]
        src: NamedSource<String>,
        #[label("Block starts here")]
        span: SourceSpan,
    },

    #[error("Unbalanced angled brackets")]
    #[diagnostic(
        code(parser::unbalanced_angled_brackets),
        help("Every '<<<' line needs a matching '>>>' line.")
    )]
    UnbalancedAngledBrackets {
        #[source_code]
        src: NamedSource<String>,
        #[label("This delimiter has no counterpart")]
        span: SourceSpan,
    },

    #[error("Unknown command '{name}'")]
    #[diagnostic(
        code(parser::unknown_command),
        help("Supported commands are 'insert' and 'mapstylesheet'.")
    )]
    UnknownCommand {
        #[source_code]
        src: NamedSource<String>,
        #[label("Unknown command")]
        span: SourceSpan,
        name: String,
    },

    #[error("Invalid command option '{option}'")]
    #[diagnostic(
        code(parser::invalid_option),
        help("Check the option name and its '=' value.")
    )]
    InvalidOption {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not a valid option here")]
        span: SourceSpan,
        option: String,
    },
}

impl ParserError {
    /// Returns the named source and the offset where the error was detected.
    pub fn source_and_offset(&self) -> (&NamedSource<String>, usize) {
        match self {
            ParserError::UnexpectedToken { src, span, .. }
            | ParserError::UnclosedQuotes { src, span }
            | ParserError::UnbalancedAngledBrackets { src, span }
            | ParserError::UnknownCommand { src, span, .. }
            | ParserError::InvalidOption { src, span, .. } => (src, span.offset()),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Index {index} out of bounds, tree has {child_count} children")]
    #[diagnostic(code(tree::index_out_of_bounds))]
    IndexOutOfBounds { index: usize, child_count: usize },

    #[error("Treepath must have minimum length of {minimum}, got {actual}")]
    #[diagnostic(code(tree::too_short))]
    TooShort { minimum: usize, actual: usize },

    #[error("No next sibling")]
    #[diagnostic(code(tree::no_next_sibling))]
    NoNextSibling,

    #[error("Removed subtree contains the target")]
    #[diagnostic(
        code(tree::removing_ancestor),
        help("Removing an ancestor of a treepath leaves nothing to point to.")
    )]
    RemovingAncestor,

    #[error("Treepaths do not share the same root")]
    #[diagnostic(code(tree::different_roots))]
    DifferentRoots,
}

/// Contract violations between pipeline stages. These abort the assembly, unless they come
/// from one of the files of a directory insert.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ManglingError {
    #[error("Inconsistent indentation: {indentation} after sub-list, expecting {expected}")]
    #[diagnostic(
        code(mangling::inconsistent_indentation),
        help("Items of an embedded list must line up with an enclosing list's items.")
    )]
    InconsistentIndentation { indentation: usize, expected: usize },

    #[error("Incorrect depth [{depth}] for level declaration (minimum is {roof})")]
    #[diagnostic(code(mangling::incorrect_level_depth))]
    IncorrectLevelDepth { depth: usize, roof: usize },

    #[error("Malformed {kind}: {reason}")]
    #[diagnostic(code(mangling::malformed_node))]
    MalformedNode { kind: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum CommandParameterError {
    #[error("Found no child tree while seeking level {level}")]
    #[diagnostic(
        code(command::no_child_tree),
        help("'levelabove' is deeper than the levels inserted so far.")
    )]
    NoChildTree { level: usize },

    #[error("Found no LEVEL as child tree")]
    #[diagnostic(
        code(command::no_level),
        help("The last inserted node must be a level to insert beneath it.")
    )]
    NoLevel,

    #[error("Not a directory: '{}'", .path.display())]
    #[diagnostic(code(command::not_a_directory))]
    NotADirectory { path: PathBuf },

    #[error("Could not scan '{}': {message}", .path.display())]
    #[diagnostic(code(command::could_not_scan))]
    CouldNotScan { path: PathBuf, message: String },

    #[error("Could not sort files: {0}")]
    #[diagnostic(code(command::could_not_sort))]
    CouldNotSortFiles(#[source] CriteriaError),

    #[error("Unknown ordering: '{name}'")]
    #[diagnostic(code(command::unknown_ordering), help("Use 'path' or 'version'."))]
    UnknownOrdering { name: String },

    #[error("Missing sort order at the end of '{ordering}', must be '+' or '-'")]
    #[diagnostic(code(command::missing_sort_order))]
    MissingSortOrder { ordering: String },

    #[error("Invalid level above: '{value}'")]
    #[diagnostic(code(command::invalid_level_above), help("Must be 0 or greater."))]
    InvalidLevelAbove { value: String },

    #[error("Found no URL in {command}")]
    #[diagnostic(code(command::missing_url))]
    MissingUrl { command: String },

    #[error("Unsupported: {kind}")]
    #[diagnostic(code(command::unsupported))]
    Unsupported { kind: String },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{message}: '{}'", .path.display())]
#[diagnostic(code(ordering::criterion))]
pub struct CriterionCreationError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("Could not create file sort criteria for: {}", render_failures(.failures))]
#[diagnostic(
    code(ordering::criteria),
    help("Every file must provide a sort key for the chosen ordering.")
)]
pub struct CriteriaError {
    #[related]
    pub failures: Vec<CriterionCreationError>,
}

fn render_failures(failures: &[CriterionCreationError]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  {failure}"))
        .collect()
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum DesignatorError {
    #[error("Fragment identifier needs at least one segment")]
    #[diagnostic(code(designator::no_segment))]
    NoSegment,

    #[error("Blank segment in fragment identifier")]
    #[diagnostic(code(designator::blank_segment))]
    BlankSegment,

    #[error("Tag name must not be blank")]
    #[diagnostic(code(designator::blank_tag))]
    BlankTag,
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("Cannot parse version: '{text}'")]
#[diagnostic(code(ordering::version), help("Expected 'major.minor.fix' or 'SNAPSHOT'."))]
pub struct VersionError {
    pub text: String,
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ConfigError {
    #[error("Could not read '{}': {message}", .path.display())]
    #[diagnostic(code(config::io))]
    Io { path: PathBuf, message: String },

    #[error("Malformed configuration '{}': {message}", .path.display())]
    #[diagnostic(code(config::malformed))]
    Malformed { path: PathBuf, message: String },

    #[error("Unsupported configuration format: '{}'", .path.display())]
    #[diagnostic(code(config::format), help("Use a .yaml, .yml or .json file."))]
    UnsupportedFormat { path: PathBuf },

    #[error("Could not create worker pool: {message}")]
    #[diagnostic(code(config::worker_pool))]
    WorkerPool { message: String },
}
