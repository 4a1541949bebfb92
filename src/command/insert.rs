use super::{Command, LevelHead};
use crate::context::CommandExecutionContext;
use crate::designator::{DesignatorInterpreter, FragmentIdentifier};
use crate::error::{CommandParameterError, ManglingError, NovellaError};
use crate::node_kind::NodeKind;
use crate::novella::Novella;
use crate::ordering::FileOrdering;
use crate::problem::{Location, Problem};
use crate::scanner;
use crate::tree::{leaf, tree, SyntacticTree};
use crate::treepath::Treepath;
use crate::utils::file_stem;
use crate::worker::Pending;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Children of a level that only describe it. They go away with `nohead`.
const LEVEL_DECORATIONS: [NodeKind; 7] = [
    NodeKind::LevelTitle,
    NodeKind::ImplicitTag,
    NodeKind::ExplicitTag,
    NodeKind::PromotedTag,
    NodeKind::ImplicitIdentifier,
    NodeKind::ExplicitIdentifier,
    NodeKind::Style,
];

/// Inserts one Novella, or every Novella of a directory, into the document.
///
/// Content goes beneath the last level found `level_above` levels down the document, as its
/// last children. With fragment identifiers, only the designated parts are inserted.
#[derive(Debug, Clone)]
pub struct InsertCommand {
    location: Location,
    file_name: String,
    recurse: bool,
    file_ordering: FileOrdering,
    level_head: Option<LevelHead>,
    level_above: usize,
    style: Option<String>,
    fragment_identifiers: Vec<FragmentIdentifier>,
}

/// Trees designated by fragment identifiers, with what went wrong finding them.
#[derive(Debug, Default)]
struct Selection {
    trees: Vec<SyntacticTree>,
    problems: Vec<Problem>,
}

/// Outcome of a load task running on the worker pool.
struct Loaded {
    novella: Novella,
    interpreter: Option<DesignatorInterpreter>,
}

impl Loaded {
    fn read(file: &Path, source_charset: &str, base_directory: &Path) -> Result<Self, ManglingError> {
        let novella = Novella::load(file, source_charset)?.relocate_resource_paths(base_directory);
        let interpreter = novella
            .document_tree()
            .map(|tree| DesignatorInterpreter::new(&Treepath::new(tree.clone())));
        Ok(Loaded {
            novella,
            interpreter,
        })
    }
}

impl InsertCommand {
    /// `file_name` may start with `file:`. Relative names resolve against the book directory.
    pub fn new(location: Location, file_name: &str) -> Self {
        InsertCommand {
            location,
            file_name: file_name.strip_prefix("file:").unwrap_or(file_name).to_string(),
            recurse: false,
            file_ordering: FileOrdering::default(),
            level_head: None,
            level_above: 0,
            style: None,
            fragment_identifiers: Vec::new(),
        }
    }

    pub fn with_recurse(self, recurse: bool) -> Self {
        InsertCommand { recurse, ..self }
    }

    pub fn with_file_ordering(self, file_ordering: FileOrdering) -> Self {
        InsertCommand {
            file_ordering,
            ..self
        }
    }

    pub fn with_level_head(self, level_head: Option<LevelHead>) -> Self {
        InsertCommand { level_head, ..self }
    }

    pub fn with_level_above(self, level_above: usize) -> Self {
        InsertCommand {
            level_above,
            ..self
        }
    }

    pub fn with_style(self, style: impl Into<String>) -> Self {
        InsertCommand {
            style: Some(style.into()),
            ..self
        }
    }

    pub fn with_fragment_identifiers(self, fragment_identifiers: Vec<FragmentIdentifier>) -> Self {
        InsertCommand {
            fragment_identifiers,
            ..self
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn recurse(&self) -> bool {
        self.recurse
    }

    pub fn file_ordering(&self) -> &FileOrdering {
        &self.file_ordering
    }

    pub fn level_head(&self) -> Option<LevelHead> {
        self.level_head
    }

    pub fn level_above(&self) -> usize {
        self.level_above
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn fragment_identifiers(&self) -> &[FragmentIdentifier] {
        &self.fragment_identifiers
    }

    fn resolve_target(&self, book_directory: &Path) -> PathBuf {
        let target = PathBuf::from(&self.file_name);
        if target.is_absolute() {
            target
        } else {
            book_directory.join(target)
        }
    }

    fn insert_file(
        &self,
        context: &CommandExecutionContext,
        file: &Path,
        book: &mut Treepath,
        problems: &mut Vec<Problem>,
    ) -> Result<(), NovellaError> {
        *book = find_last_level(book, self.level_above)?;
        let novella = Novella::load(file, context.source_charset())?
            .relocate_resource_paths(context.base_directory());
        let Some(novella_tree) = novella.document_tree() else {
            problems.extend(novella.problems().iter().cloned());
            return Ok(());
        };

        let interpreter = DesignatorInterpreter::new(&Treepath::new(novella_tree.clone()));
        let content = if self.fragment_identifiers.is_empty() {
            whole_content(&interpreter)
        } else {
            let selection = self.select(&interpreter);
            if !selection.problems.is_empty() {
                problems.extend(selection.problems);
                return Ok(());
            }
            selection.trees
        };
        self.insert_content(book, file, self.remove_head_if_needed(content))?;
        problems.extend(novella.problems().iter().cloned());
        Ok(())
    }

    fn insert_directory(
        &self,
        context: &CommandExecutionContext,
        directory: &Path,
        book: &mut Treepath,
        problems: &mut Vec<Problem>,
    ) -> Result<(), NovellaError> {
        *book = find_last_level(book, self.level_above)?;
        let files = self.list_files(context, directory)?;
        info!(
            "Inserting {} file(s) from '{}'",
            files.len(),
            directory.display()
        );

        let pending: Vec<Pending<Result<Loaded, ManglingError>>> = files
            .iter()
            .map(|file| {
                let file = file.clone();
                let source_charset = context.source_charset().to_string();
                let base_directory = context.base_directory().to_path_buf();
                context
                    .worker_pool()
                    .submit(move || Loaded::read(&file, &source_charset, &base_directory))
            })
            .collect();

        let mut hits: HashMap<&FragmentIdentifier, Vec<&Path>> = HashMap::new();
        let mut selections = Vec::new();
        for (file, pending) in files.iter().zip(pending) {
            let loaded = match pending.wait() {
                Ok(Ok(loaded)) => loaded,
                Ok(Err(error)) => {
                    problems.push(Problem::at(
                        self.location.clone(),
                        format!("Could not load '{}': {}", file.display(), error),
                    ));
                    continue;
                }
                Err(failure) => {
                    problems.push(Problem::at(
                        self.location.clone(),
                        format!("Could not load '{}': {}", file.display(), failure),
                    ));
                    continue;
                }
            };
            problems.extend(loaded.novella.problems().iter().cloned());
            let Some(interpreter) = loaded.interpreter else {
                continue;
            };
            // A file with designator problems contributes no content. With `createlevel` it still gets
            // its level.
            let usable = !interpreter.has_problem();
            if !usable {
                problems.extend(interpreter.problems().iter().cloned());
            }

            if self.fragment_identifiers.is_empty() {
                let content = if usable {
                    self.remove_head_if_needed(whole_content(&interpreter))
                } else {
                    Vec::new()
                };
                self.insert_content(book, file, content)?;
            } else {
                let mut found = Vec::new();
                if usable {
                    for identifier in &self.fragment_identifiers {
                        if let Some(treepath) = interpreter.get(identifier) {
                            hits.entry(identifier).or_default().push(file);
                            found.push((identifier, treepath.tree_at_end().clone()));
                        }
                    }
                }
                selections.push((file, found));
            }
        }

        for identifier in &self.fragment_identifiers {
            match hits.get(identifier).map(Vec::as_slice) {
                None | Some([]) => problems.push(Problem::at(
                    self.location.clone(),
                    format!("Could not find {identifier} in any given Novella"),
                )),
                Some([_]) => {}
                Some(files) => {
                    let listing: String = files
                        .iter()
                        .map(|file| format!("\n{}", file.display()))
                        .collect();
                    problems.push(Problem::at(
                        self.location.clone(),
                        format!("Identifier {identifier} found multiple times in:{listing}"),
                    ));
                }
            }
        }

        for (file, found) in selections {
            let content: Vec<SyntacticTree> = found
                .into_iter()
                .filter(|(identifier, _)| hits.get(identifier).is_some_and(|files| files.len() == 1))
                .map(|(_, tree)| tree)
                .collect();
            if !content.is_empty() || self.level_head == Some(LevelHead::CreateLevel) {
                self.insert_content(book, file, self.remove_head_if_needed(content))?;
            }
        }
        Ok(())
    }

    fn list_files(
        &self,
        context: &CommandExecutionContext,
        directory: &Path,
    ) -> Result<Vec<PathBuf>, CommandParameterError> {
        if !directory.is_dir() {
            return Err(CommandParameterError::NotADirectory {
                path: directory.to_path_buf(),
            });
        }
        let scanned = scanner::scan(directory, context.novella_extensions(), self.recurse)
            .map_err(|err| CommandParameterError::CouldNotScan {
                path: directory.to_path_buf(),
                message: err.to_string(),
            })?;
        let sorted = self
            .file_ordering
            .sort(&scanned)
            .map_err(CommandParameterError::CouldNotSortFiles)?;
        debug!("Files to insert, in order: {:?}", sorted);
        Ok(sorted)
    }

    fn select(&self, interpreter: &DesignatorInterpreter) -> Selection {
        let mut selection = Selection::default();
        for identifier in &self.fragment_identifiers {
            match interpreter.get(identifier) {
                Some(treepath) => selection.trees.push(treepath.tree_at_end().clone()),
                None => selection.problems.push(Problem::at(
                    self.location.clone(),
                    format!("Cannot find: '{identifier}'"),
                )),
            }
        }
        selection
            .problems
            .extend(interpreter.problems().iter().cloned());
        selection
    }

    /// With `nohead`, a lone level standing without any paragraph gives its content
    /// instead of itself.
    fn remove_head_if_needed(&self, trees: Vec<SyntacticTree>) -> Vec<SyntacticTree> {
        if self.level_head != Some(LevelHead::NoHead) {
            return trees;
        }
        if trees.iter().any(|tree| tree.kind().is_paragraphoid()) {
            return trees;
        }
        let mut levels = trees.iter().filter(|tree| tree.is(NodeKind::Level));
        if let (Some(level), None) = (levels.next(), levels.next()) {
            return level
                .children()
                .iter()
                .filter(|child| !child.is_one_of(&LEVEL_DECORATIONS))
                .cloned()
                .collect();
        }
        trees
    }

    fn style_tree(&self) -> Option<SyntacticTree> {
        self.style
            .as_ref()
            .map(|style| leaf(NodeKind::Style, style))
    }

    /// Adds the content as last children of `book`, then moves `book` to the last level
    /// of the updated document.
    fn insert_content(
        &self,
        book: &mut Treepath,
        file: &Path,
        content: Vec<SyntacticTree>,
    ) -> Result<(), NovellaError> {
        if self.level_head == Some(LevelHead::CreateLevel) {
            let mut children = Vec::with_capacity(content.len() + 2);
            children.extend(self.style_tree());
            children.push(tree(
                NodeKind::LevelTitle,
                [leaf(NodeKind::Word, file_stem(file))],
            ));
            children.extend(content);
            let added = book.add_child_last(SyntacticTree::new(NodeKind::Level, children));
            *book = find_last_level(&added.start(), self.level_above)?;
            return Ok(());
        }
        for child in content {
            let child = match self.style_tree() {
                Some(style) => child.add_first(style),
                None => child,
            };
            let added = book.add_child_last(child);
            *book = find_last_level(&added.start(), self.level_above)?;
        }
        Ok(())
    }
}

impl Command for InsertCommand {
    fn location(&self) -> &Location {
        &self.location
    }

    fn evaluate(
        &self,
        context: CommandExecutionContext,
    ) -> Result<CommandExecutionContext, NovellaError> {
        let target = self.resolve_target(context.book_directory());
        debug!("Inserting '{}'", target.display());
        let document = context
            .document_tree()
            .cloned()
            .unwrap_or_else(|| tree(NodeKind::Opus, []));
        let mut book = Treepath::new(document);
        let mut problems = Vec::new();

        let outcome = if target.is_dir() {
            self.insert_directory(&context, &target, &mut book, &mut problems)
        } else {
            self.insert_file(&context, &target, &mut book, &mut problems)
        };
        match outcome {
            Ok(()) => {}
            Err(NovellaError::Command(err)) => {
                problems.push(Problem::from_error_at(self.location.clone(), &err));
            }
            Err(fatal) => return Err(fatal),
        }

        let document = book.tree_at_start().clone();
        Ok(context.with_document_tree(document).with_problems(problems))
    }
}

fn whole_content(interpreter: &DesignatorInterpreter) -> Vec<SyntacticTree> {
    interpreter.enriched_treepath().tree_at_start().children().to_vec()
}

/// The treepath of the last level found `depth` levels down, following last children.
pub fn find_last_level(treepath: &Treepath, depth: usize) -> Result<Treepath, NovellaError> {
    if depth == 0 {
        return Ok(treepath.clone());
    }
    let Some(last) = treepath.tree_at_end().child_count().checked_sub(1) else {
        return Err(CommandParameterError::NoChildTree { level: depth }.into());
    };
    let child = treepath.child(last)?;
    if !child.tree_at_end().is(NodeKind::Level) {
        return Err(CommandParameterError::NoLevel.into());
    }
    find_last_level(&child, depth - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerPool;
    use std::fs;
    use std::sync::Arc;

    fn context(book_directory: &Path) -> CommandExecutionContext {
        let pool = Arc::new(WorkerPool::new(Some(2)).unwrap());
        CommandExecutionContext::new(book_directory, book_directory, pool)
            .with_document_tree(tree(NodeKind::Opus, []))
    }

    fn evaluate(command: InsertCommand, context: CommandExecutionContext) -> CommandExecutionContext {
        command
            .evaluate(context)
            .unwrap_or_else(|err| panic!("{:?}", miette::Report::new(err)))
    }

    fn messages(context: &CommandExecutionContext) -> Vec<&str> {
        context.problems().iter().map(Problem::message).collect()
    }

    fn titles(trees: &[SyntacticTree]) -> Vec<&str> {
        trees
            .iter()
            .filter(|tree| tree.is(NodeKind::Level))
            .filter_map(|level| level.children().iter().find(|child| child.is(NodeKind::LevelTitle)))
            .filter_map(|title| title.children().first().and_then(SyntacticTree::text))
            .collect()
    }

    fn identifier(text: &str) -> FragmentIdentifier {
        text.parse().unwrap()
    }

    #[test]
    fn test_find_last_level() {
        let document = Treepath::new(tree(
            NodeKind::Opus,
            [
                tree(NodeKind::Level, []),
                tree(NodeKind::Level, [tree(NodeKind::Level, [])]),
            ],
        ));
        assert_eq!(find_last_level(&document, 0).unwrap().indices_in_parent(), Vec::<usize>::new());
        assert_eq!(find_last_level(&document, 2).unwrap().indices_in_parent(), vec![1, 0]);
        assert!(matches!(
            find_last_level(&document, 3),
            Err(NovellaError::Command(CommandParameterError::NoChildTree { level: 1 }))
        ));

        let without_level = Treepath::new(tree(NodeKind::Opus, [tree(NodeKind::ParagraphRegular, [])]));
        assert!(matches!(
            find_last_level(&without_level, 1),
            Err(NovellaError::Command(CommandParameterError::NoLevel))
        ));
    }

    #[test]
    fn test_remove_head_if_needed() {
        let level = tree(
            NodeKind::Level,
            [
                leaf(NodeKind::ImplicitIdentifier, "\\\\Title"),
                tree(NodeKind::LevelTitle, [leaf(NodeKind::Word, "Title")]),
                leaf(NodeKind::ExplicitTag, "t"),
                tree(NodeKind::ParagraphRegular, [leaf(NodeKind::Word, "kept")]),
            ],
        );
        let no_head = InsertCommand::new(Location::unknown(), "x").with_level_head(Some(LevelHead::NoHead));
        assert_eq!(
            no_head.remove_head_if_needed(vec![level.clone()]),
            vec![tree(NodeKind::ParagraphRegular, [leaf(NodeKind::Word, "kept")])]
        );

        let with_paragraph = vec![level.clone(), tree(NodeKind::ParagraphRegular, [])];
        assert_eq!(no_head.remove_head_if_needed(with_paragraph.clone()), with_paragraph);

        let plain = InsertCommand::new(Location::unknown(), "x");
        assert_eq!(plain.remove_head_if_needed(vec![level.clone()]), vec![level]);
    }

    #[test]
    fn test_insert_one_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.novella"), "== Chapter\n\nSome words").unwrap();

        let inserted = evaluate(InsertCommand::new(Location::unknown(), "file:one.novella"), context(dir.path()));
        assert!(!inserted.has_problem(), "{:?}", inserted.problems());
        let opus = inserted.document_tree().unwrap();
        assert_eq!(opus.child_count(), 1);
        let level = &opus.children()[0];
        assert_eq!(level.children()[0], leaf(NodeKind::ImplicitIdentifier, "\\\\Chapter"));
        assert_eq!(
            level.children().last().unwrap(),
            &tree(
                NodeKind::ParagraphRegular,
                [leaf(NodeKind::Word, "Some"), leaf(NodeKind::Word, "words")]
            )
        );
    }

    #[test]
    fn test_missing_file_leaves_document_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let inserted = evaluate(InsertCommand::new(Location::unknown(), "absent.novella"), context(dir.path()));
        assert_eq!(inserted.document_tree().unwrap(), &tree(NodeKind::Opus, []));
        assert_eq!(inserted.problems().len(), 1);
        assert!(messages(&inserted)[0].starts_with("Could not read '"));
    }

    #[test]
    fn test_create_level_puts_style_before_title() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("no-chapter.novella"), "Just text").unwrap();

        let command = InsertCommand::new(Location::unknown(), "no-chapter.novella")
            .with_level_head(Some(LevelHead::CreateLevel))
            .with_style("fancy");
        let inserted = evaluate(command, context(dir.path()));
        assert_eq!(
            inserted.document_tree().unwrap(),
            &tree(
                NodeKind::Opus,
                [tree(
                    NodeKind::Level,
                    [
                        leaf(NodeKind::Style, "fancy"),
                        tree(NodeKind::LevelTitle, [leaf(NodeKind::Word, "no-chapter")]),
                        tree(NodeKind::ParagraphRegular, [leaf(NodeKind::Word, "Just"), leaf(NodeKind::Word, "text")]),
                    ]
                )]
            )
        );
    }

    #[test]
    fn test_level_above_needs_a_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.novella"), "== A\n\nText").unwrap();

        let command = InsertCommand::new(Location::unknown(), "a.novella").with_level_above(1);
        let inserted = evaluate(command, context(dir.path()));
        assert_eq!(inserted.document_tree().unwrap(), &tree(NodeKind::Opus, []));
        assert_eq!(messages(&inserted), vec!["Found no child tree while seeking level 1"]);
    }

    #[test]
    fn test_unknown_identifier() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.novella"), "== A\n\nText").unwrap();

        let command = InsertCommand::new(Location::unknown(), "a.novella")
            .with_fragment_identifiers(vec![identifier("\\\\A"), identifier("\\\\missing")]);
        let inserted = evaluate(command, context(dir.path()));
        assert_eq!(inserted.document_tree().unwrap(), &tree(NodeKind::Opus, []));
        assert_eq!(messages(&inserted), vec!["Cannot find: '\\missing'"]);
    }

    #[test]
    fn test_directory_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let parts = dir.path().join("parts");
        fs::create_dir(&parts).unwrap();
        fs::write(parts.join("b.novella"), "== Bravo\n\nb").unwrap();
        fs::write(parts.join("a.novella"), "== Alpha\n\na").unwrap();
        fs::write(parts.join("ignored.txt"), "== Ignored").unwrap();

        let inserted = evaluate(InsertCommand::new(Location::unknown(), "parts"), context(dir.path()));
        assert!(!inserted.has_problem(), "{:?}", inserted.problems());
        assert_eq!(titles(inserted.document_tree().unwrap().children()), vec!["Alpha", "Bravo"]);

        let reversed = InsertCommand::new(Location::unknown(), "parts")
            .with_file_ordering(FileOrdering::ByAbsolutePath.inverse());
        let inserted = evaluate(reversed, context(dir.path()));
        assert_eq!(titles(inserted.document_tree().unwrap().children()), vec!["Bravo", "Alpha"]);
    }

    #[test]
    fn test_directory_identifiers_must_be_unique() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.novella"), "== One\n\\\\shared\n\none\n\n== Solo\n\nsolo").unwrap();
        fs::write(dir.path().join("2.novella"), "== Two\n\\\\shared\n\ntwo").unwrap();

        let command = InsertCommand::new(Location::unknown(), dir.path().to_str().unwrap())
            .with_fragment_identifiers(vec![
                identifier("\\\\shared"),
                identifier("\\\\Solo"),
                identifier("\\\\nowhere"),
            ]);
        let inserted = evaluate(command, context(dir.path()));
        assert_eq!(titles(inserted.document_tree().unwrap().children()), vec!["Solo"]);

        let messages = messages(&inserted);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Identifier \\shared found multiple times in:\n"));
        assert_eq!(messages[0].lines().count(), 3);
        assert_eq!(messages[1], "Could not find \\nowhere in any given Novella");
    }

    #[test]
    fn test_directory_by_version_with_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.0.0.novella"), "x").unwrap();
        fs::write(dir.path().join("draft.novella"), "y").unwrap();

        let command = InsertCommand::new(Location::unknown(), dir.path().to_str().unwrap())
            .with_file_ordering(FileOrdering::ByVersionNumber);
        let inserted = evaluate(command, context(dir.path()));
        assert_eq!(inserted.document_tree().unwrap(), &tree(NodeKind::Opus, []));
        assert!(messages(&inserted)[0].starts_with("Could not sort files: Could not create file sort criteria for:"));
    }
}
