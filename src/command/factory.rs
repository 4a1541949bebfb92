use super::{Command, InsertCommand, LevelHead, MapstylesheetCommand};
use crate::designator::FragmentIdentifier;
use crate::error::{CommandParameterError, NovellaError};
use crate::node_kind::NodeKind;
use crate::ordering::FileOrdering;
use crate::problem::{Location, Problem};
use crate::tree::SyntacticTree;
use log::warn;

/// Builds the commands of an Opus tree. A command that cannot be built is skipped, with a
/// problem telling why.
pub fn create_commands(opus: &SyntacticTree) -> (Vec<Box<dyn Command>>, Vec<Problem>) {
    let mut commands = Vec::with_capacity(opus.child_count());
    let mut problems = Vec::new();
    for child in opus.children() {
        match create_command(child) {
            Ok(command) => commands.push(command),
            Err(err) => {
                warn!("Skipping command: {}", err);
                problems.push(Problem::from_error_at(location_of(child), &err));
            }
        }
    }
    (commands, problems)
}

pub fn create_command(tree: &SyntacticTree) -> Result<Box<dyn Command>, NovellaError> {
    match tree.kind() {
        NodeKind::CommandInsert => Ok(Box::new(create_insert(tree)?)),
        NodeKind::CommandMapstylesheet => Ok(Box::new(create_mapstylesheet(tree)?)),
        other => Err(CommandParameterError::Unsupported {
            kind: other.to_string(),
        }
        .into()),
    }
}

fn location_of(tree: &SyntacticTree) -> Location {
    tree.location().cloned().unwrap_or_else(Location::unknown)
}

fn create_insert(tree: &SyntacticTree) -> Result<InsertCommand, NovellaError> {
    let url = tree
        .text_of_child(NodeKind::UrlLiteral)
        .ok_or_else(|| CommandParameterError::MissingUrl {
            command: "insert".to_string(),
        })?;
    let mut command = InsertCommand::new(location_of(tree), url);
    let mut fragment_identifiers = Vec::new();
    for child in tree.children() {
        let text = child.text().unwrap_or_default();
        command = match child.kind() {
            NodeKind::UrlLiteral => command,
            NodeKind::CommandInsertRecurse => command.with_recurse(true),
            NodeKind::CommandInsertCreateLevel => command.with_level_head(Some(LevelHead::CreateLevel)),
            NodeKind::CommandInsertNoHead => command.with_level_head(Some(LevelHead::NoHead)),
            NodeKind::CommandInsertSort => command.with_file_ordering(parse_file_ordering(text)?),
            NodeKind::CommandInsertLevelAbove => command.with_level_above(parse_level_above(text)?),
            NodeKind::CommandInsertStyle => command.with_style(text),
            NodeKind::AbsoluteIdentifier => {
                fragment_identifiers.push(text.parse::<FragmentIdentifier>()?);
                command
            }
            other => {
                return Err(CommandParameterError::Unsupported {
                    kind: other.to_string(),
                }
                .into())
            }
        };
    }
    Ok(command.with_fragment_identifiers(fragment_identifiers))
}

fn create_mapstylesheet(tree: &SyntacticTree) -> Result<MapstylesheetCommand, NovellaError> {
    let mut mappings = Vec::with_capacity(tree.child_count());
    for assignment in tree.children() {
        if !assignment.is(NodeKind::CommandMapstylesheetAssignment) {
            return Err(CommandParameterError::Unsupported {
                kind: assignment.kind().to_string(),
            }
            .into());
        }
        let mime = assignment.text_of_child(NodeKind::Word).unwrap_or_default();
        let resource = assignment
            .text_of_child(NodeKind::ResourceLocation)
            .unwrap_or_default();
        mappings.push((mime.to_string(), resource.to_string()));
    }
    Ok(MapstylesheetCommand::new(location_of(tree), mappings))
}

/// `path+`, `path-`, `version+` or `version-`.
pub fn parse_file_ordering(text: &str) -> Result<FileOrdering, CommandParameterError> {
    let (name, inverse) = if let Some(name) = text.strip_suffix('+') {
        (name, false)
    } else if let Some(name) = text.strip_suffix('-') {
        (name, true)
    } else {
        return Err(CommandParameterError::MissingSortOrder {
            ordering: text.to_string(),
        });
    };
    let ordering = match name {
        "path" => FileOrdering::ByAbsolutePath,
        "version" => FileOrdering::ByVersionNumber,
        _ => {
            return Err(CommandParameterError::UnknownOrdering {
                name: name.to_string(),
            })
        }
    };
    Ok(if inverse { ordering.inverse() } else { ordering })
}

fn parse_level_above(text: &str) -> Result<usize, CommandParameterError> {
    text.parse().map_err(|_| CommandParameterError::InvalidLevelAbove {
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{leaf, tree};
    use crate::node_kind::NodeKind::*;

    #[test]
    fn test_file_orderings() {
        assert_eq!(parse_file_ordering("path+").unwrap(), FileOrdering::ByAbsolutePath);
        assert_eq!(
            parse_file_ordering("version-").unwrap(),
            FileOrdering::Inverse(Box::new(FileOrdering::ByVersionNumber))
        );
        assert_eq!(
            parse_file_ordering("size+").unwrap_err().to_string(),
            "Unknown ordering: 'size'"
        );
        assert!(matches!(
            parse_file_ordering("path"),
            Err(CommandParameterError::MissingSortOrder { .. })
        ));
    }

    #[test]
    fn test_insert_from_tree() {
        let insert = create_insert(&tree(
            CommandInsert,
            [
                leaf(UrlLiteral, "file:parts"),
                tree(CommandInsertRecurse, []),
                leaf(CommandInsertSort, "version+"),
                tree(CommandInsertNoHead, []),
                leaf(CommandInsertLevelAbove, "2"),
                leaf(CommandInsertStyle, "s"),
                leaf(AbsoluteIdentifier, "\\\\a\\b"),
            ],
        ))
        .unwrap();
        assert_eq!(insert.file_name(), "parts");
        assert!(insert.recurse());
        assert_eq!(insert.file_ordering(), &FileOrdering::ByVersionNumber);
        assert_eq!(insert.level_head(), Some(LevelHead::NoHead));
        assert_eq!(insert.level_above(), 2);
        assert_eq!(insert.style(), Some("s"));
        assert_eq!(
            insert.fragment_identifiers(),
            &[FragmentIdentifier::new(["a", "b"]).unwrap()]
        );
    }

    #[test]
    fn test_bad_commands_are_skipped() {
        let opus = tree(
            Opus,
            [
                tree(
                    CommandInsert,
                    [leaf(UrlLiteral, "file:a"), leaf(CommandInsertLevelAbove, "-1")],
                ),
                tree(CommandInsert, [tree(CommandInsertRecurse, [])]),
                tree(
                    CommandMapstylesheet,
                    [tree(
                        CommandMapstylesheetAssignment,
                        [leaf(Word, "html"), leaf(ResourceLocation, "a.xsl")],
                    )],
                ),
            ],
        );
        let (commands, problems) = create_commands(&opus);
        assert_eq!(commands.len(), 1);
        let messages: Vec<&str> = problems.iter().map(Problem::message).collect();
        assert_eq!(
            messages,
            vec!["Invalid level above: '-1'", "Found no URL in insert"]
        );
    }
}
