//! Nests embedded list items according to their indentation.
//!
//! A raw item sits among the children of some paragraph, right after the whitespace that
//! indents it. When the walk meets one, it inserts a `_PLACEHOLDER_` before it, then "gobbles"
//! the items following the placeholder (with the separators between them) into a fresh list
//! tree, recursing on deeper indentation. The placeholder is finally replaced by that tree.
//!
//! Gobbling relies on treepaths being persistent: a nested call restarts from the placeholder
//! as it was before the caller removed anything, and hands back the treepath where it stopped.

use crate::error::{ManglingError, TreeError};
use crate::node_kind::NodeKind;
use crate::traversal::{next, next_up};
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::debug;

pub fn rehierarchize_embedded_lists(treepath: &Treepath) -> Result<Treepath, ManglingError> {
    let mut current = treepath.clone();
    let mut list_count = 0;
    loop {
        let following = match synthetic_kind(current.tree_at_end().kind()) {
            Some(synthetic) => {
                current = insert_placeholder(&current)?;
                let indentation = indent_size(&current);
                let gobbler = Treepath::new(SyntacticTree::new(synthetic, Vec::new()));
                let result = gobble_this_indent_or_greater(gobbler, current, indentation, synthetic)?;
                current = result
                    .gobbled
                    .replace_end(result.gobbler.tree_at_start().clone());
                list_count += 1;
                next_up(&current)
            }
            None => next(&current),
        };
        match following {
            Some(treepath) => current = treepath,
            None => {
                debug!("Rehierarchized {} embedded list(s)", list_count);
                return Ok(current.start());
            }
        }
    }
}

fn synthetic_kind(raw: NodeKind) -> Option<NodeKind> {
    match raw {
        NodeKind::EmbeddedListItemWithHyphen => Some(NodeKind::EmbeddedListWithHyphen),
        NodeKind::EmbeddedListItemNumbered => Some(NodeKind::EmbeddedListWithNumberSign),
        _ => None,
    }
}

fn insert_placeholder(item: &Treepath) -> Result<Treepath, TreeError> {
    let parent = parent_of(item)?;
    let index = item.index_in_previous().unwrap_or_default();
    parent.add_child_at(index, SyntacticTree::new(NodeKind::Placeholder, Vec::new()))
}

fn parent_of(treepath: &Treepath) -> Result<Treepath, TreeError> {
    treepath.previous().cloned().ok_or(TreeError::TooShort {
        minimum: 2,
        actual: treepath.length(),
    })
}

/// What happened after consuming the separators following some placeholder.
struct Gobbling {
    remaining: Treepath,
    gobbled: Option<GobbledItem>,
}

struct GobbledItem {
    tree: SyntacticTree,
    indentation: Option<usize>,
}

struct GobbleResult {
    gobbler: Treepath,
    gobbled: Treepath,
    may_continue: bool,
}

fn gobble_this_indent_or_greater(
    mut gobbler: Treepath,
    mut gobble_start: Treepath,
    first_indent: usize,
    synthetic: NodeKind,
) -> Result<GobbleResult, ManglingError> {
    loop {
        let gobbling = gobble(&gobble_start, Some(first_indent))?;
        let Some(item) = gobbling.gobbled else {
            return Ok(GobbleResult {
                gobbler,
                gobbled: gobble_start,
                may_continue: false,
            });
        };
        let indentation = item.indentation.unwrap_or(first_indent);

        if indentation == first_indent {
            gobbler = parent_of(&gobbler.add_child_last(item.tree))?;
            gobble_start = gobbling.remaining;
        } else if indentation > first_indent {
            // The nested call gobbles again from the same start, this time with the item.
            let nested = gobbler.add_child_last(SyntacticTree::new(synthetic, Vec::new()));
            let result = gobble_this_indent_or_greater(nested, gobble_start, indentation, synthetic)?;
            if !result.may_continue {
                return Ok(GobbleResult {
                    gobbler: parent_of(&result.gobbler)?,
                    gobbled: result.gobbled,
                    may_continue: false,
                });
            }
            let lookahead = gobble(&result.gobbled, None)?;
            if let Some(GobbledItem {
                indentation: Some(lookahead_indentation),
                ..
            }) = lookahead.gobbled
            {
                if lookahead_indentation > first_indent {
                    return Err(ManglingError::InconsistentIndentation {
                        indentation: lookahead_indentation,
                        expected: first_indent,
                    });
                }
            }
            gobbler = parent_of(&result.gobbler)?;
            gobble_start = result.gobbled;
        } else {
            return Ok(GobbleResult {
                gobbler,
                gobbled: gobble_start,
                may_continue: true,
            });
        }
    }
}

/// Removes the separators after the placeholder, then the first item if one comes next.
/// The indentation is the one of the last whitespace removed, or 0 after a line break.
fn gobble(gobble_start: &Treepath, mut indentation: Option<usize>) -> Result<Gobbling, TreeError> {
    let mut start = gobble_start.clone();
    while let Some(sibling) = start.next_sibling() {
        let sibling_tree = sibling.tree_at_end();
        if synthetic_kind(sibling_tree.kind()).is_some() {
            let remaining = start.remove_next_sibling()?;
            return Ok(Gobbling {
                remaining,
                gobbled: Some(GobbledItem {
                    tree: SyntacticTree::new(
                        NodeKind::EmbeddedListItem,
                        sibling_tree.children().to_vec(),
                    ),
                    indentation,
                }),
            });
        }
        if !sibling_tree.kind().is_separator() {
            break;
        }
        indentation = Some(whitespace_length(sibling_tree));
        start = start.remove_next_sibling()?;
    }
    Ok(Gobbling {
        remaining: start,
        gobbled: None,
    })
}

/// Length of the whitespace right before the end, or before the closest ancestor that is not
/// a first child.
fn indent_size(treepath: &Treepath) -> usize {
    let (Some(previous), Some(index)) = (treepath.previous(), treepath.index_in_previous()) else {
        return 0;
    };
    if index > 0 {
        let left = &previous.tree_at_end().children()[index - 1];
        if left.is(NodeKind::Whitespace) {
            whitespace_length(left)
        } else {
            0
        }
    } else {
        indent_size(previous)
    }
}

fn whitespace_length(tree: &SyntacticTree) -> usize {
    if tree.is(NodeKind::Whitespace) {
        tree.text().map_or(0, |text| text.chars().count())
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_kind::NodeKind::*;
    use crate::tree::{leaf, tree};

    fn raw(word: &str) -> SyntacticTree {
        tree(EmbeddedListItemWithHyphen, [leaf(Word, word)])
    }

    fn item(word: &str) -> SyntacticTree {
        tree(EmbeddedListItem, [leaf(Word, word)])
    }

    fn line_break() -> SyntacticTree {
        tree(LineBreak, [])
    }

    fn indent(width: usize) -> SyntacticTree {
        leaf(Whitespace, " ".repeat(width))
    }

    fn mangle(paragraph_children: Vec<SyntacticTree>) -> Result<SyntacticTree, ManglingError> {
        let novella = tree(Novella, [tree(ParagraphRegular, paragraph_children)]);
        rehierarchize_embedded_lists(&Treepath::new(novella))
            .map(|treepath| treepath.tree_at_end().children()[0].clone())
    }

    #[test]
    fn test_flat_list() {
        let paragraph = mangle(vec![
            leaf(Word, "w"),
            line_break(),
            raw("a"),
            line_break(),
            raw("b"),
        ])
        .unwrap();
        assert_eq!(
            paragraph,
            tree(
                ParagraphRegular,
                [
                    leaf(Word, "w"),
                    line_break(),
                    tree(EmbeddedListWithHyphen, [item("a"), item("b")]),
                ]
            )
        );
    }

    #[test]
    fn test_nested_list() {
        let paragraph = mangle(vec![
            indent(1),
            raw("a"),
            line_break(),
            indent(3),
            raw("sub"),
            line_break(),
            indent(1),
            raw("b"),
        ])
        .unwrap();
        assert_eq!(
            paragraph,
            tree(
                ParagraphRegular,
                [
                    indent(1),
                    tree(
                        EmbeddedListWithHyphen,
                        [
                            item("a"),
                            tree(EmbeddedListWithHyphen, [item("sub")]),
                            item("b"),
                        ]
                    ),
                ]
            )
        );
    }

    #[test]
    fn test_list_ends_at_other_content() {
        let paragraph = mangle(vec![raw("a"), line_break(), leaf(Word, "after")]).unwrap();
        assert_eq!(
            paragraph,
            tree(
                ParagraphRegular,
                [
                    tree(EmbeddedListWithHyphen, [item("a")]),
                    line_break(),
                    leaf(Word, "after"),
                ]
            )
        );
    }

    #[test]
    fn test_every_item_appears_once() {
        let paragraph = mangle(vec![
            raw("a"),
            line_break(),
            indent(2),
            raw("b"),
            line_break(),
            indent(4),
            raw("c"),
            line_break(),
            indent(2),
            raw("d"),
            line_break(),
            raw("e"),
        ])
        .unwrap();
        let mut words = Vec::new();
        collect_items(&paragraph, &mut words);
        assert_eq!(words, vec!["a", "b", "c", "d", "e"]);
    }

    fn collect_items(tree: &SyntacticTree, words: &mut Vec<String>) {
        if tree.is(EmbeddedListItem) {
            words.push(tree.text_of_child(Word).unwrap_or_default().to_string());
        }
        for child in tree.children() {
            collect_items(child, words);
        }
    }

    #[test]
    fn test_inconsistent_indentation_is_fatal() {
        let error = mangle(vec![
            indent(1),
            raw("a"),
            line_break(),
            indent(5),
            raw("deep"),
            line_break(),
            indent(3),
            raw("between"),
        ])
        .unwrap_err();
        assert_eq!(
            error,
            ManglingError::InconsistentIndentation {
                indentation: 3,
                expected: 1
            }
        );
    }
}
