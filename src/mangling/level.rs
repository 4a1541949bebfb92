use crate::error::ManglingError;
use crate::node_kind::NodeKind;
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::debug;

/// Turns each `LEVEL_INTRODUCER_` among the children of the end into a `_LEVEL` that eats the
/// following siblings, up to the next introducer of the same depth or less. Deeper introducers
/// become nested levels.
///
/// The depth of the first introducer is a floor for its following siblings: going above it is
/// an [`ManglingError::IncorrectLevelDepth`].
pub fn rehierarchize_levels(treepath: &Treepath) -> Result<Treepath, ManglingError> {
    let tree = treepath.tree_at_end();
    if tree.child_count() == 0 {
        return Ok(treepath.clone());
    }
    let children = tree.children();
    let mut result = Vec::with_capacity(children.len());
    let mut first = true;
    let mut index = 0;
    while index < children.len() {
        let child = &children[index];
        if child.is(NodeKind::LevelIntroducer) {
            let roof = if first {
                first = false;
                introducer_depth(child)?
            } else {
                0
            };
            let (level, next_index) = build_level(children, index, roof)?;
            result.push(level);
            index = next_index;
        } else {
            result.push(child.clone());
            index += 1;
        }
    }
    debug!(
        "Rehierarchized levels: {} children became {}",
        children.len(),
        result.len()
    );
    Ok(treepath.replace_end(tree.adopt(result)))
}

/// Builds the level introduced at `start`, returns it with the index of the first sibling
/// left for the caller.
fn build_level(
    siblings: &[SyntacticTree],
    start: usize,
    roof: usize,
) -> Result<(SyntacticTree, usize), ManglingError> {
    let introducer = &siblings[start];
    let depth = introducer_depth(introducer)?;
    let mut level_children: Vec<SyntacticTree> = introducer
        .children()
        .iter()
        .filter(|child| !child.is(NodeKind::LevelIntroducerIndent))
        .cloned()
        .collect();

    let mut index = start + 1;
    while index < siblings.len() {
        let next = &siblings[index];
        if next.is(NodeKind::LevelIntroducer) {
            let next_depth = introducer_depth(next)?;
            if next_depth < roof {
                return Err(ManglingError::IncorrectLevelDepth {
                    depth: next_depth,
                    roof,
                });
            }
            if next_depth <= depth {
                break;
            }
            let (sublevel, next_index) = build_level(siblings, index, 0)?;
            level_children.push(sublevel);
            index = next_index;
        } else {
            level_children.push(next.clone());
            index += 1;
        }
    }

    let level = SyntacticTree::new(NodeKind::Level, level_children);
    let level = match introducer.location() {
        Some(location) => level.located(location.clone()),
        None => level,
    };
    Ok((level, index))
}

/// `==` is depth 1, `===` is depth 2, and so on.
fn introducer_depth(introducer: &SyntacticTree) -> Result<usize, ManglingError> {
    let indent = introducer
        .children()
        .first()
        .filter(|child| child.is(NodeKind::LevelIntroducerIndent))
        .and_then(SyntacticTree::text)
        .ok_or_else(|| malformed("missing indent"))?;
    if !indent.starts_with('=') || indent.len() < 2 {
        return Err(malformed(&format!("bad indent '{indent}'")));
    }
    Ok(indent.len() - 1)
}

fn malformed(reason: &str) -> ManglingError {
    ManglingError::MalformedNode {
        kind: NodeKind::LevelIntroducer.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_kind::NodeKind::*;
    use crate::tree::{leaf, tree};

    fn introducer(indent: &str, title: &str) -> SyntacticTree {
        tree(
            LevelIntroducer,
            [
                leaf(LevelIntroducerIndent, indent),
                tree(LevelTitle, [leaf(Word, title)]),
            ],
        )
    }

    fn paragraph(word: &str) -> SyntacticTree {
        tree(ParagraphRegular, [leaf(Word, word)])
    }

    fn title(word: &str) -> SyntacticTree {
        tree(LevelTitle, [leaf(Word, word)])
    }

    #[test]
    fn test_nesting() {
        let novella = tree(
            Novella,
            [
                paragraph("intro"),
                introducer("==", "one"),
                paragraph("p1"),
                introducer("===", "inner"),
                paragraph("p2"),
                introducer("==", "two"),
                paragraph("p3"),
            ],
        );
        let result = rehierarchize_levels(&Treepath::new(novella)).unwrap();
        assert_eq!(
            result.tree_at_end(),
            &tree(
                Novella,
                [
                    paragraph("intro"),
                    tree(
                        Level,
                        [
                            title("one"),
                            paragraph("p1"),
                            tree(Level, [title("inner"), paragraph("p2")]),
                        ]
                    ),
                    tree(Level, [title("two"), paragraph("p3")]),
                ]
            )
        );
    }

    #[test]
    fn test_introducer_children_keep_their_order() {
        let novella = tree(
            Novella,
            [tree(
                LevelIntroducer,
                [
                    leaf(LevelIntroducerIndent, "=="),
                    title("t"),
                    leaf(Tag, "a"),
                    leaf(AbsoluteIdentifier, "\\\\id"),
                ],
            )],
        );
        let result = rehierarchize_levels(&Treepath::new(novella)).unwrap();
        assert_eq!(
            result.tree_at_end().children()[0],
            tree(Level, [title("t"), leaf(Tag, "a"), leaf(AbsoluteIdentifier, "\\\\id")])
        );
    }

    #[test]
    fn test_shallower_than_first_is_fatal() {
        let novella = tree(
            Novella,
            [introducer("===", "deep"), introducer("==", "shallow")],
        );
        assert_eq!(
            rehierarchize_levels(&Treepath::new(novella)).unwrap_err(),
            ManglingError::IncorrectLevelDepth { depth: 1, roof: 2 }
        );
    }

    #[test]
    fn test_malformed_indent() {
        let novella = tree(Novella, [tree(LevelIntroducer, [title("t")])]);
        assert!(matches!(
            rehierarchize_levels(&Treepath::new(novella)),
            Err(ManglingError::MalformedNode { .. })
        ));
    }
}
