use crate::designator::tools::to_implicit_tag_set;
use crate::designator::Tag;
use crate::node_kind::{NodeKind, TagBehavior};
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::debug;
use std::collections::BTreeSet;

/// Makes tags explicit, then derives implicit tags from level titles.
pub fn enhance(treepath: &Treepath) -> Treepath {
    let explicit = enhance_with_explicit_tags(treepath.tree_at_end());
    treepath.replace_end(enhance_with_implicit_tags(&explicit))
}

/// Turns raw `TAG` children of scope and terminal nodes into `_EXPLICIT_TAG`.
pub fn enhance_with_explicit_tags(tree: &SyntacticTree) -> SyntacticTree {
    let behavior = tree.kind().tag_behavior();
    if behavior == TagBehavior::NonTraversable {
        return tree.clone();
    }
    let owns_tags = matches!(behavior, TagBehavior::Scope | TagBehavior::Terminal);
    let children = tree
        .children()
        .iter()
        .map(|child| {
            if owns_tags && child.is(NodeKind::Tag) {
                explicit_tag_of(child)
            } else {
                enhance_with_explicit_tags(child)
            }
        })
        .collect();
    tree.adopt(children)
}

fn explicit_tag_of(tag: &SyntacticTree) -> SyntacticTree {
    let explicit = SyntacticTree::with_text(NodeKind::ExplicitTag, tag.text().unwrap_or_default());
    match tag.location() {
        Some(location) => explicit.located(location.clone()),
        None => explicit,
    }
}

/// Gives `_IMPLICIT_TAG` first children to every level that has no tag of its own.
pub fn enhance_with_implicit_tags(tree: &SyntacticTree) -> SyntacticTree {
    if !tree.is_one_of(&[NodeKind::Level, NodeKind::Novella, NodeKind::Opus]) {
        return tree.clone();
    }

    let mut children = Vec::with_capacity(tree.child_count());
    if tree.is(NodeKind::Level) && !has_tag(tree) {
        let title_tags = tree
            .children()
            .iter()
            .find(|child| child.is(NodeKind::LevelTitle))
            .map(to_implicit_tag_set)
            .unwrap_or_default();
        children.extend(
            title_tags
                .iter()
                .map(|tag| tag.as_syntactic_tree(NodeKind::ImplicitTag)),
        );
    }
    children.extend(tree.children().iter().map(enhance_with_implicit_tags));
    tree.adopt(children)
}

fn has_tag(tree: &SyntacticTree) -> bool {
    tree.children()
        .iter()
        .any(|child| child.is_one_of(&[NodeKind::ExplicitTag, NodeKind::Tag]))
}

const UNTRAVERSABLE: [NodeKind; 6] = [
    NodeKind::Word,
    NodeKind::WordAfterCircumflexAccent,
    NodeKind::Style,
    NodeKind::PunctuationSign,
    NodeKind::ImplicitIdentifier,
    NodeKind::ExplicitIdentifier,
];

/// Explicit tags of the whole tree, in document order, without duplicates.
pub fn find_explicit_tags(tree: &SyntacticTree) -> Vec<Tag> {
    let mut tags = Vec::new();
    collect_explicit_tags(tree, &mut tags);
    tags
}

fn collect_explicit_tags(tree: &SyntacticTree, tags: &mut Vec<Tag>) {
    if tree.is_one_of(&UNTRAVERSABLE) {
        return;
    }
    if tree.is(NodeKind::ExplicitTag) {
        if let Some(tag) = tree.text().and_then(|name| Tag::new(name).ok()) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        return;
    }
    for child in tree.children() {
        collect_explicit_tags(child, tags);
    }
}

/// Renames `_IMPLICIT_TAG` to `_PROMOTED_TAG` when some explicit tag has the same name.
pub fn promote(treepath: &Treepath, explicit_tags: &BTreeSet<Tag>) -> Treepath {
    if treepath.tree_at_start().child_count() == 0 || explicit_tags.is_empty() {
        return treepath.start();
    }
    let mut promoted = 0;
    let tree = promote_tree(treepath.tree_at_end(), explicit_tags, &mut promoted);
    debug!("Promoted {} implicit tag(s)", promoted);
    treepath.replace_end(tree).start()
}

fn promote_tree(tree: &SyntacticTree, explicit_tags: &BTreeSet<Tag>, promoted: &mut usize) -> SyntacticTree {
    if tree.is(NodeKind::ImplicitTag) {
        let name = tree.text().unwrap_or_default();
        if Tag::contains(explicit_tags, name) {
            *promoted += 1;
            return SyntacticTree::with_text(NodeKind::PromotedTag, name);
        }
        return tree.clone();
    }
    let traversable = tree.is_one_of(&[NodeKind::Novella, NodeKind::Opus])
        || tree.kind().tag_behavior() != TagBehavior::NonTraversable;
    if !traversable {
        return tree.clone();
    }
    let children = tree
        .children()
        .iter()
        .map(|child| promote_tree(child, explicit_tags, promoted))
        .collect();
    tree.adopt(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designator::Tag;
    use crate::node_kind::NodeKind::*;
    use crate::tree::{leaf, tree};

    fn level(title: &str, children: Vec<SyntacticTree>) -> SyntacticTree {
        let mut all = vec![tree(LevelTitle, [leaf(Word, title)])];
        all.extend(children);
        tree(Level, all)
    }

    #[test]
    fn test_explicit_tags_only_under_scope_and_terminal() {
        let novella = tree(
            Novella,
            [
                leaf(Tag, "loose"),
                tree(ParagraphRegular, [leaf(Tag, "t1"), leaf(Word, "w")]),
                level("L", vec![leaf(Tag, "t2")]),
            ],
        );
        let result = enhance_with_explicit_tags(&novella);
        assert_eq!(result.children()[0], leaf(Tag, "loose"));
        assert_eq!(result.children()[1].children()[0], leaf(ExplicitTag, "t1"));
        assert_eq!(result.children()[2].children()[1], leaf(ExplicitTag, "t2"));
    }

    #[test]
    fn test_implicit_tags_from_title() {
        let novella = tree(
            Novella,
            [
                tree(
                    Level,
                    [tree(
                        LevelTitle,
                        [leaf(Word, "one"), tree(BlockInsideDoubleQuotes, [leaf(Word, "two")])],
                    )],
                ),
                level("tagged", vec![leaf(ExplicitTag, "mine")]),
            ],
        );
        let result = enhance(&Treepath::new(novella));
        let first = &result.tree_at_end().children()[0];
        assert_eq!(first.children()[0], leaf(ImplicitTag, "one"));
        assert_eq!(first.children()[1], leaf(ImplicitTag, "two"));
        let second = &result.tree_at_end().children()[1];
        assert!(second.children().iter().all(|child| !child.is(ImplicitTag)));
    }

    #[test]
    fn test_find_explicit_tags_in_document_order() {
        let novella = tree(
            Novella,
            [
                tree(ParagraphRegular, [leaf(ExplicitTag, "b"), leaf(Word, "w")]),
                level("x", vec![leaf(ExplicitTag, "a"), leaf(ExplicitTag, "b")]),
            ],
        );
        let names: Vec<String> = find_explicit_tags(&novella)
            .iter()
            .map(|tag| tag.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_promote_matching_implicit_tags() {
        let novella = tree(
            Novella,
            [
                tree(Level, [leaf(ImplicitTag, "chapter"), leaf(ImplicitTag, "other")]),
                tree(ParagraphRegular, [leaf(ExplicitTag, "chapter")]),
            ],
        );
        let explicit: BTreeSet<Tag> = find_explicit_tags(&novella).into_iter().collect();
        let result = promote(&Treepath::new(novella), &explicit);
        let level = &result.tree_at_end().children()[0];
        assert_eq!(level.children()[0], leaf(PromotedTag, "chapter"));
        assert_eq!(level.children()[1], leaf(ImplicitTag, "other"));
    }
}
