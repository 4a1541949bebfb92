use crate::designator::Tag;
use crate::node_kind::{NodeKind, TagBehavior};
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::debug;
use std::collections::BTreeSet;

/// Keeps only what carries one of the wanted tags, along with the structure leading to it.
///
/// Terminal nodes survive when they have a wanted tag. Scope nodes survive when they have one
/// (and keep their whole content), or else when some descendant survives. Traversable nodes
/// always survive, with filtered children. Non-traversable children of a survivor are kept
/// as they are. An empty tag set returns the very same treepath.
pub fn filter(treepath: &Treepath, tags: &BTreeSet<Tag>) -> Treepath {
    debug!(
        "Filtering on {}",
        tags.iter().map(Tag::name).collect::<Vec<_>>().join(", ")
    );
    if tags.is_empty() {
        return treepath.clone();
    }
    match do_filter(treepath.tree_at_end(), tags) {
        Some(filtered) => treepath.replace_end(filtered.tree),
        None => treepath.replace_end(treepath.tree_at_end().adopt(Vec::new())),
    }
}

struct Filtered {
    has_tag: bool,
    tree: SyntacticTree,
}

fn do_filter(tree: &SyntacticTree, tags: &BTreeSet<Tag>) -> Option<Filtered> {
    let behavior = tree.kind().tag_behavior();
    match behavior {
        TagBehavior::Terminal | TagBehavior::Scope if has_tag(tree, tags) => Some(Filtered {
            has_tag: true,
            tree: tree.clone(),
        }),
        TagBehavior::Terminal => None,
        TagBehavior::Scope | TagBehavior::Traversable => {
            let mut children = Vec::with_capacity(tree.child_count());
            let mut has_tagged_child = false;
            for child in tree.children() {
                if child.kind().tag_behavior() == TagBehavior::NonTraversable {
                    children.push(child.clone());
                } else if let Some(result) = do_filter(child, tags) {
                    if result.has_tag {
                        children.push(result.tree);
                    }
                    has_tagged_child |= result.has_tag;
                }
            }
            if behavior == TagBehavior::Scope && !has_tagged_child {
                return None;
            }
            Some(Filtered {
                has_tag: has_tagged_child,
                tree: tree.adopt(children),
            })
        }
        TagBehavior::NonTraversable => Some(Filtered {
            has_tag: false,
            tree: tree.clone(),
        }),
    }
}

fn has_tag(tree: &SyntacticTree, tags: &BTreeSet<Tag>) -> bool {
    tree.children().iter().any(|child| {
        child.is_one_of(&[NodeKind::ExplicitTag, NodeKind::ImplicitTag])
            && child
                .text()
                .is_some_and(|name| Tag::contains(tags, name))
    })
}
