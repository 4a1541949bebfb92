use crate::tree::SyntacticTree;
use crate::treepath::Treepath;

/// Removes every `WHITESPACE_` and `LINE_BREAK_` under the end of the treepath.
pub fn remove_separators(treepath: &Treepath) -> Treepath {
    treepath.replace_end(remove_from_tree(treepath.tree_at_end()))
}

pub fn remove_from_tree(tree: &SyntacticTree) -> SyntacticTree {
    if tree.child_count() == 0 {
        return tree.clone();
    }
    let children = tree
        .children()
        .iter()
        .filter(|child| !child.kind().is_separator())
        .map(remove_from_tree)
        .collect();
    tree.adopt(children)
}
