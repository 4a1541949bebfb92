//! Stepping through a tree with treepaths instead of recursion, so a walk can stop, edit the
//! tree, and resume from the edited treepath.

use crate::tree::SyntacticTree;
use crate::treepath::Treepath;

/// Next node in document order: the first child if any, otherwise [`next_up`].
pub fn next(treepath: &Treepath) -> Option<Treepath> {
    if treepath.tree_at_end().child_count() > 0 {
        treepath.child(0).ok()
    } else {
        next_up(treepath)
    }
}

/// Next node in document order skipping the subtree of the end: the next sibling, or the
/// next sibling of the closest ancestor having one. The root itself is never returned.
pub fn next_up(treepath: &Treepath) -> Option<Treepath> {
    let mut current = treepath;
    loop {
        if let Some(sibling) = current.next_sibling() {
            return Some(sibling);
        }
        current = current.previous()?;
    }
}

/// Lazy pre-order walk, restartable from any treepath.
pub struct Preorder {
    current: Option<Treepath>,
}

pub fn preorder(start: Treepath) -> Preorder {
    Preorder {
        current: Some(start),
    }
}

impl Iterator for Preorder {
    type Item = Treepath;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        self.current = next(&current);
        Some(current)
    }
}

/// Walks children from last to first, visiting a node after its children. Descends only into
/// nodes the filter accepts.
pub struct MirroredPostorder<F> {
    filter: F,
}

impl<F> MirroredPostorder<F>
where
    F: Fn(&SyntacticTree) -> bool,
{
    pub fn new(filter: F) -> Self {
        MirroredPostorder { filter }
    }

    pub fn first(&self, treepath: &Treepath) -> Treepath {
        let mut result = treepath.clone();
        loop {
            let child_count = result.tree_at_end().child_count();
            if child_count == 0 || !(self.filter)(result.tree_at_end()) {
                return result;
            }
            match result.child(child_count - 1) {
                Ok(child) => result = child,
                Err(_) => return result,
            }
        }
    }

    pub fn next(&self, treepath: &Treepath) -> Option<Treepath> {
        match treepath.previous_sibling() {
            Some(sibling) if sibling.tree_at_end().child_count() == 0 => Some(sibling),
            Some(sibling) => Some(self.first(&sibling)),
            None => treepath.previous().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_kind::NodeKind::{self, *};
    use crate::tree::{leaf, tree};

    fn sample() -> SyntacticTree {
        tree(
            Novella,
            [
                tree(ParagraphRegular, [leaf(Word, "a"), leaf(Word, "b")]),
                tree(Level, [tree(ParagraphRegular, [leaf(Word, "c")])]),
            ],
        )
    }

    fn texts(treepaths: impl Iterator<Item = Treepath>) -> Vec<String> {
        treepaths
            .map(|treepath| {
                let tree = treepath.tree_at_end();
                tree.text()
                    .map(str::to_string)
                    .unwrap_or_else(|| tree.kind().to_string())
            })
            .collect()
    }

    #[test]
    fn test_preorder_visits_in_document_order() {
        let visited = texts(preorder(Treepath::new(sample())));
        assert_eq!(
            visited,
            vec![
                "NOVELLA",
                "PARAGRAPH_REGULAR",
                "a",
                "b",
                "_LEVEL",
                "PARAGRAPH_REGULAR",
                "c"
            ]
        );
    }

    #[test]
    fn test_next_up_skips_subtree() {
        let paragraph = Treepath::create(sample(), &[0]).unwrap();
        let after = next_up(&paragraph).unwrap();
        assert_eq!(after.tree_at_end().kind(), Level);
        let last_word = Treepath::create(sample(), &[1, 0, 0]).unwrap();
        assert!(next_up(&last_word).is_none());
        assert!(next_up(&Treepath::new(sample())).is_none());
    }

    #[test]
    fn test_mirrored_postorder() {
        let traversal = MirroredPostorder::new(|tree: &SyntacticTree| {
            tree.is_one_of(&[NodeKind::Novella, NodeKind::Level])
        });
        let mut visited = Vec::new();
        let mut current = Some(traversal.first(&Treepath::new(sample())));
        while let Some(treepath) = current {
            visited.push(treepath.indices_in_parent());
            current = traversal.next(&treepath);
        }
        assert_eq!(visited, vec![vec![1, 0], vec![1], vec![0], vec![]]);
    }
}
