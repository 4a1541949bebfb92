use crate::error::TreeError;
use crate::tree::SyntacticTree;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

/// A path from the root of a tree down to one of its nodes, the "end".
///
/// Each step records the tree it stands on and the index of the child taken to reach the
/// next step. Edits never touch the trees they come from: they return a new treepath whose
/// root has been rebuilt along the path, with every untouched subtree shared.
#[derive(Clone)]
pub struct Treepath {
    previous: Option<(Arc<Treepath>, usize)>,
    tree_at_end: SyntacticTree,
}

impl Treepath {
    /// A treepath of length 1 on the given root.
    pub fn new(tree: SyntacticTree) -> Self {
        Treepath {
            previous: None,
            tree_at_end: tree,
        }
    }

    /// Descends from the root of `tree` through the given child indices.
    pub fn create(tree: SyntacticTree, indices: &[usize]) -> Result<Self, TreeError> {
        Treepath::new(tree).descend(indices)
    }

    pub fn child(&self, index: usize) -> Result<Treepath, TreeError> {
        let child = self
            .tree_at_end
            .child(index)
            .cloned()
            .ok_or(TreeError::IndexOutOfBounds {
                index,
                child_count: self.tree_at_end.child_count(),
            })?;
        Ok(Treepath {
            previous: Some((Arc::new(self.clone()), index)),
            tree_at_end: child,
        })
    }

    pub fn descend(&self, indices: &[usize]) -> Result<Treepath, TreeError> {
        let mut treepath = self.clone();
        for &index in indices {
            treepath = treepath.child(index)?;
        }
        Ok(treepath)
    }

    // === Accessors ===

    pub fn tree_at_end(&self) -> &SyntacticTree {
        &self.tree_at_end
    }

    pub fn tree_at_start(&self) -> &SyntacticTree {
        match &self.previous {
            Some((previous, _)) => previous.tree_at_start(),
            None => &self.tree_at_end,
        }
    }

    pub fn previous(&self) -> Option<&Treepath> {
        self.previous.as_ref().map(|(previous, _)| previous.as_ref())
    }

    pub fn index_in_previous(&self) -> Option<usize> {
        self.previous.as_ref().map(|(_, index)| *index)
    }

    pub fn length(&self) -> usize {
        1 + self.previous().map_or(0, Treepath::length)
    }

    /// The treepath of length 1 on the same root.
    pub fn start(&self) -> Treepath {
        match self.previous() {
            Some(previous) => previous.start(),
            None => self.clone(),
        }
    }

    /// Treepath `distance` steps above this one, 0 being this one.
    pub fn treepath_at_distance(&self, distance: usize) -> Option<&Treepath> {
        let mut treepath = self;
        for _ in 0..distance {
            treepath = treepath.previous()?;
        }
        Some(treepath)
    }

    pub fn tree_at_distance(&self, distance: usize) -> Option<&SyntacticTree> {
        self.treepath_at_distance(distance)
            .map(Treepath::tree_at_end)
    }

    /// Treepath `distance` steps below the root, 0 being the root.
    pub fn treepath_at_distance_from_start(&self, distance: usize) -> Option<&Treepath> {
        let length = self.length();
        if distance >= length {
            None
        } else {
            self.treepath_at_distance(length - 1 - distance)
        }
    }

    /// Child indices from the root down to the end.
    pub fn indices_in_parent(&self) -> Vec<usize> {
        let mut indices = Vec::with_capacity(self.length());
        let mut treepath = self;
        while let Some((previous, index)) = &treepath.previous {
            indices.push(*index);
            treepath = previous;
        }
        indices.reverse();
        indices
    }

    /// True if the indices of this treepath start the indices of `other`, which means that
    /// `other` is inside the subtree this one points to, assuming both share the same root.
    pub fn has_same_starting_indices_as(&self, other: &Treepath) -> bool {
        let mine = self.indices_in_parent();
        let theirs = other.indices_in_parent();
        mine.len() <= theirs.len() && mine[..] == theirs[..mine.len()]
    }

    // === Siblings ===

    pub fn has_previous_sibling(&self) -> bool {
        matches!(self.index_in_previous(), Some(index) if index > 0)
    }

    pub fn has_next_sibling(&self) -> bool {
        match &self.previous {
            Some((previous, index)) => index + 1 < previous.tree_at_end.child_count(),
            None => false,
        }
    }

    pub fn previous_sibling(&self) -> Option<Treepath> {
        let (previous, index) = self.previous.as_ref()?;
        let sibling_index = index.checked_sub(1)?;
        previous.child(sibling_index).ok()
    }

    pub fn next_sibling(&self) -> Option<Treepath> {
        let (previous, index) = self.previous.as_ref()?;
        previous.child(index + 1).ok()
    }

    pub fn sibling_at(&self, index: usize) -> Result<Treepath, TreeError> {
        let previous = self.previous().ok_or(TreeError::TooShort {
            minimum: 2,
            actual: 1,
        })?;
        previous.child(index)
    }

    // === Edits ===

    /// Substitutes the end, rebuilding every ancestor up to the root.
    pub fn replace_end(&self, new_tree: SyntacticTree) -> Treepath {
        match &self.previous {
            None => Treepath::new(new_tree),
            Some((previous, index)) => {
                let mut children = previous.tree_at_end.children().to_vec();
                children[*index] = new_tree.clone();
                let new_parent = previous.tree_at_end.adopt(children);
                Treepath {
                    previous: Some((Arc::new(previous.replace_end(new_parent)), *index)),
                    tree_at_end: new_tree,
                }
            }
        }
    }

    /// Adds a child at the given position under the end, returns the treepath to it.
    pub fn add_child_at(&self, index: usize, child: SyntacticTree) -> Result<Treepath, TreeError> {
        let new_parent = self.tree_at_end.add_at(index, child)?;
        self.replace_end(new_parent).child(index)
    }

    pub fn add_child_first(&self, child: SyntacticTree) -> Treepath {
        let new_parent = self.tree_at_end.add_first(child.clone());
        self.child_of_rebuilt(new_parent, 0, child)
    }

    pub fn add_child_last(&self, child: SyntacticTree) -> Treepath {
        let new_parent = self.tree_at_end.add_last(child.clone());
        let index = new_parent.child_count() - 1;
        self.child_of_rebuilt(new_parent, index, child)
    }

    /// Adds a sibling after the last child of the parent, returns the treepath to it.
    pub fn add_sibling_last(&self, sibling: SyntacticTree) -> Result<Treepath, TreeError> {
        let previous = self.previous().ok_or(TreeError::TooShort {
            minimum: 2,
            actual: 1,
        })?;
        Ok(previous.add_child_last(sibling))
    }

    fn child_of_rebuilt(&self, new_parent: SyntacticTree, index: usize, child: SyntacticTree) -> Treepath {
        Treepath {
            previous: Some((Arc::new(self.replace_end(new_parent)), index)),
            tree_at_end: child,
        }
    }

    /// Removes the end from its parent, returns the treepath to the updated parent.
    pub fn remove_end(&self) -> Result<Treepath, TreeError> {
        let (previous, index) = self.previous.as_ref().ok_or(TreeError::TooShort {
            minimum: 2,
            actual: 1,
        })?;
        let new_parent = previous.tree_at_end.remove(*index)?;
        Ok(previous.replace_end(new_parent))
    }

    /// Removes the sibling right after the end, returns the treepath to the same end.
    pub fn remove_next_sibling(&self) -> Result<Treepath, TreeError> {
        let (previous, index) = self.previous.as_ref().ok_or(TreeError::TooShort {
            minimum: 2,
            actual: 1,
        })?;
        if index + 1 >= previous.tree_at_end.child_count() {
            return Err(TreeError::NoNextSibling);
        }
        let new_parent = previous.tree_at_end.remove(index + 1)?;
        previous.replace_end(new_parent).child(*index)
    }

    /// Removes the subtree `removed` points to, and returns the treepath to the end of
    /// `self` in the resulting tree. Both treepaths must come from the same root.
    pub fn remove_subtree(&self, removed: &Treepath) -> Result<Treepath, TreeError> {
        if !self.tree_at_start().ptr_eq(removed.tree_at_start()) {
            return Err(TreeError::DifferentRoots);
        }
        if removed.has_same_starting_indices_as(self) {
            return Err(TreeError::RemovingAncestor);
        }
        let mut indices = self.indices_in_parent();
        let removed_indices = removed.indices_in_parent();
        let depth = removed_indices.len() - 1;
        if indices.len() > depth
            && indices[..depth] == removed_indices[..depth]
            && indices[depth] > removed_indices[depth]
        {
            indices[depth] -= 1;
        }
        let new_root = removed.remove_end()?.start();
        new_root.descend(&indices)
    }
}

impl PartialEq for Treepath {
    fn eq(&self, other: &Self) -> bool {
        self.indices_in_parent() == other.indices_in_parent()
            && self.tree_at_start() == other.tree_at_start()
    }
}

impl Eq for Treepath {}

impl PartialOrd for Treepath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Document order of the ends, assuming both treepaths share the same root.
impl Ord for Treepath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.indices_in_parent().cmp(&other.indices_in_parent())
    }
}

impl Debug for Treepath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Treepath{:?} -> {}", self.indices_in_parent(), self.tree_at_end.kind())
    }
}
