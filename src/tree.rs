use crate::error::TreeError;
use crate::node_kind::NodeKind;
use crate::problem::Location;
use std::fmt::{Debug, Display};
use std::sync::Arc;

/// An immutable node of a document.
///
/// Children live behind an `Arc`, so cloning a tree is cheap and an edit only copies the
/// nodes on the way from the edited node up to the root. Equality is structural: kind, text
/// and children, recursively. The location does not take part in it.
#[derive(Clone)]
pub struct SyntacticTree {
    kind: NodeKind,
    text: Option<Arc<str>>,
    children: Arc<[SyntacticTree]>,
    location: Option<Arc<Location>>,
}

/// Shorthand for a node with children.
pub fn tree(kind: NodeKind, children: impl IntoIterator<Item = SyntacticTree>) -> SyntacticTree {
    SyntacticTree::new(kind, children.into_iter().collect())
}

/// Shorthand for a node holding some text.
pub fn leaf(kind: NodeKind, text: impl AsRef<str>) -> SyntacticTree {
    SyntacticTree::with_text(kind, text)
}

impl SyntacticTree {
    pub fn new(kind: NodeKind, children: Vec<SyntacticTree>) -> Self {
        SyntacticTree {
            kind,
            text: None,
            children: children.into(),
            location: None,
        }
    }

    pub fn with_text(kind: NodeKind, text: impl AsRef<str>) -> Self {
        SyntacticTree {
            kind,
            text: Some(Arc::from(text.as_ref())),
            children: Arc::from(Vec::new()),
            location: None,
        }
    }

    pub fn located(mut self, location: Location) -> Self {
        self.location = Some(Arc::new(location));
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_deref()
    }

    pub fn children(&self) -> &[SyntacticTree] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&SyntacticTree> {
        self.children.get(index)
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    pub fn is_one_of(&self, kinds: &[NodeKind]) -> bool {
        kinds.contains(&self.kind)
    }

    /// Text of the first child of the given kind.
    pub fn text_of_child(&self, kind: NodeKind) -> Option<&str> {
        self.children
            .iter()
            .find(|child| child.is(kind))
            .and_then(SyntacticTree::text)
    }

    /// True if both trees are the very same allocation, not just equal.
    pub fn ptr_eq(&self, other: &SyntacticTree) -> bool {
        self.kind == other.kind
            && Arc::ptr_eq(&self.children, &other.children)
            && match (&self.text, &other.text) {
                (Some(left), Some(right)) => Arc::ptr_eq(left, right),
                (None, None) => true,
                _ => false,
            }
    }

    /// Same kind, text and location, with other children.
    pub fn adopt(&self, children: Vec<SyntacticTree>) -> Self {
        SyntacticTree {
            kind: self.kind,
            text: self.text.clone(),
            children: children.into(),
            location: self.location.clone(),
        }
    }

    pub fn add_first(&self, child: SyntacticTree) -> Self {
        let mut children = Vec::with_capacity(self.children.len() + 1);
        children.push(child);
        children.extend(self.children.iter().cloned());
        self.adopt(children)
    }

    pub fn add_last(&self, child: SyntacticTree) -> Self {
        let mut children = self.children.to_vec();
        children.push(child);
        self.adopt(children)
    }

    pub fn add_at(&self, index: usize, child: SyntacticTree) -> Result<Self, TreeError> {
        if index > self.children.len() {
            return Err(self.out_of_bounds(index));
        }
        let mut children = self.children.to_vec();
        children.insert(index, child);
        Ok(self.adopt(children))
    }

    pub fn replace(&self, index: usize, child: SyntacticTree) -> Result<Self, TreeError> {
        if index >= self.children.len() {
            return Err(self.out_of_bounds(index));
        }
        let mut children = self.children.to_vec();
        children[index] = child;
        Ok(self.adopt(children))
    }

    pub fn remove(&self, index: usize) -> Result<Self, TreeError> {
        if index >= self.children.len() {
            return Err(self.out_of_bounds(index));
        }
        let mut children = self.children.to_vec();
        children.remove(index);
        Ok(self.adopt(children))
    }

    fn out_of_bounds(&self, index: usize) -> TreeError {
        TreeError::IndexOutOfBounds {
            index,
            child_count: self.children.len(),
        }
    }

    /// Number of `WORD_` nodes in the whole tree.
    pub fn word_count(&self) -> usize {
        let own = usize::from(self.is(NodeKind::Word));
        own + self.children.iter().map(SyntacticTree::word_count).sum::<usize>()
    }

    /// Renders as a parenthesized, single-line dump like `(NOVELLA (WORD_ "x"))`.
    pub fn to_string_tree(&self) -> String {
        let mut buffer = String::new();
        self.write_tree(&mut buffer);
        buffer
    }

    fn write_tree(&self, buffer: &mut String) {
        let has_content = self.text.is_some() || !self.children.is_empty();
        if has_content {
            buffer.push('(');
        }
        buffer.push_str(self.kind.name());
        if let Some(text) = &self.text {
            buffer.push_str(&format!(" {:?}", text));
        }
        for child in self.children.iter() {
            buffer.push(' ');
            child.write_tree(buffer);
        }
        if has_content {
            buffer.push(')');
        }
    }
}

impl PartialEq for SyntacticTree {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text && self.children == other.children
    }
}

impl Eq for SyntacticTree {}

impl Debug for SyntacticTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_tree())
    }
}

impl Display for SyntacticTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_tree())
    }
}
