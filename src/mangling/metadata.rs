use crate::designator::Tag;
use crate::node_kind::NodeKind;
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;

/// Adds `_META(_WORD_COUNT(n), _TAGS(_EXPLICIT_TAG...))` as first child of the root.
///
/// `tags` are the explicit tags of the document before any filtering.
pub fn add_metadata(treepath: &Treepath, tags: &[Tag]) -> Treepath {
    let root = treepath.tree_at_start();
    let tags = tags
        .iter()
        .map(|tag| tag.as_syntactic_tree(NodeKind::ExplicitTag))
        .collect();
    let meta = SyntacticTree::new(
        NodeKind::Meta,
        vec![
            SyntacticTree::with_text(NodeKind::WordCount, root.word_count().to_string()),
            SyntacticTree::new(NodeKind::Tags, tags),
        ],
    );
    treepath.start().replace_end(root.add_first(meta))
}
