use crate::node_kind::NodeKind;
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::debug;

const CONTAINERS: [NodeKind; 5] = [
    NodeKind::Novella,
    NodeKind::Opus,
    NodeKind::Level,
    NodeKind::LevelIntroducer,
    NodeKind::ParagraphsInsideAngledBracketPairs,
];

/// Wraps each run of contiguous `---` paragraphs into one `_LIST_WITH_TRIPLE_HYPHEN`.
pub fn rehierarchize_lists(treepath: &Treepath) -> Treepath {
    let mut wrapped = 0;
    let tree = rehierarchize(treepath.tree_at_end(), &mut wrapped);
    debug!("Wrapped {} list(s)", wrapped);
    treepath.replace_end(tree)
}

fn rehierarchize(tree: &SyntacticTree, wrapped: &mut usize) -> SyntacticTree {
    if !tree.is_one_of(&CONTAINERS) {
        return tree.clone();
    }

    let mut children = Vec::with_capacity(tree.child_count());
    let mut run: Vec<SyntacticTree> = Vec::new();
    for child in tree.children() {
        if child.is(NodeKind::ParagraphAsListItemWithTripleHyphen) {
            run.push(child.clone());
        } else {
            flush(&mut run, &mut children, wrapped);
            children.push(rehierarchize(child, wrapped));
        }
    }
    flush(&mut run, &mut children, wrapped);
    tree.adopt(children)
}

fn flush(run: &mut Vec<SyntacticTree>, children: &mut Vec<SyntacticTree>, wrapped: &mut usize) {
    if !run.is_empty() {
        children.push(SyntacticTree::new(
            NodeKind::ListWithTripleHyphen,
            std::mem::take(run),
        ));
        *wrapped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_kind::NodeKind::*;
    use crate::tree::{leaf, tree};

    fn item(word: &str) -> SyntacticTree {
        tree(ParagraphAsListItemWithTripleHyphen, [leaf(Word, word)])
    }

    fn paragraph(word: &str) -> SyntacticTree {
        tree(ParagraphRegular, [leaf(Word, word)])
    }

    #[test]
    fn test_one_wrapper_per_contiguous_run() {
        let novella = tree(
            Novella,
            [item("a"), item("b"), paragraph("p"), item("c")],
        );
        let result = rehierarchize_lists(&Treepath::new(novella));
        assert_eq!(
            result.tree_at_end(),
            &tree(
                Novella,
                [
                    tree(ListWithTripleHyphen, [item("a"), item("b")]),
                    paragraph("p"),
                    tree(ListWithTripleHyphen, [item("c")]),
                ]
            )
        );
    }

    #[test]
    fn test_recurses_into_levels_only() {
        let novella = tree(
            Novella,
            [
                tree(Level, [tree(LevelTitle, [leaf(Word, "t")]), item("a")]),
                tree(BlockInsideDoubleQuotes, [item("untouched")]),
            ],
        );
        let result = rehierarchize_lists(&Treepath::new(novella));
        let level = &result.tree_at_end().children()[0];
        assert_eq!(level.children()[1], tree(ListWithTripleHyphen, [item("a")]));
        assert_eq!(
            result.tree_at_end().children()[1],
            tree(BlockInsideDoubleQuotes, [item("untouched")])
        );
    }
}
