use crate::error::TreeError;
use crate::node_kind::NodeKind;
use crate::traversal::{next, next_up};
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use log::debug;

const PARAGRAPHS_CONTAINING_URL: [NodeKind; 4] = [
    NodeKind::ParagraphRegular,
    NodeKind::ParagraphAsListItemWithTripleHyphen,
    NodeKind::EmbeddedListItemWithHyphen,
    NodeKind::EmbeddedListItemNumbered,
];

/// Leaves the walk never descends into.
const SKIPPED: [NodeKind; 6] = [
    NodeKind::Word,
    NodeKind::PunctuationSign,
    NodeKind::Tag,
    NodeKind::RasterImage,
    NodeKind::VectorImage,
    NodeKind::LevelTitle,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OutsideParagraph,
    InsideParagraph,
    CandidateUrlName,
    Url,
}

/// Turns each `URL_LITERAL` into `_URL`, taking in the quoted block right before it (only
/// separators in between) as the name of the link.
pub fn fix_named_urls(treepath: &Treepath) -> Result<Treepath, TreeError> {
    let mut state = State::OutsideParagraph;
    let mut name: Option<Treepath> = None;
    let mut paragraph: Option<Treepath> = None;
    let mut url_count = 0;

    let mut result = treepath.clone();
    let mut current = Some(treepath.clone());

    while let Some(mut treepath) = current {
        let kind = treepath.tree_at_end().kind();

        state = match state {
            State::OutsideParagraph if PARAGRAPHS_CONTAINING_URL.contains(&kind) => {
                paragraph = Some(treepath.clone());
                State::InsideParagraph
            }
            State::OutsideParagraph => State::OutsideParagraph,
            State::InsideParagraph if kind == NodeKind::BlockInsideDoubleQuotes => {
                name = Some(treepath.clone());
                State::CandidateUrlName
            }
            State::InsideParagraph | State::CandidateUrlName if kind == NodeKind::UrlLiteral => {
                State::Url
            }
            State::InsideParagraph => State::InsideParagraph,
            State::CandidateUrlName if kind.is_separator() => State::CandidateUrlName,
            State::CandidateUrlName => {
                name = None;
                State::InsideParagraph
            }
            State::Url => State::Url,
        };

        if state == State::Url {
            if let Some(name_treepath) = &name {
                treepath = treepath.remove_subtree(name_treepath)?;
            }
            treepath = replace_by_external_link(&treepath, name.take().as_ref());
            url_count += 1;
            state = State::InsideParagraph;
        }

        result = treepath.clone();
        current = if state == State::CandidateUrlName
            || treepath.tree_at_end().is(NodeKind::Url)
            || SKIPPED.contains(&kind)
        {
            next_up(&treepath)
        } else {
            next(&treepath)
        };

        // Paragraphs inside angled brackets are deeper than what they contain, so both
        // directions need checking.
        if let (Some(next_treepath), Some(paragraph_treepath)) = (&current, &paragraph) {
            let left_paragraph = if paragraph_treepath.length() <= next_treepath.length() {
                !paragraph_treepath.has_same_starting_indices_as(next_treepath)
            } else {
                !next_treepath.has_same_starting_indices_as(paragraph_treepath)
            };
            if left_paragraph {
                state = State::OutsideParagraph;
                paragraph = None;
                name = None;
            }
        }
    }

    debug!("Fixed {} URL(s)", url_count);
    Ok(result.start())
}

fn replace_by_external_link(url_literal: &Treepath, name: Option<&Treepath>) -> Treepath {
    let mut children = Vec::with_capacity(2);
    if let Some(name) = name {
        children.push(name.tree_at_end().clone());
    }
    children.push(url_literal.tree_at_end().clone());
    url_literal.replace_end(SyntacticTree::new(NodeKind::Url, children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_kind::NodeKind::*;
    use crate::tree::{leaf, tree};

    fn url() -> SyntacticTree {
        leaf(UrlLiteral, "http://novelang.org")
    }

    fn quoted(word: &str) -> SyntacticTree {
        tree(BlockInsideDoubleQuotes, [leaf(Word, word)])
    }

    fn fix(paragraph_children: Vec<SyntacticTree>) -> SyntacticTree {
        let novella = tree(Novella, [tree(ParagraphRegular, paragraph_children)]);
        fix_named_urls(&Treepath::new(novella)).unwrap().tree_at_end().clone()
    }

    #[test]
    fn test_bare_url() {
        assert_eq!(
            fix(vec![leaf(Word, "see"), url()]),
            tree(
                Novella,
                [tree(ParagraphRegular, [leaf(Word, "see"), tree(Url, [url()])])]
            )
        );
    }

    #[test]
    fn test_named_url_across_line_break() {
        assert_eq!(
            fix(vec![quoted("name"), tree(LineBreak, []), url()]),
            tree(
                Novella,
                [tree(
                    ParagraphRegular,
                    [tree(LineBreak, []), tree(Url, [quoted("name"), url()])]
                )]
            )
        );
    }

    #[test]
    fn test_word_between_name_and_url_breaks_the_name() {
        assert_eq!(
            fix(vec![quoted("name"), leaf(Word, "w"), url()]),
            tree(
                Novella,
                [tree(
                    ParagraphRegular,
                    [quoted("name"), leaf(Word, "w"), tree(Url, [url()])]
                )]
            )
        );
    }

    #[test]
    fn test_name_does_not_cross_paragraphs() {
        let novella = tree(
            Novella,
            [
                tree(ParagraphRegular, [quoted("name")]),
                tree(ParagraphRegular, [url()]),
            ],
        );
        let result = fix_named_urls(&Treepath::new(novella)).unwrap();
        assert_eq!(
            result.tree_at_end(),
            &tree(
                Novella,
                [
                    tree(ParagraphRegular, [quoted("name")]),
                    tree(ParagraphRegular, [tree(Url, [url()])]),
                ]
            )
        );
    }

    #[test]
    fn test_two_urls_in_one_paragraph() {
        assert_eq!(
            fix(vec![url(), quoted("n"), url()]),
            tree(
                Novella,
                [tree(
                    ParagraphRegular,
                    [tree(Url, [url()]), tree(Url, [quoted("n"), url()])]
                )]
            )
        );
    }
}
