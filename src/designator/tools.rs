//! Helpers shared by identifier resolution, tag enhancement and Opus post-processing.

use crate::designator::tag::Tag;
use crate::error::TreeError;
use crate::node_kind::{NodeKind, TagBehavior};
use crate::traversal::MirroredPostorder;
use crate::tree::SyntacticTree;
use crate::treepath::Treepath;
use std::collections::{BTreeSet, HashSet};

/// Kinds that may carry an identifier: everything tag filtering looks at.
pub fn is_identifier_bearing(tree: &SyntacticTree) -> bool {
    tree.kind().tag_behavior() != TagBehavior::NonTraversable
}

/// Structure inside which identifiers are looked for when checking collisions.
pub fn is_level_like(tree: &SyntacticTree) -> bool {
    tree.is_one_of(&[NodeKind::Level, NodeKind::Novella, NodeKind::Opus])
}

pub fn collision_traversal() -> MirroredPostorder<fn(&SyntacticTree) -> bool> {
    MirroredPostorder::new(is_level_like as fn(&SyntacticTree) -> bool)
}

pub fn find_title_tree(level: &SyntacticTree) -> Option<&SyntacticTree> {
    if level.is(NodeKind::Level) {
        level.children().iter().find(|child| child.is(NodeKind::LevelTitle))
    } else {
        None
    }
}

/// Slug of a title, like `chapterOne` for "Chapter one". Empty when nothing usable remains.
pub fn to_implicit_identifier(tree: &SyntacticTree) -> String {
    let mut text = String::new();
    textualize(tree, &mut text);
    clean_for_identifier(&text)
}

/// Tags derived from a title, one per `_`-separated part of its slug.
pub fn to_implicit_tag_set(tree: &SyntacticTree) -> BTreeSet<Tag> {
    Tag::to_tag_set(to_implicit_identifier(tree).split('_'))
}

fn textualize(tree: &SyntacticTree, buffer: &mut String) {
    match tree.kind() {
        NodeKind::Word | NodeKind::WordAfterCircumflexAccent | NodeKind::UrlLiteral => {
            push_word(buffer, tree.text().unwrap_or_default())
        }
        NodeKind::PunctuationSign => buffer.push_str(tree.text().unwrap_or_default()),
        NodeKind::BlockInsideDoubleQuotes => {
            push_word(buffer, "_");
            for child in tree.children() {
                textualize(child, buffer);
            }
            buffer.push('_');
        }
        kind if kind.is_separator() => {}
        _ => {
            for child in tree.children() {
                textualize(child, buffer);
            }
        }
    }
}

fn push_word(buffer: &mut String, word: &str) {
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(word);
}

fn clean_for_identifier(text: &str) -> String {
    let mut s = replace_punctuation_runs(text);
    s = s.chars().map(strip_diacritic).collect();
    s = collapse_all(&s);

    s = s.replace(" _", "_").replace("_ ", "_");
    s = camel_case(&s);

    s = s.trim_start_matches('-').trim_start_matches('_').to_string();
    s = s.trim_end_matches('-').trim_end_matches('_').to_string();

    s = collapse_all(&s);
    s = s.replace("-_", "_").replace("_-", "_");

    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn replace_punctuation_runs(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if matches!(c, ',' | '.' | ';' | '?' | '!' | ':') {
            if !in_run {
                result.push('_');
            }
            in_run = true;
        } else {
            result.push(c);
            in_run = false;
        }
    }
    result
}

fn collapse_all(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, ' ' | '-' | '_') && result.ends_with(c) {
            continue;
        }
        result.push(c);
    }
    result
}

/// Every space followed by a letter or digit goes away, uppercasing that character.
fn camel_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(next) if c == ' ' && next.is_ascii_alphanumeric() => {
                result.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => result.push(c),
        }
    }
    result
}

fn strip_diacritic(c: char) -> String {
    let stripped = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' => "c",
        'Ç' => "C",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ñ' => "n",
        'Ñ' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'ß' => "ss",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        _ => return c.to_string(),
    };
    stripped.to_string()
}

// === Collisions ===

/// Identifier texts seen more than once after merging several documents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdentifierCollisions {
    implicit: HashSet<String>,
    explicit: HashSet<String>,
}

impl IdentifierCollisions {
    pub fn implicit_identifier_collides(&self, tree: &SyntacticTree) -> bool {
        tree.text().is_some_and(|text| self.implicit.contains(text))
    }

    pub fn explicit_identifier_collides(&self, tree: &SyntacticTree) -> bool {
        tree.text().is_some_and(|text| self.explicit.contains(text))
    }

    pub fn is_empty(&self) -> bool {
        self.implicit.is_empty() && self.explicit.is_empty()
    }
}

pub fn find_collisions(treepath: &Treepath) -> IdentifierCollisions {
    let traversal = collision_traversal();
    let mut seen_implicit = HashSet::new();
    let mut seen_explicit = HashSet::new();
    let mut collisions = IdentifierCollisions::default();

    let mut current = Some(traversal.first(&treepath.start()));
    while let Some(treepath) = current {
        let tree = treepath.tree_at_end();
        if let Some(text) = tree.text() {
            if tree.is(NodeKind::ImplicitIdentifier) && !seen_implicit.insert(text.to_string()) {
                collisions.implicit.insert(text.to_string());
            }
            if tree.is(NodeKind::ExplicitIdentifier) && !seen_explicit.insert(text.to_string()) {
                collisions.explicit.insert(text.to_string());
            }
        }
        current = traversal.next(&treepath);
    }
    collisions
}

pub fn remove_colliding_implicit_identifiers(
    collisions: &IdentifierCollisions,
    treepath: &Treepath,
) -> Result<Treepath, TreeError> {
    rewrite_children(treepath, |parent, index| {
        let child = &parent.tree_at_end().children()[index];
        if child.is(NodeKind::ImplicitIdentifier) && collisions.implicit_identifier_collides(child) {
            Ok(Some(parent.child(index)?.remove_end()?))
        } else {
            Ok(None)
        }
    })
}

pub fn tag_colliding_explicit_identifiers(
    collisions: &IdentifierCollisions,
    treepath: &Treepath,
) -> Result<Treepath, TreeError> {
    rewrite_children(treepath, |parent, index| {
        let child = &parent.tree_at_end().children()[index];
        if child.is(NodeKind::ExplicitIdentifier) && collisions.explicit_identifier_collides(child)
        {
            let renamed = SyntacticTree::with_text(
                NodeKind::CollidingExplicitIdentifier,
                child.text().unwrap_or_default(),
            );
            let renamed = match child.location() {
                Some(location) => renamed.located(location.clone()),
                None => renamed,
            };
            Ok(parent.child(index)?.replace_end(renamed).previous().cloned())
        } else {
            Ok(None)
        }
    })
}

/// Visits every node in mirrored post-order, offering each of its children, last to first, to
/// `rewrite`. A rewrite returns the updated parent, so children with lower indices stay valid.
fn rewrite_children<F>(treepath: &Treepath, rewrite: F) -> Result<Treepath, TreeError>
where
    F: Fn(&Treepath, usize) -> Result<Option<Treepath>, TreeError>,
{
    let traversal = collision_traversal();
    let mut current = traversal.first(&treepath.start());
    loop {
        for index in (0..current.tree_at_end().child_count()).rev() {
            if let Some(updated) = rewrite(&current, index)? {
                current = updated;
            }
        }
        match traversal.next(&current) {
            Some(next) => current = next,
            None => return Ok(current),
        }
    }
}
