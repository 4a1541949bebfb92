use crate::error::DesignatorError;
use crate::node_kind::NodeKind;
use crate::tree::SyntacticTree;
use std::collections::BTreeSet;
use std::fmt::Display;

/// A label attached to a subtree, driving tag filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Result<Self, DesignatorError> {
        let name = name.into();
        if name.trim().is_empty() {
            Err(DesignatorError::BlankTag)
        } else {
            Ok(Tag { name })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the tag is written in a document.
    pub fn source_representation(&self) -> String {
        format!("@{}", self.name)
    }

    pub fn as_syntactic_tree(&self, kind: NodeKind) -> SyntacticTree {
        SyntacticTree::with_text(kind, &self.name)
    }

    /// Builds a tag set, skipping blank names.
    pub fn to_tag_set<I, S>(names: I) -> BTreeSet<Tag>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| Tag::new(name.as_ref()).ok())
            .collect()
    }

    pub fn contains(tags: &BTreeSet<Tag>, name: &str) -> bool {
        tags.iter().any(|tag| tag.name == name)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
