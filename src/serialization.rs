use crate::node_kind::NodeKind;
use crate::problem::Location;
use crate::tree::SyntacticTree;
use serde::{Serialize, Serializer};

/// Plain-data form of a [`SyntacticTree`], as written to JSON or YAML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Value {
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Value>,
}

pub(crate) fn to_value(tree: &SyntacticTree) -> Value {
    Value {
        kind: tree.kind(),
        text: tree.text().map(str::to_string),
        location: tree.location().cloned(),
        children: tree.children().iter().map(to_value).collect(),
    }
}

impl Serialize for SyntacticTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_value(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{leaf, tree};

    #[test]
    fn test_tree_to_json() {
        let paragraph = tree(
            NodeKind::ParagraphRegular,
            [leaf(NodeKind::Word, "Hello").located(Location::new("a.novella", 1, 1))],
        );
        let json = serde_json::to_value(&paragraph).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "PARAGRAPH_REGULAR",
                "children": [{
                    "kind": "WORD_",
                    "text": "Hello",
                    "location": {"file_name": "a.novella", "line": 1, "column": 1}
                }]
            })
        );
    }
}
