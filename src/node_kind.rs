use serde::{Serialize, Serializer};
use std::fmt::Display;

/// How a node takes part in tag filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagBehavior {
    /// Kept only when it carries one of the wanted tags. Its content is not inspected.
    Terminal,
    /// Kept when it carries a wanted tag, otherwise kept only if a descendant is.
    Scope,
    /// Kept, with only the descendants that survive filtering.
    Traversable,
    /// Never filtered on its own, kept verbatim when its parent survives.
    NonTraversable,
}

/// The closed set of node kinds a syntactic tree is made of.
///
/// Kinds with a leading underscore in their canonical name are synthetic: the reader never
/// produces them, manglers and commands do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    // == Roots ==
    /// Root of an assembled book.
    Opus,
    /// Root of one source file.
    Novella,

    // == Paragraphs ==
    ParagraphRegular,
    /// A paragraph starting with `---`.
    ParagraphAsListItemWithTripleHyphen,
    /// Paragraphs enclosed between `<<<` and `>>>` lines.
    ParagraphsInsideAngledBracketPairs,

    // == Levels, as read ==
    LevelIntroducer,
    /// The `==` part of a level introducer, its text length minus one gives the depth.
    LevelIntroducerIndent,
    LevelTitle,

    // == Inline content ==
    Word,
    WordAfterCircumflexAccent,
    PunctuationSign,
    BlockInsideDoubleQuotes,
    UrlLiteral,
    /// `@name`, the text is the name.
    Tag,
    /// `\\segment`, the text is the identifier as written.
    AbsoluteIdentifier,
    /// `\segment`, the text is the identifier as written.
    RelativeIdentifier,
    EmbeddedListItemWithHyphen,
    EmbeddedListItemNumbered,
    RasterImage,
    VectorImage,
    ResourceLocation,

    // == Separators ==
    Whitespace,
    LineBreak,

    // == Commands ==
    CommandInsert,
    CommandInsertRecurse,
    CommandInsertSort,
    CommandInsertCreateLevel,
    CommandInsertNoHead,
    CommandInsertLevelAbove,
    CommandInsertStyle,
    CommandMapstylesheet,
    CommandMapstylesheetAssignment,

    // == Synthetic ==
    Level,
    Style,
    Url,
    Placeholder,
    ListWithTripleHyphen,
    EmbeddedListWithHyphen,
    EmbeddedListWithNumberSign,
    EmbeddedListItem,
    ImplicitIdentifier,
    ExplicitIdentifier,
    CollidingExplicitIdentifier,
    ImplicitTag,
    ExplicitTag,
    PromotedTag,
    Meta,
    WordCount,
    Tags,
}

impl NodeKind {
    /// Canonical name, as it appears in tree dumps and serialized output.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Opus => "OPUS",
            NodeKind::Novella => "NOVELLA",
            NodeKind::ParagraphRegular => "PARAGRAPH_REGULAR",
            NodeKind::ParagraphAsListItemWithTripleHyphen => {
                "PARAGRAPH_AS_LIST_ITEM_WITH_TRIPLE_HYPHEN_"
            }
            NodeKind::ParagraphsInsideAngledBracketPairs => "PARAGRAPHS_INSIDE_ANGLED_BRACKET_PAIRS",
            NodeKind::LevelIntroducer => "LEVEL_INTRODUCER_",
            NodeKind::LevelIntroducerIndent => "LEVEL_INTRODUCER_INDENT_",
            NodeKind::LevelTitle => "LEVEL_TITLE",
            NodeKind::Word => "WORD_",
            NodeKind::WordAfterCircumflexAccent => "WORD_AFTER_CIRCUMFLEX_ACCENT",
            NodeKind::PunctuationSign => "PUNCTUATION_SIGN",
            NodeKind::BlockInsideDoubleQuotes => "BLOCK_INSIDE_DOUBLE_QUOTES",
            NodeKind::UrlLiteral => "URL_LITERAL",
            NodeKind::Tag => "TAG",
            NodeKind::AbsoluteIdentifier => "ABSOLUTE_IDENTIFIER",
            NodeKind::RelativeIdentifier => "RELATIVE_IDENTIFIER",
            NodeKind::EmbeddedListItemWithHyphen => "EMBEDDED_LIST_ITEM_WITH_HYPHEN_",
            NodeKind::EmbeddedListItemNumbered => "EMBEDDED_LIST_ITEM_NUMBERED_",
            NodeKind::RasterImage => "RASTER_IMAGE",
            NodeKind::VectorImage => "VECTOR_IMAGE",
            NodeKind::ResourceLocation => "RESOURCE_LOCATION",
            NodeKind::Whitespace => "WHITESPACE_",
            NodeKind::LineBreak => "LINE_BREAK_",
            NodeKind::CommandInsert => "COMMAND_INSERT_",
            NodeKind::CommandInsertRecurse => "COMMAND_INSERT_RECURSE_",
            NodeKind::CommandInsertSort => "COMMAND_INSERT_SORT_",
            NodeKind::CommandInsertCreateLevel => "COMMAND_INSERT_CREATELEVEL_",
            NodeKind::CommandInsertNoHead => "COMMAND_INSERT_NOHEAD_",
            NodeKind::CommandInsertLevelAbove => "COMMAND_INSERT_LEVELABOVE_",
            NodeKind::CommandInsertStyle => "COMMAND_INSERT_STYLE_",
            NodeKind::CommandMapstylesheet => "COMMAND_MAPSTYLESHEET_",
            NodeKind::CommandMapstylesheetAssignment => "COMMAND_MAPSTYLESHEET_ASSIGNMENT_",
            NodeKind::Level => "_LEVEL",
            NodeKind::Style => "_STYLE",
            NodeKind::Url => "_URL",
            NodeKind::Placeholder => "_PLACEHOLDER_",
            NodeKind::ListWithTripleHyphen => "_LIST_WITH_TRIPLE_HYPHEN",
            NodeKind::EmbeddedListWithHyphen => "_EMBEDDED_LIST_WITH_HYPHEN",
            NodeKind::EmbeddedListWithNumberSign => "_EMBEDDED_LIST_WITH_NUMBER_SIGN",
            NodeKind::EmbeddedListItem => "_EMBEDDED_LIST_ITEM",
            NodeKind::ImplicitIdentifier => "_IMPLICIT_IDENTIFIER",
            NodeKind::ExplicitIdentifier => "_EXPLICIT_IDENTIFIER",
            NodeKind::CollidingExplicitIdentifier => "_COLLIDING_EXPLICIT_IDENTIFIER",
            NodeKind::ImplicitTag => "_IMPLICIT_TAG",
            NodeKind::ExplicitTag => "_EXPLICIT_TAG",
            NodeKind::PromotedTag => "_PROMOTED_TAG",
            NodeKind::Meta => "_META",
            NodeKind::WordCount => "_WORD_COUNT",
            NodeKind::Tags => "_TAGS",
        }
    }

    pub fn tag_behavior(self) -> TagBehavior {
        match self {
            NodeKind::ParagraphsInsideAngledBracketPairs | NodeKind::Level => TagBehavior::Scope,
            NodeKind::Opus | NodeKind::Novella | NodeKind::ListWithTripleHyphen => {
                TagBehavior::Traversable
            }
            NodeKind::ParagraphRegular | NodeKind::ParagraphAsListItemWithTripleHyphen => {
                TagBehavior::Terminal
            }
            _ => TagBehavior::NonTraversable,
        }
    }

    pub fn is_level(self) -> bool {
        self == NodeKind::Level
    }

    /// Nodes standing for running text, as opposed to structure.
    pub fn is_paragraphoid(self) -> bool {
        matches!(
            self,
            NodeKind::ParagraphRegular
                | NodeKind::ParagraphAsListItemWithTripleHyphen
                | NodeKind::ParagraphsInsideAngledBracketPairs
                | NodeKind::ListWithTripleHyphen
                | NodeKind::EmbeddedListWithHyphen
                | NodeKind::EmbeddedListWithNumberSign
        )
    }

    pub fn is_separator(self) -> bool {
        matches!(self, NodeKind::Whitespace | NodeKind::LineBreak)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for NodeKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_behaviors() {
        assert_eq!(NodeKind::Level.tag_behavior(), TagBehavior::Scope);
        assert_eq!(NodeKind::Novella.tag_behavior(), TagBehavior::Traversable);
        assert_eq!(NodeKind::ParagraphRegular.tag_behavior(), TagBehavior::Terminal);
        assert_eq!(NodeKind::Word.tag_behavior(), TagBehavior::NonTraversable);
        assert_eq!(NodeKind::ImplicitTag.tag_behavior(), TagBehavior::NonTraversable);
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(NodeKind::Level.to_string(), "_LEVEL");
        assert_eq!(NodeKind::Word.to_string(), "WORD_");
        assert_eq!(
            serde_json::to_string(&NodeKind::ParagraphRegular).unwrap(),
            "\"PARAGRAPH_REGULAR\""
        );
    }
}
