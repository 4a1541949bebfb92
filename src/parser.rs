use crate::error::ParserError;
use crate::lexer::{Lexer, Token, TokenType};
use crate::node_kind::NodeKind;
use crate::problem::Location;
use crate::tree::{leaf, tree, SyntacticTree};
use crate::utils::get_line_and_column;
use miette::NamedSource;
use std::sync::Arc;

/// Turns source text into the raw trees the manglers work on.
///
/// Implementations must be shareable between the worker threads loading files.
pub trait SourceParser: Send + Sync {
    /// Reads one Novella. The root is a `NOVELLA` tree.
    fn parse(&self, source: &str, file_name: &str) -> Result<SyntacticTree, ParserError>;

    /// Reads the commands of an Opus. The root is an `OPUS` tree holding `COMMAND_*` trees.
    fn parse_opus(&self, source: &str, file_name: &str) -> Result<SyntacticTree, ParserError>;
}

/// The built-in reader. It covers paragraphs, levels, lists, quotes, URLs, images, tags and
/// identifiers, plus the `insert` and `mapstylesheet` commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupParser;

impl SourceParser for MarkupParser {
    fn parse(&self, source: &str, file_name: &str) -> Result<SyntacticTree, ParserError> {
        Parser::new_with_name(source, file_name.to_string()).parse_novella()
    }

    fn parse_opus(&self, source: &str, file_name: &str) -> Result<SyntacticTree, ParserError> {
        CommandReader::new(source, file_name).read_opus()
    }
}

const RASTER_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
const VECTOR_EXTENSIONS: [&str; 1] = ["svg"];

/// A recursive descent parser for the markup, built according to the grammar in the doc
/// comments of each method.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    tokens: Vec<Token>,
    position: usize,
    source_text: &'a str,
    file_name: String,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.novella".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let source = Arc::new(NamedSource::new(name.clone(), source_text.to_string()));
        let mut lexer = Lexer::new(source_text);
        // Whitespace is kept: it tells the indentation of embedded list items.
        let tokens: Vec<Token> = lexer
            .lex()
            .into_iter()
            .filter(|t| !matches!(t.ttype, TokenType::Comment(_)))
            .collect();

        Self {
            source,
            tokens,
            position: 0,
            source_text,
            file_name: name,
        }
    }

    // === Blocks ===

    /// Novella ::= { Separator } { Block { Separator } } Eof
    /// Block ::= LevelIntroducer | AngledBlock | Paragraph
    pub fn parse_novella(&mut self) -> Result<SyntacticTree, ParserError> {
        let mut blocks = Vec::new();
        loop {
            self.skip_separators();
            let token = self.current_token().clone();
            match token.ttype {
                TokenType::Eof => break,
                TokenType::LevelIndent(_) => blocks.push(self.parse_level_introducer()?),
                TokenType::AngledOpen => blocks.push(self.parse_angled_block()?),
                TokenType::AngledClose => return Err(self.unbalanced(&token)),
                _ => blocks.push(self.parse_paragraph()?),
            }
        }
        Ok(SyntacticTree::new(NodeKind::Novella, blocks).located(Location::of_file(&self.file_name)))
    }

    /// LevelIntroducer ::= LevelIndent { Inline } { LineBreak Designator { Designator } }
    ///
    /// Designators on the title line go with the ones of the following lines, after the title.
    fn parse_level_introducer(&mut self) -> Result<SyntacticTree, ParserError> {
        let start = self.current_token().clone();
        let TokenType::LevelIndent(indent) = &start.ttype else {
            return self.err_unexpected("level introducer");
        };
        let mut children = vec![leaf(NodeKind::LevelIntroducerIndent, indent)];
        self.advance();

        let mut title = Vec::new();
        let mut designators = Vec::new();
        while !self.at_line_end() {
            if self.is_designator() {
                designators.push(self.parse_designator()?);
            } else {
                self.parse_inline(&mut title)?;
            }
        }
        while !self.at_paragraph_end() {
            self.advance(); // Line break inside the introducer
            while !self.at_line_end() {
                if self.match_whitespace() {
                    continue;
                }
                if !self.is_designator() {
                    return self.err_unexpected("tag or identifier");
                }
                designators.push(self.parse_designator()?);
            }
        }

        if !title.is_empty() {
            children.push(SyntacticTree::new(NodeKind::LevelTitle, title));
        }
        children.extend(designators);
        Ok(self.located(SyntacticTree::new(NodeKind::LevelIntroducer, children), &start))
    }

    /// AngledBlock ::= "<<<" { Tag } LineBreak { Separator | Block } ">>>"
    fn parse_angled_block(&mut self) -> Result<SyntacticTree, ParserError> {
        let open = self.current_token().clone();
        self.advance();
        let mut children = Vec::new();
        while !self.at_line_end() {
            if self.match_whitespace() {
                continue;
            }
            match self.current_token().ttype.clone() {
                TokenType::Tag(name) => {
                    let token = self.current_token().clone();
                    children.push(self.located(leaf(NodeKind::Tag, name), &token));
                    self.advance();
                }
                _ => return self.err_unexpected("tag or line break"),
            }
        }

        loop {
            self.skip_separators();
            let token = self.current_token().clone();
            match token.ttype {
                TokenType::AngledClose => {
                    self.advance();
                    break;
                }
                TokenType::Eof => return Err(self.unbalanced(&open)),
                TokenType::AngledOpen => children.push(self.parse_angled_block()?),
                TokenType::LevelIndent(_) => return self.err_unexpected("paragraph"),
                _ => children.push(self.parse_paragraph()?),
            }
        }
        Ok(self.located(
            SyntacticTree::new(NodeKind::ParagraphsInsideAngledBracketPairs, children),
            &open,
        ))
    }

    /// Paragraph ::= [ "---" ] Line { LineBreak Line }
    ///
    /// Line breaks inside a paragraph are kept, a blank line ends it.
    fn parse_paragraph(&mut self) -> Result<SyntacticTree, ParserError> {
        let start = self.current_token().clone();
        let kind = if self.match_token(TokenType::TripleHyphen) {
            NodeKind::ParagraphAsListItemWithTripleHyphen
        } else {
            NodeKind::ParagraphRegular
        };
        let mut children = Vec::new();
        loop {
            self.parse_line(&mut children)?;
            if self.at_paragraph_end() {
                break;
            }
            self.advance();
            children.push(SyntacticTree::new(NodeKind::LineBreak, Vec::new()));
        }
        Ok(self.located(SyntacticTree::new(kind, children), &start))
    }

    /// Line ::= [ Whitespace ] ( EmbeddedItem | { Inline } )
    /// EmbeddedItem ::= ( "-" | "#" ) { Inline }
    ///
    /// Indentation is only kept in front of embedded list items.
    fn parse_line(&mut self, children: &mut Vec<SyntacticTree>) -> Result<(), ParserError> {
        let indentation = match &self.current_token().ttype {
            TokenType::Whitespace(whitespace) => {
                let whitespace = whitespace.clone();
                self.advance();
                Some(whitespace)
            }
            _ => None,
        };

        let item_kind = match self.current_token().ttype {
            TokenType::Hyphen => Some(NodeKind::EmbeddedListItemWithHyphen),
            TokenType::NumberSign => Some(NodeKind::EmbeddedListItemNumbered),
            _ => None,
        };
        match item_kind {
            Some(item_kind) => {
                let start = self.current_token().clone();
                self.advance();
                if let Some(whitespace) = indentation {
                    children.push(leaf(NodeKind::Whitespace, whitespace));
                }
                let mut item_children = Vec::new();
                while !self.at_line_end() {
                    self.parse_inline(&mut item_children)?;
                }
                children.push(self.located(SyntacticTree::new(item_kind, item_children), &start));
            }
            None => {
                while !self.at_line_end() {
                    self.parse_inline(children)?;
                }
            }
        }
        Ok(())
    }

    // === Inline content ===

    /// Inline ::= Word [ CircumflexWord ] | Punctuation | Url | Image | Quoted | Designator
    fn parse_inline(&mut self, children: &mut Vec<SyntacticTree>) -> Result<(), ParserError> {
        let token = self.current_token().clone();
        let node = match &token.ttype {
            TokenType::Whitespace(_) => {
                self.advance();
                return Ok(());
            }
            TokenType::Word(word) => leaf(NodeKind::Word, word),
            TokenType::WordAfterCircumflex(word) => leaf(NodeKind::WordAfterCircumflexAccent, word),
            TokenType::Punctuation(sign) => leaf(NodeKind::PunctuationSign, sign),
            TokenType::Url(url) => self.located(leaf(NodeKind::UrlLiteral, url), &token),
            TokenType::ResourcePath(path) => self.image(path, &token)?,
            TokenType::DoubleQuote => {
                children.push(self.parse_quoted()?);
                return Ok(());
            }
            TokenType::Tag(_)
            | TokenType::AbsoluteIdentifier(_)
            | TokenType::RelativeIdentifier(_) => {
                children.push(self.parse_designator()?);
                return Ok(());
            }
            _ => return self.err_unexpected("word, punctuation, quote, URL, image or designator"),
        };
        self.advance();
        children.push(node);
        Ok(())
    }

    /// Quoted ::= '"' { Inline | LineBreak } '"'
    fn parse_quoted(&mut self) -> Result<SyntacticTree, ParserError> {
        let open = self.current_token().clone();
        self.advance();
        let mut children = Vec::new();
        loop {
            if self.match_token(TokenType::DoubleQuote) {
                break;
            }
            if self.at_paragraph_end() {
                return Err(ParserError::UnclosedQuotes {
                    src: (*self.source).clone(),
                    span: (open.pos_start, open.pos_end - open.pos_start).into(),
                });
            }
            if self.match_token(TokenType::LineBreak) {
                children.push(SyntacticTree::new(NodeKind::LineBreak, Vec::new()));
                continue;
            }
            self.parse_inline(&mut children)?;
        }
        Ok(SyntacticTree::new(NodeKind::BlockInsideDoubleQuotes, children))
    }

    /// Designator ::= Tag | AbsoluteIdentifier | RelativeIdentifier
    fn parse_designator(&mut self) -> Result<SyntacticTree, ParserError> {
        let token = self.current_token().clone();
        let node = match &token.ttype {
            TokenType::Tag(name) => leaf(NodeKind::Tag, name),
            TokenType::AbsoluteIdentifier(id) => leaf(NodeKind::AbsoluteIdentifier, id),
            TokenType::RelativeIdentifier(id) => leaf(NodeKind::RelativeIdentifier, id),
            _ => return self.err_unexpected("tag or identifier"),
        };
        self.advance();
        Ok(self.located(node, &token))
    }

    fn image(&self, path: &str, token: &Token) -> Result<SyntacticTree, ParserError> {
        let extension = path
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .unwrap_or_default();
        let kind = if RASTER_EXTENSIONS.contains(&extension.as_str()) {
            NodeKind::RasterImage
        } else if VECTOR_EXTENSIONS.contains(&extension.as_str()) {
            NodeKind::VectorImage
        } else {
            return self.err_unexpected("image with a .png, .jpg, .jpeg, .gif or .svg extension");
        };
        Ok(self.located(
            tree(kind, [leaf(NodeKind::ResourceLocation, path)]),
            token,
        ))
    }

    // === Helpers ===

    fn current_token(&self) -> &Token {
        // The lexer always ends with Eof, which is never consumed.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_past_whitespace(&self) -> &TokenType {
        self.tokens[self.position + 1..]
            .iter()
            .map(|token| &token.ttype)
            .find(|ttype| !matches!(ttype, TokenType::Whitespace(_)))
            .unwrap_or(&TokenType::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_whitespace(&mut self) -> bool {
        if matches!(self.current_token().ttype, TokenType::Whitespace(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        std::mem::discriminant(&self.current_token().ttype) == std::mem::discriminant(&ttype)
    }

    fn is_designator(&self) -> bool {
        matches!(
            self.current_token().ttype,
            TokenType::Tag(_) | TokenType::AbsoluteIdentifier(_) | TokenType::RelativeIdentifier(_)
        )
    }

    fn at_line_end(&self) -> bool {
        self.check(TokenType::LineBreak) || self.check(TokenType::Eof)
    }

    /// True on the end of input, or on a line break followed by a blank line or a `>>>`.
    fn at_paragraph_end(&self) -> bool {
        match self.current_token().ttype {
            TokenType::Eof => true,
            TokenType::LineBreak => matches!(
                self.peek_past_whitespace(),
                TokenType::LineBreak | TokenType::Eof | TokenType::AngledClose
            ),
            _ => false,
        }
    }

    fn skip_separators(&mut self) {
        while matches!(
            self.current_token().ttype,
            TokenType::Whitespace(_) | TokenType::LineBreak
        ) {
            self.advance();
        }
    }

    fn located(&self, tree: SyntacticTree, token: &Token) -> SyntacticTree {
        let (line, column) = get_line_and_column(self.source_text, token.pos_start);
        tree.located(Location::new(&self.file_name, line, column))
    }

    fn unbalanced(&self, token: &Token) -> ParserError {
        ParserError::UnbalancedAngledBrackets {
            src: (*self.source).clone(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
        }
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, ParserError> {
        let token = self.current_token();
        Err(ParserError::UnexpectedToken {
            src: (*self.source).clone(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            expected: expected.to_string(),
        })
    }
}

/// Reads Opus command lines.
///
///    Opus ::= { Command | Comment | BlankLine }
///    Command ::= "insert" FileLocation { InsertOption } { AbsoluteIdentifier }
///              | "mapstylesheet" Assignment { Assignment }
///    InsertOption ::= "recurse" | "createlevel" | "nohead"
///                   | "sort=" Ordering | "levelabove=" Number | "style=" Name
///    Assignment ::= Mime "=" ResourceName
struct CommandReader<'a> {
    source: Arc<NamedSource<String>>,
    source_text: &'a str,
    file_name: String,
}

/// A whitespace-delimited word of a command line, with its byte offset.
struct CommandWord<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> CommandReader<'a> {
    fn new(source_text: &'a str, file_name: &str) -> Self {
        Self {
            source: Arc::new(NamedSource::new(file_name, source_text.to_string())),
            source_text,
            file_name: file_name.to_string(),
        }
    }

    fn read_opus(&self) -> Result<SyntacticTree, ParserError> {
        let mut commands = Vec::new();
        let mut line_offset = 0;
        for line in self.source_text.split_inclusive('\n') {
            let words = split_words(line, line_offset);
            line_offset += line.len();
            let Some((name, arguments)) = words.split_first() else {
                continue;
            };
            let command = match name.text {
                "insert" => self.read_insert(name, arguments)?,
                "mapstylesheet" => self.read_mapstylesheet(name, arguments)?,
                _ => {
                    return Err(ParserError::UnknownCommand {
                        src: (*self.source).clone(),
                        span: (name.offset, name.text.len()).into(),
                        name: name.text.to_string(),
                    })
                }
            };
            commands.push(command);
        }
        Ok(SyntacticTree::new(NodeKind::Opus, commands).located(Location::of_file(&self.file_name)))
    }

    fn read_insert(
        &self,
        name: &CommandWord,
        arguments: &[CommandWord],
    ) -> Result<SyntacticTree, ParserError> {
        let Some((file, options)) = arguments.split_first() else {
            return Err(self.unexpected(name.offset + name.text.len(), 0, "file location"));
        };
        if !file.text.starts_with("file:") {
            return Err(self.unexpected(file.offset, file.text.len(), "'file:' location"));
        }
        let mut children = vec![self.located(leaf(NodeKind::UrlLiteral, file.text), file.offset)];
        for option in options {
            let child = match option.text.split_once('=') {
                None if option.text.starts_with("\\\\") => {
                    self.located(leaf(NodeKind::AbsoluteIdentifier, option.text), option.offset)
                }
                None if option.text == "recurse" => tree(NodeKind::CommandInsertRecurse, []),
                None if option.text == "createlevel" => tree(NodeKind::CommandInsertCreateLevel, []),
                None if option.text == "nohead" => tree(NodeKind::CommandInsertNoHead, []),
                Some(("sort", value)) => leaf(NodeKind::CommandInsertSort, value),
                Some(("levelabove", value)) => leaf(NodeKind::CommandInsertLevelAbove, value),
                Some(("style", value)) => leaf(NodeKind::CommandInsertStyle, value),
                _ => return Err(self.invalid_option(option)),
            };
            children.push(child);
        }
        Ok(self.located(SyntacticTree::new(NodeKind::CommandInsert, children), name.offset))
    }

    fn read_mapstylesheet(
        &self,
        name: &CommandWord,
        arguments: &[CommandWord],
    ) -> Result<SyntacticTree, ParserError> {
        if arguments.is_empty() {
            return Err(self.unexpected(name.offset + name.text.len(), 0, "stylesheet assignment"));
        }
        let mut children = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let Some((mime, resource)) = argument.text.split_once('=') else {
                return Err(self.invalid_option(argument));
            };
            children.push(tree(
                NodeKind::CommandMapstylesheetAssignment,
                [leaf(NodeKind::Word, mime), leaf(NodeKind::ResourceLocation, resource)],
            ));
        }
        Ok(self.located(SyntacticTree::new(NodeKind::CommandMapstylesheet, children), name.offset))
    }

    fn located(&self, tree: SyntacticTree, offset: usize) -> SyntacticTree {
        let (line, column) = get_line_and_column(self.source_text, offset);
        tree.located(Location::new(&self.file_name, line, column))
    }

    fn unexpected(&self, offset: usize, length: usize, expected: &str) -> ParserError {
        ParserError::UnexpectedToken {
            src: (*self.source).clone(),
            span: (offset, length).into(),
            expected: expected.to_string(),
        }
    }

    fn invalid_option(&self, word: &CommandWord) -> ParserError {
        ParserError::InvalidOption {
            src: (*self.source).clone(),
            span: (word.offset, word.text.len()).into(),
            option: word.text.to_string(),
        }
    }
}

/// Splits a line into words, dropping what follows a `//` word start.
fn split_words(line: &str, line_offset: usize) -> Vec<CommandWord<'_>> {
    let mut words = Vec::new();
    let mut word_start = None;
    for (index, c) in line.char_indices().chain(std::iter::once((line.len(), ' '))) {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                words.push(CommandWord {
                    text: &line[start..index],
                    offset: line_offset + start,
                });
            }
        } else if word_start.is_none() {
            if line[index..].starts_with("//") {
                break;
            }
            word_start = Some(index);
        }
    }
    words
}
