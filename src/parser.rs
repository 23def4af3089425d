use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{
        NodeId, NodeKind, Position, Token, TokenKind, Tree,
        node::TreeBuilder,
    },
    lexer::{LexError, Lexer},
    value::is_known_function,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, got {found} at {position}")]
    Unexpected {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("unknown function '{name}' at {position}")]
    UnknownFunction { name: String, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(e) => e.position(),
            ParseError::Unexpected { position, .. }
            | ParseError::UnknownFunction { position, .. } => *position,
        }
    }
}

/// Lexes and parses `source` into a syntax tree.
pub fn parse(source: &str) -> Result<Tree, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

/// Recursive-descent parser over a token vector.
///
/// Comment tokens never reach the grammar functions: they are turned into
/// `Comment` nodes as they are skipped and attached to the next node that
/// can own them.
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    builder: TreeBuilder,
    pending_comments: Vec<NodeId>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let position = tokens.last().map(|t| t.position).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", position));
        }
        let mut parser = Parser {
            tokens,
            cursor: 0,
            builder: TreeBuilder::default(),
            pending_comments: Vec::new(),
        };
        parser.skip_comments();
        parser
    }

    fn current(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    /// Kind of the first non-comment token after the current one.
    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.cursor + 1..]
            .iter()
            .map(|t| t.kind)
            .find(|kind| *kind != TokenKind::Comment)
            .unwrap_or(TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn skip_comments(&mut self) {
        while let Some(token) = self.tokens.get(self.cursor) {
            if token.kind != TokenKind::Comment {
                break;
            }
            let id = self.builder.push(
                NodeKind::Comment,
                token.position,
                Some(token.literal.clone()),
            );
            self.pending_comments.push(id);
            self.cursor += 1;
        }
    }

    fn next(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
            self.skip_comments();
        }
        token
    }

    fn take_comments(&mut self, parent: NodeId) {
        for id in std::mem::take(&mut self.pending_comments) {
            self.builder.attach(parent, id);
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let found = self.current();
        ParseError::Unexpected {
            expected: expected.into(),
            found: found.describe(),
            position: found.position,
        }
    }

    fn expect_as(
        &mut self,
        parent: NodeId,
        kind: TokenKind,
        node_kind: NodeKind,
    ) -> Result<Token, ParseError> {
        if !self.check(kind) {
            return Err(self.unexpected(kind.describe()));
        }
        let token = self.next();
        let leaf = self
            .builder
            .push(node_kind, token.position, Some(token.literal.clone()));
        self.builder.attach(parent, leaf);
        Ok(token)
    }

    fn expect(&mut self, parent: NodeId, kind: TokenKind) -> Result<Token, ParseError> {
        let node_kind = match kind {
            TokenKind::Let | TokenKind::In => NodeKind::Keyword,
            TokenKind::String => NodeKind::String,
            TokenKind::Number => NodeKind::Number,
            TokenKind::Bool => NodeKind::Bool,
            TokenKind::Null => NodeKind::Null,
            TokenKind::Identifier => NodeKind::Identifier,
            _ => NodeKind::Punctuation,
        };
        self.expect_as(parent, kind, node_kind)
    }

    fn open(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = self.builder.push(kind, self.current().position, None);
        if let Some(parent) = parent {
            self.builder.attach(parent, id);
        }
        id
    }

    /// File := Let In EOF
    pub fn parse(mut self) -> Result<Tree, ParseError> {
        let file = self.open(None, NodeKind::File);
        self.take_comments(file);

        self.parse_let(file)?;
        self.parse_in(file)?;

        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected(TokenKind::Eof.describe()));
        }
        self.take_comments(file);

        let tree = self.builder.finish(file);
        trace!(nodes = tree.len(), "parsed build script");
        Ok(tree)
    }

    /// Let := 'let' ':' Binding*
    fn parse_let(&mut self, file: NodeId) -> Result<(), ParseError> {
        let node = self.open(Some(file), NodeKind::Let);
        self.expect(node, TokenKind::Let)?;
        self.expect(node, TokenKind::Colon)?;

        while self.check(TokenKind::Identifier) || self.check(TokenKind::String) {
            self.parse_assignment(node, NodeKind::Binding)?;
        }
        Ok(())
    }

    /// In := 'in' ':' (Identifier | Application)
    fn parse_in(&mut self, file: NodeId) -> Result<(), ParseError> {
        let node = self.open(Some(file), NodeKind::In);
        self.take_comments(node);
        self.expect(node, TokenKind::In)?;
        self.expect(node, TokenKind::Colon)?;

        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected("identifier or function call"));
        }
        // One extra token of lookahead separates `name` from `name(`
        if self.peek_kind() == TokenKind::LParen {
            self.parse_application(node)
        } else {
            self.expect(node, TokenKind::Identifier).map(|_| ())
        }
    }

    /// Binding/Argument := (Identifier | String) '=' Value
    ///
    /// The quoted form carries keys that are not identifiers, such as
    /// `"build-flags"` or `"in"`.
    fn parse_assignment(&mut self, parent: NodeId, kind: NodeKind) -> Result<(), ParseError> {
        let node = self.open(Some(parent), kind);
        self.take_comments(node);
        match self.current().kind {
            key @ (TokenKind::Identifier | TokenKind::String) => {
                self.expect(node, key)?;
            }
            _ => return Err(self.unexpected(TokenKind::Identifier.describe())),
        }
        self.expect(node, TokenKind::Equals)?;
        self.parse_value(node)
    }

    /// Value := Application | List | String | Number | Bool | Identifier | Null | Object
    fn parse_value(&mut self, parent: NodeId) -> Result<(), ParseError> {
        match self.current().kind {
            TokenKind::Identifier if self.peek_kind() == TokenKind::LParen => {
                self.parse_application(parent)
            }
            TokenKind::LBracket => self.parse_list(parent),
            TokenKind::LBrace => self.parse_object(parent),
            kind @ (TokenKind::Identifier
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::Bool
            | TokenKind::Null) => self.expect(parent, kind).map(|_| ()),
            _ => Err(self.unexpected("value")),
        }
    }

    /// Application := FuncName '(' (Argument (',' Argument)* ','?)? ')'
    fn parse_application(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let name = self.current();
        if !is_known_function(&name.literal) {
            return Err(ParseError::UnknownFunction {
                name: name.literal.clone(),
                position: name.position,
            });
        }

        let node = self.open(Some(parent), NodeKind::FuncCall);
        self.expect_as(node, TokenKind::Identifier, NodeKind::FuncName)?;
        self.expect(node, TokenKind::LParen)?;

        while !self.check(TokenKind::RParen) {
            self.parse_assignment(node, NodeKind::Argument)?;
            if self.check(TokenKind::Comma) {
                self.expect(node, TokenKind::Comma)?;
            } else {
                break;
            }
        }

        self.take_comments(node);
        self.expect(node, TokenKind::RParen)?;
        Ok(())
    }

    /// List := '[' (Value (',' Value)* ','?)? ']'
    fn parse_list(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let node = self.open(Some(parent), NodeKind::List);
        self.expect(node, TokenKind::LBracket)?;

        while !self.check(TokenKind::RBracket) {
            let element = self.open(Some(node), NodeKind::ListElement);
            self.take_comments(element);
            self.parse_value(element)?;
            if self.check(TokenKind::Comma) {
                self.expect(node, TokenKind::Comma)?;
            } else {
                break;
            }
        }

        self.take_comments(node);
        self.expect(node, TokenKind::RBracket)?;
        Ok(())
    }

    /// Object := '{' (Binding (',' Binding)* ','?)? '}'
    fn parse_object(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let node = self.open(Some(parent), NodeKind::Object);
        self.expect(node, TokenKind::LBrace)?;

        while !self.check(TokenKind::RBrace) {
            self.parse_assignment(node, NodeKind::Assignment)?;
            if self.check(TokenKind::Comma) {
                self.expect(node, TokenKind::Comma)?;
            } else {
                break;
            }
        }

        self.take_comments(node);
        self.expect(node, TokenKind::RBrace)?;
        Ok(())
    }
}
