use std::fmt;

/// A location in the script source. Both fields are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    /// `let`, opens the binding section
    ///
    /// # Examples
    /// ```text
    /// let:
    ///     runtime = solve(...)
    /// ```
    Let,

    /// `in`, names the expression the script evaluates to
    ///
    /// # Examples
    /// ```text
    /// in: runtime
    /// ```
    In,

    // Literals
    /// String literal enclosed in double quotes. The literal holds the
    /// unescaped contents.
    ///
    /// # Examples
    /// ```text
    /// "language/perl"
    /// "2023-04-27T17:30:05.999Z"
    /// ```
    String,

    /// Number literal, kept as its source text
    ///
    /// # Examples
    /// ```text
    /// 3
    /// -1.25
    /// ```
    Number,

    /// `true` or `false`
    Bool,

    /// `null`
    Null,

    /// Binding name, argument name or function name
    ///
    /// Must start with a letter or underscore, followed by letters, digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// runtime
    /// solve_legacy
    /// version_requirements
    /// ```
    Identifier,

    /// `#` up to the end of the line. The literal is the text after `#`.
    Comment,

    // Punctuation
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Colon,
    Equals,

    /// A rune the lexer does not recognise
    Illegal,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Human readable name used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Let => "'let'",
            TokenKind::In => "'in'",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Bool => "boolean",
            TokenKind::Null => "'null'",
            TokenKind::Identifier => "identifier",
            TokenKind::Comment => "comment",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Equals => "'='",
            TokenKind::Illegal => "illegal character",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A positioned lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            literal: literal.into(),
            position,
        }
    }

    /// How the token appears in error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Identifier => format!("identifier '{}'", self.literal),
            TokenKind::String => format!("string \"{}\"", self.literal),
            TokenKind::Number | TokenKind::Bool => format!("'{}'", self.literal),
            TokenKind::Illegal => format!("illegal character '{}'", self.literal),
            kind => kind.describe().to_string(),
        }
    }
}
