use thiserror::Error;

use crate::ast::{Position, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string starting at {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence '\\{escape}' at {position}")]
    InvalidEscape { escape: char, position: Position },

    #[error("illegal character '{}' at {}", .token.literal, .token.position)]
    Illegal { token: Token },

    #[error("malformed keyword '{keyword}' at {position}: expected ':' to follow it")]
    MalformedKeyword { keyword: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::MalformedKeyword { position, .. } => *position,
            LexError::Illegal { token } => token.position,
        }
    }
}

/// Turns script text into positioned tokens, one [`Lexer::scan`] call at a time.
pub struct Lexer {
    input: Vec<char>,
    offset: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.offset).copied()
    }

    fn peek_char(&self, ahead: usize) -> Option<char> {
        self.input.get(self.offset + ahead).copied()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.offset += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_comment(&mut self) -> String {
        self.advance(); // '#'
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            result.push(ch);
            self.advance();
        }
        // Tolerate CRLF line endings
        if result.ends_with('\r') {
            result.pop();
        }
        result
    }

    fn read_string(&mut self, start: Position) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    let escape_at = self.position();
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some(escape) => {
                            return Err(LexError::InvalidEscape {
                                escape,
                                position: escape_at,
                            });
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> String {
        let mut number = String::new();
        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        let mut is_fraction = false;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_fraction
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_fraction = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        number
    }

    /// True when the next non-blank rune on the current line is ':'.
    fn colon_follows(&self) -> bool {
        let mut ahead = 0;
        while let Some(ch) = self.peek_char(ahead) {
            match ch {
                ' ' | '\t' => ahead += 1,
                ':' => return true,
                _ => return false,
            }
        }
        false
    }

    fn punctuation(&mut self, kind: TokenKind, ch: char, position: Position) -> Token {
        self.advance();
        Token::new(kind, ch.to_string(), position)
    }

    /// Returns the next token. Once the input is exhausted every call
    /// returns an [`TokenKind::Eof`] token.
    pub fn scan(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position();

        let Some(ch) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        let token = match ch {
            '[' => self.punctuation(TokenKind::LBracket, ch, start),
            ']' => self.punctuation(TokenKind::RBracket, ch, start),
            '{' => self.punctuation(TokenKind::LBrace, ch, start),
            '}' => self.punctuation(TokenKind::RBrace, ch, start),
            '(' => self.punctuation(TokenKind::LParen, ch, start),
            ')' => self.punctuation(TokenKind::RParen, ch, start),
            ',' => self.punctuation(TokenKind::Comma, ch, start),
            ':' => self.punctuation(TokenKind::Colon, ch, start),
            '=' => self.punctuation(TokenKind::Equals, ch, start),
            '#' => Token::new(TokenKind::Comment, self.read_comment(), start),
            '"' => Token::new(TokenKind::String, self.read_string(start)?, start),
            '-' if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                Token::new(TokenKind::Number, self.read_number(), start)
            }
            c if c.is_ascii_digit() => Token::new(TokenKind::Number, self.read_number(), start),
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                match ident.as_str() {
                    "let" | "in" => {
                        if !self.colon_follows() {
                            return Err(LexError::MalformedKeyword {
                                keyword: ident,
                                position: start,
                            });
                        }
                        let kind = if ident == "let" {
                            TokenKind::Let
                        } else {
                            TokenKind::In
                        };
                        Token::new(kind, ident, start)
                    }
                    "true" | "false" => Token::new(TokenKind::Bool, ident, start),
                    "null" => Token::new(TokenKind::Null, ident, start),
                    _ => Token::new(TokenKind::Identifier, ident, start),
                }
            }
            c => {
                self.advance();
                return Err(LexError::Illegal {
                    token: Token::new(TokenKind::Illegal, c.to_string(), start),
                });
            }
        };

        Ok(token)
    }

    /// Scans the whole input. The returned vector always ends with an
    /// [`TokenKind::Eof`] token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}
