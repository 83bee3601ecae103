//! Lexer for the worklet subset of JavaScript.

use crate::compiler::tokens::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{ch}' at line {line}, col {col}")]
    UnexpectedChar { ch: char, line: usize, col: usize },
    #[error("unterminated string at line {line}, col {col}")]
    UnterminatedString { line: usize, col: usize },
    #[error("unterminated block comment at line {line}, col {col}")]
    UnterminatedComment { line: usize, col: usize },
    #[error("invalid number at line {line}, col {col}")]
    InvalidNumber { line: usize, col: usize },
}

impl LexError {
    pub fn line_col(&self) -> (usize, usize) {
        match self {
            LexError::UnexpectedChar { line, col, .. }
            | LexError::UnterminatedString { line, col }
            | LexError::UnterminatedComment { line, col }
            | LexError::InvalidNumber { line, col } => (*line, *col),
        }
    }
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span_from(&self, start: usize, line: usize, col: usize) -> Span {
        Span::new(start, self.pos, line, col)
    }

    /// Skip whitespace and `//` / `/* */` comments. Errors on an unclosed
    /// block comment.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.current() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek() == Some('/') => {
                    while let Some(ch) = self.current() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek() == Some('*') => {
                    let (line, col) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    loop {
                        match self.current() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                            None => return Err(LexError::UnterminatedComment { line, col }),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, LexError> {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.current() {
                Some(ch) if ch == quote => {
                    self.advance();
                    return Ok(Token::new(
                        TokenKind::StringLit(text),
                        self.span_from(start, line, col),
                    ));
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(other) => text.push(other),
                        None => return Err(LexError::UnterminatedString { line, col }),
                    }
                }
                Some('\n') | None => return Err(LexError::UnterminatedString { line, col }),
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let (start, line, col) = (self.pos, self.line, self.col);
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if self.current() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            while let Some(ch) = self.current() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let value: f64 = text
            .parse()
            .map_err(|_| LexError::InvalidNumber { line, col })?;
        Ok(Token::new(
            TokenKind::NumberLit(value),
            self.span_from(start, line, col),
        ))
    }

    fn read_ident(&mut self) -> Token {
        let (start, line, col) = (self.pos, self.line, self.col);
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match text.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "return" => TokenKind::Return,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "as" => TokenKind::As,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "for" | "while" | "do" | "function" => TokenKind::Reserved(text),
            _ => TokenKind::Ident(text),
        };
        Token::new(kind, self.span_from(start, line, col))
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.advance();
        Token::new(kind, self.span_from(start, line, col))
    }

    /// Consume `self.pos` plus `extra` following characters as one token.
    fn multi(&mut self, extra: usize, kind: TokenKind) -> Token {
        let (start, line, col) = (self.pos, self.line, self.col);
        for _ in 0..=extra {
            self.advance();
        }
        Token::new(kind, self.span_from(start, line, col))
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let Some(ch) = self.current() else { break };
            let token = match ch {
                '0'..='9' => self.read_number()?,
                '\'' | '"' => self.read_string(ch)?,
                c if c.is_alphabetic() || c == '_' || c == '$' => self.read_ident(),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semi),
                '.' => self.single(TokenKind::Dot),
                '~' => self.single(TokenKind::Tilde),
                '^' => self.single(TokenKind::Caret),
                '%' => self.single(TokenKind::Percent),
                '+' => match self.peek() {
                    Some('=') => self.multi(1, TokenKind::PlusAssign),
                    _ => self.single(TokenKind::Plus),
                },
                '-' => match self.peek() {
                    Some('=') => self.multi(1, TokenKind::MinusAssign),
                    _ => self.single(TokenKind::Minus),
                },
                '*' => match self.peek() {
                    Some('=') => self.multi(1, TokenKind::StarAssign),
                    Some('*') => self.multi(1, TokenKind::StarStar),
                    _ => self.single(TokenKind::Star),
                },
                '/' => match self.peek() {
                    Some('=') => self.multi(1, TokenKind::SlashAssign),
                    _ => self.single(TokenKind::Slash),
                },
                '=' => match (self.peek(), self.source.get(self.pos + 2).copied()) {
                    (Some('='), Some('=')) => self.multi(2, TokenKind::EqEqEq),
                    (Some('='), _) => self.multi(1, TokenKind::EqEq),
                    (Some('>'), _) => self.multi(1, TokenKind::Arrow),
                    _ => self.single(TokenKind::Assign),
                },
                '!' => match (self.peek(), self.source.get(self.pos + 2).copied()) {
                    (Some('='), Some('=')) => self.multi(2, TokenKind::NotEqEq),
                    (Some('='), _) => self.multi(1, TokenKind::NotEq),
                    _ => self.single(TokenKind::Bang),
                },
                '<' => match self.peek() {
                    Some('=') => self.multi(1, TokenKind::LtEq),
                    Some('<') => self.multi(1, TokenKind::Shl),
                    _ => self.single(TokenKind::Lt),
                },
                '>' => match self.peek() {
                    Some('=') => self.multi(1, TokenKind::GtEq),
                    Some('>') => self.multi(1, TokenKind::Shr),
                    _ => self.single(TokenKind::Gt),
                },
                '&' => match self.peek() {
                    Some('&') => self.multi(1, TokenKind::AndAnd),
                    _ => self.single(TokenKind::Amp),
                },
                '|' => match self.peek() {
                    Some('|') => self.multi(1, TokenKind::OrOr),
                    _ => self.single(TokenKind::Pipe),
                },
                other => {
                    return Err(LexError::UnexpectedChar {
                        ch: other,
                        line: self.line,
                        col: self.col,
                    })
                }
            };
            tokens.push(token);
        }
        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.pos, self.pos, self.line, self.col),
        ));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_lex_operators_maximal_munch() {
        assert_eq!(
            kinds("=== == = !== != ! ** * => >= >> >"),
            vec![
                TokenKind::EqEqEq,
                TokenKind::EqEq,
                TokenKind::Assign,
                TokenKind::NotEqEq,
                TokenKind::NotEq,
                TokenKind::Bang,
                TokenKind::StarStar,
                TokenKind::Star,
                TokenKind::Arrow,
                TokenKind::GtEq,
                TokenKind::Shr,
                TokenKind::Gt,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_compound_assignment() {
        assert_eq!(
            kinds("x += 1; y /= 2"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::PlusAssign,
                TokenKind::NumberLit(1.0),
                TokenKind::Semi,
                TokenKind::Ident("y".into()),
                TokenKind::SlashAssign,
                TokenKind::NumberLit(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_keywords_and_idents() {
        assert_eq!(
            kinds("if else return let const import from as while offsetX $v _x"),
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Return,
                TokenKind::Let,
                TokenKind::Const,
                TokenKind::Import,
                TokenKind::From,
                TokenKind::As,
                TokenKind::Reserved("while".into()),
                TokenKind::Ident("offsetX".into()),
                TokenKind::Ident("$v".into()),
                TokenKind::Ident("_x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(
            kinds("30 0.5 22.25"),
            vec![
                TokenKind::NumberLit(30.0),
                TokenKind::NumberLit(0.5),
                TokenKind::NumberLit(22.25),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_strings_both_quotes() {
        assert_eq!(
            kinds("'animato/macro' \"a b\""),
            vec![
                TokenKind::StringLit("animato/macro".into()),
                TokenKind::StringLit("a b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_comments_skipped() {
        assert_eq!(
            kinds("a // line comment\n/* block\ncomment */ b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_line_and_col_tracking() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.col, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.col, 3);
    }

    #[test]
    fn test_lex_unterminated_string() {
        let err = Lexer::new("'oops").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { line: 1, col: 1 }));
    }

    #[test]
    fn test_lex_unexpected_char() {
        let err = Lexer::new("a # b").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: '#', .. }));
    }
}
