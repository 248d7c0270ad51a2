//! XPath Lexer
//!
//! Tokenizes location-path selectors.

use crate::core::scanner;

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Star,        // *
    Eq,          // =
    NotEq,       // !=

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(u64),
    String(String),

    // Names, qualified names included (prefix:local)
    Name(String),

    // End of input
    Eof,
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii() && scanner::is_xml_whitespace(c as u8) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let token = match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                self.advance(1);
                if self.peek() == Some('.') {
                    self.advance(1);
                    Token::DoubleDot
                } else {
                    Token::Dot
                }
            }
            '@' => {
                self.advance(1);
                Token::At
            }
            '*' => {
                self.advance(1);
                Token::Star
            }
            '=' => {
                self.advance(1);
                Token::Eq
            }
            '!' => {
                if self.peek_at(1) != Some('=') {
                    return Err(format!("unexpected '!' at offset {}", self.pos));
                }
                self.advance(2);
                Token::NotEq
            }
            '(' => {
                self.advance(1);
                Token::LeftParen
            }
            ')' => {
                self.advance(1);
                Token::RightParen
            }
            '[' => {
                self.advance(1);
                Token::LeftBracket
            }
            ']' => {
                self.advance(1);
                Token::RightBracket
            }
            '"' | '\'' => self.read_string(c)?,
            '0'..='9' => self.read_number()?,
            _ if is_name_start_char(c) => self.read_name(),
            _ => return Err(format!("unexpected character '{c}' at offset {}", self.pos)),
        };
        Ok(token)
    }

    fn read_number(&mut self) -> Result<Token, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance(1);
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            return Err(format!("non-integer number at offset {start}"));
        }

        let digits = &self.input[start..self.pos];
        digits
            .parse()
            .map(Token::Number)
            .map_err(|_| format!("number `{digits}` is out of range"))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        let start = self.pos;
        self.advance(1);

        let body = self.pos;
        match self.remaining().find(quote) {
            Some(len) => {
                let value = self.input[body..body + len].to_string();
                self.advance(len + 1);
                Ok(Token::String(value))
            }
            None => Err(format!("unterminated string literal at offset {start}")),
        }
    }

    /// Read a name with the same character set the document scanner indexes,
    /// colons included
    fn read_name(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        Token::Name(self.input[start..self.pos].to_string())
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

// Non-ASCII characters are UTF-8 sequences whose bytes are all >= 0x80,
// all of which the scanner takes as name bytes.
fn is_name_start_char(c: char) -> bool {
    !c.is_ascii() || scanner::is_name_start_char(c as u8)
}

fn is_name_char(c: char) -> bool {
    !c.is_ascii() || scanner::is_name_char(c as u8)
}
