//! XPath Parser
//!
//! Recursive descent parser for the location-path subset:
//!
//! ```text
//! selector  := '/' relative | '//' relative | relative
//! relative  := step (('/' | '//') step)*
//! step      := '.' | '..' | (name | '*') predicate*
//! predicate := '[' (number | 'last' '(' ')' | '@' name (('=' | '!=') literal)?) ']'
//! ```

use super::lexer::{Lexer, Token};

/// Parsed selector
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

/// Location step in a path
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Reached through `//`: the step applies to the descendant-or-self set
    pub descendant: bool,
    pub axis: Axis,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Axis {
    Child(NodeTest),
    /// `.`
    SelfNode,
    /// `..`
    Parent,
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Matches any element (*)
    Any,
    /// Matches elements with exactly this qualified name
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[n]`, 1-based
    Position(u64),
    /// `[last()]`
    Last,
    /// `[@name='value']`
    AttrEq(String, String),
    /// `[@name!='value']`
    AttrNotEq(String, String),
    /// `[@name]`
    AttrExists(String),
}

/// XPath parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, String> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser { tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        let token = self.advance();
        if token == expected {
            Ok(())
        } else {
            Err(format!("expected {expected:?}, found {token:?}"))
        }
    }

    /// Parse a full selector
    pub fn parse(&mut self) -> Result<Selector, String> {
        if matches!(self.peek(), Token::Eof) {
            return Err("empty expression".to_string());
        }

        let (absolute, mut descendant) = match self.peek() {
            Token::Slash => {
                self.advance();
                if matches!(self.peek(), Token::Eof) {
                    return Err("`/` selects the document node, not an element".to_string());
                }
                (true, false)
            }
            Token::DoubleSlash => {
                self.advance();
                (true, true)
            }
            _ => (false, false),
        };

        let mut steps = Vec::new();
        loop {
            steps.push(self.parse_step(descendant)?);
            descendant = match self.peek() {
                Token::Slash => false,
                Token::DoubleSlash => true,
                Token::Eof => break,
                other => return Err(format!("unexpected {other:?} after step")),
            };
            self.advance();
        }

        Ok(Selector { absolute, steps })
    }

    fn parse_step(&mut self, descendant: bool) -> Result<Step, String> {
        let axis = match self.advance() {
            Token::Dot => Axis::SelfNode,
            Token::DoubleDot => Axis::Parent,
            Token::Star => Axis::Child(NodeTest::Any),
            Token::Name(name) => Axis::Child(NodeTest::Name(name)),
            Token::Eof => return Err("expected a step, found end of expression".to_string()),
            other => return Err(format!("expected a step, found {other:?}")),
        };

        let mut predicates = Vec::new();
        while matches!(self.peek(), Token::LeftBracket) {
            if !matches!(axis, Axis::Child(_)) {
                return Err("predicates are not allowed after `.` or `..`".to_string());
            }
            self.advance();
            predicates.push(self.parse_predicate()?);
            self.expect(Token::RightBracket)?;
        }

        Ok(Step {
            descendant,
            axis,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, String> {
        match self.advance() {
            Token::Number(n) => Ok(Predicate::Position(n)),
            Token::Name(name) if name == "last" => {
                self.expect(Token::LeftParen)?;
                self.expect(Token::RightParen)?;
                Ok(Predicate::Last)
            }
            Token::At => {
                let name = match self.advance() {
                    Token::Name(name) => name,
                    other => return Err(format!("expected attribute name, found {other:?}")),
                };
                let negate = match self.peek() {
                    Token::Eq => false,
                    Token::NotEq => true,
                    _ => return Ok(Predicate::AttrExists(name)),
                };
                self.advance();
                let value = match self.advance() {
                    Token::String(value) => value,
                    other => return Err(format!("expected string literal, found {other:?}")),
                };
                Ok(if negate {
                    Predicate::AttrNotEq(name, value)
                } else {
                    Predicate::AttrEq(name, value)
                })
            }
            Token::Eof => Err("unclosed predicate".to_string()),
            other => Err(format!("unsupported predicate starting with {other:?}")),
        }
    }
}

/// Parse a selector string
pub fn parse(input: &str) -> Result<Selector, String> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn child(name: &str) -> Axis {
        Axis::Child(NodeTest::Name(name.to_string()))
    }

    #[test]
    fn test_parse_absolute_positions() {
        let selector = parse("/root[1]/element[3]").unwrap();
        assert!(selector.absolute);
        assert_eq!(selector.steps.len(), 2);
        assert_eq!(selector.steps[0].axis, child("root"));
        assert_eq!(selector.steps[1].predicates, vec![Predicate::Position(3)]);
        assert!(!selector.steps[1].descendant);
    }

    #[test]
    fn test_parse_descendant_with_attribute() {
        let selector = parse("//element[@attribute1='value1']").unwrap();
        assert!(selector.absolute);
        assert!(selector.steps[0].descendant);
        assert_eq!(
            selector.steps[0].predicates,
            vec![Predicate::AttrEq("attribute1".into(), "value1".into())]
        );
    }

    #[test]
    fn test_parse_wildcard_children() {
        let selector = parse("/root[1]/element[3]/*[@name='child2']").unwrap();
        assert_eq!(selector.steps[2].axis, Axis::Child(NodeTest::Any));
    }

    #[test]
    fn test_parse_relative() {
        let selector = parse("./a//b/..").unwrap();
        assert!(!selector.absolute);
        let axes: Vec<&Axis> = selector.steps.iter().map(|s| &s.axis).collect();
        assert_eq!(axes, vec![&Axis::SelfNode, &child("a"), &child("b"), &Axis::Parent]);
        assert!(selector.steps[2].descendant);
    }

    #[test]
    fn test_parse_predicate_chain() {
        let selector = parse(r#"item[@id][@kind!="x"][last()]"#).unwrap();
        assert_eq!(
            selector.steps[0].predicates,
            vec![
                Predicate::AttrExists("id".into()),
                Predicate::AttrNotEq("kind".into(), "x".into()),
                Predicate::Last,
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case("//")]
    #[case("a/")]
    #[case("a[")]
    #[case("a[1")]
    #[case("a[]")]
    #[case("a[@]")]
    #[case("a[@x=1]")]
    #[case("a[position()]")]
    #[case("a[last(]")]
    #[case("..[1]")]
    #[case("a b")]
    #[case("@id")]
    fn test_malformed(#[case] input: &str) {
        assert!(parse(input).is_err(), "{input:?} should not parse");
    }
}
