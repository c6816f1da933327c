//! Tokenizer for note/chord text.
//!
//! Input is split on runs of whitespace; every non-empty run of other
//! characters becomes one token. Tokens are not validated here: a token that
//! the notation table does not know is reported later, during playback.

use serde::Serialize;

/// A token with its position in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    /// 0-based position in the sequence
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Ordered tokens from one input string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sequence {
    tokens: Vec<Token>,
}

impl Sequence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(Token::as_str).collect()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Lexer for splitting note text into tokens
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    pub fn tokenize(&mut self) -> Sequence {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.chars.peek().is_none() {
                break;
            }

            let (line, column) = (self.line, self.column);
            let mut text = String::new();
            while let Some(&c) = self.chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                self.advance();
            }

            tokens.push(Token {
                text,
                index: tokens.len(),
                line,
                column,
            });
        }

        Sequence { tokens }
    }
}

/// Tokenize note text. Never fails; empty or blank input gives an empty sequence.
pub fn tokenize(text: &str) -> Sequence {
    Lexer::new(text).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_notes() {
        let seq = tokenize("1 3 5");
        assert_eq!(seq.texts(), vec!["1", "3", "5"]);
    }

    #[test]
    fn test_single_symbol() {
        let seq = tokenize("q");
        assert_eq!(seq.texts(), vec!["q"]);
        assert_eq!(seq.get(0).unwrap().index, 0);
    }

    #[test]
    fn test_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("\n\t \r\n").is_empty());
    }

    #[test]
    fn test_whitespace_runs() {
        let seq = tokenize("  q\t\tw \n\n e  ");
        assert_eq!(seq.texts(), vec!["q", "w", "e"]);
        let indexes: Vec<usize> = seq.iter().map(|t| t.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_multi_character_tokens_kept_whole() {
        // Not split into characters: the notation table decides validity later
        let seq = tokenize("12 q!");
        assert_eq!(seq.texts(), vec!["12", "q!"]);
    }

    #[test]
    fn test_positions() {
        let seq = tokenize("1 2\n  q");
        let positions: Vec<(usize, usize)> = seq.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(positions, vec![(1, 1), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_unicode_whitespace() {
        // U+3000 ideographic space, common when pasting from CJK input methods
        let seq = tokenize("1\u{3000}2");
        assert_eq!(seq.texts(), vec!["1", "2"]);
    }
}
