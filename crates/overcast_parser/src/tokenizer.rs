//! Tokenizer for Overcast source code
//!
//! A single forward scan over the source text producing an ordered, finite
//! token sequence terminated by [`TokenKind::Eof`]. Whitespace and comments
//! are dropped. Every token records the 1-based line and column where it
//! starts so parse errors can point back into the source.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::LexError;

/// Represents a token in the Overcast language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal value: decoded contents for strings, source text otherwise.
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    /// Whether the token can end an operand, which makes a following
    /// `-`/`+` a binary operator rather than a literal sign.
    fn ends_value(&self) -> bool {
        match self.kind {
            TokenKind::Str | TokenKind::Integer | TokenKind::Identifier => true,
            TokenKind::Symbol => matches!(self.text.as_str(), ")" | "]" | "}"),
            _ => false,
        }
    }
}

/// Token kinds in the Overcast language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Str,
    Integer,
    Identifier,

    // Keywords
    Include,
    Func,
    Let,
    If,
    Else,
    Struct,
    Return,

    /// `->` or `<-`
    Arrow,
    Operator,
    Symbol,
    Eof,
}

impl TokenKind {
    fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "include" => TokenKind::Include,
            "func" => TokenKind::Func,
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "struct" => TokenKind::Struct,
            "return" => TokenKind::Return,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Str => "STRING",
            TokenKind::Integer => "INTEGER",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Include => "INCLUDE",
            TokenKind::Func => "FUNC",
            TokenKind::Let => "LET",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Struct => "STRUCT",
            TokenKind::Return => "RETURN",
            TokenKind::Arrow => "ARROW",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// Two-character operators, checked before the single-character ones.
const LONG_OPERATORS: [&str; 12] = [
    "!=", "==", ">=", "<=", "&&", "||", ">>", "<<", "++", "--", "+=", "-=",
];

const SHORT_OPERATORS: &str = "><|^&!+-/";

const SYMBOLS: &str = "@#$%*()[]{}=\\:',.?";

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, message: impl Into<String>, line: usize, column: usize) -> LexError {
        LexError {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Tokenize Overcast source into a token stream ending with `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut sc = Scanner::new(source);

    while let Some(ch) = sc.peek() {
        let (line, column) = (sc.line, sc.column);
        let push = |tokens: &mut Vec<Token>, kind, text: String| {
            tokens.push(Token {
                kind,
                text,
                line,
                column,
            });
        };

        match ch {
            c if c.is_whitespace() => {
                sc.bump();
            }

            // Line comment
            '/' if sc.peek_second() == Some('/') => {
                while let Some(c) = sc.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            }

            // Block comment
            '/' if sc.peek_second() == Some('*') => {
                sc.bump();
                sc.bump();
                let mut prev = '\0';
                let mut closed = false;
                while let Some(c) = sc.bump() {
                    if prev == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    prev = c;
                }
                if !closed {
                    return Err(sc.error("unterminated block comment", line, column));
                }
            }

            '"' => {
                sc.bump();
                let mut value = String::new();
                loop {
                    match sc.bump() {
                        Some('"') => break,
                        Some('\\') => match sc.bump() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some('"') => value.push('"'),
                            Some('\\') => value.push('\\'),
                            Some(other) => {
                                value.push('\\');
                                value.push(other);
                            }
                            None => {
                                return Err(sc.error("unterminated string literal", line, column));
                            }
                        },
                        Some('\n') | None => {
                            return Err(sc.error("unterminated string literal", line, column));
                        }
                        Some(c) => value.push(c),
                    }
                }
                push(&mut tokens, TokenKind::Str, value);
            }

            '0'..='9' => {
                let digits = scan_digits(&mut sc);
                push(&mut tokens, TokenKind::Integer, digits);
            }

            // Signed literal: only where an operand may start
            '-' | '+'
                if sc.peek_second().is_some_and(|c| c.is_ascii_digit())
                    && !tokens.last().is_some_and(Token::ends_value) =>
            {
                sc.bump();
                let digits = scan_digits(&mut sc);
                let text = if ch == '-' { format!("-{digits}") } else { digits };
                push(&mut tokens, TokenKind::Integer, text);
            }

            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(c) = sc.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        sc.bump();
                    } else {
                        break;
                    }
                }
                let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
                push(&mut tokens, kind, word);
            }

            _ => {
                let pair: String = [Some(ch), sc.peek_second()].into_iter().flatten().collect();
                if pair == "->" || pair == "<-" {
                    sc.bump();
                    sc.bump();
                    push(&mut tokens, TokenKind::Arrow, pair);
                } else if LONG_OPERATORS.contains(&pair.as_str()) {
                    sc.bump();
                    sc.bump();
                    push(&mut tokens, TokenKind::Operator, pair);
                } else if SHORT_OPERATORS.contains(ch) {
                    sc.bump();
                    push(&mut tokens, TokenKind::Operator, ch.to_string());
                } else if SYMBOLS.contains(ch) {
                    sc.bump();
                    push(&mut tokens, TokenKind::Symbol, ch.to_string());
                } else {
                    return Err(sc.error(format!("unrecognized character `{ch}`"), line, column));
                }
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line: sc.line,
        column: sc.column,
    });
    Ok(tokens)
}

fn scan_digits(sc: &mut Scanner<'_>) -> String {
    let mut digits = String::new();
    while let Some(c) = sc.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            sc.bump();
        } else {
            break;
        }
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_need_word_boundaries() {
        assert_eq!(
            kinds("let letter func funcs"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Func,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn arrows_and_operators() {
        let tokens = tokenize("a -> b <- c >= d != e").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(texts[1], (TokenKind::Arrow, "->"));
        assert_eq!(texts[3], (TokenKind::Arrow, "<-"));
        assert_eq!(texts[5], (TokenKind::Operator, ">="));
        assert_eq!(texts[7], (TokenKind::Operator, "!="));
    }

    #[test]
    fn star_is_a_symbol() {
        let tokens = tokenize("int**").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert_eq!(tokens[2].text, "*");
    }
}
