//! ShellLex: tokenizer for the shell sublanguage.
//!
//! Ported character-by-character from `ShellUtil.cpp`'s `ShLexer`. The
//! original additionally has a "fast path" (`lexArgFast`) that special-cases
//! a chunk with no shell metacharacters; that's a pure performance
//! optimization over the slow path and is not reproduced here, since its
//! observable token stream is identical (see SPEC_FULL.md §4).

use crate::error::LitError;

/// Token kind: `Normal` covers both plain arguments and bare operators
/// (`;`, `|`, `>`, ...); `IntPrefix(fd)` marks a redirect operator that was
/// immediately preceded by an integer fd (`2>` -> `IntPrefix(2)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Normal,
    IntPrefix(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    fn normal(text: impl Into<String>) -> Self {
        Token { text: text.into(), kind: TokenKind::Normal }
    }
    fn op(text: impl Into<String>) -> Self {
        Token { text: text.into(), kind: TokenKind::Normal }
    }
}

/// A single argument token, distinguishing plain literals from glob
/// patterns (anything containing an unquoted `*` or `?`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexItem {
    Token(Token),
    Glob(String),
}

pub struct ShellLexer<'a> {
    data: &'a [u8],
    pos: usize,
    win32_escapes: bool,
}

impl<'a> ShellLexer<'a> {
    pub fn new(data: &'a str, win32_escapes: bool) -> Self {
        Self { data: data.as_bytes(), pos: 0, win32_escapes }
    }

    fn end(&self) -> usize {
        self.data.len()
    }

    fn eat(&mut self) -> u8 {
        let c = self.data[self.pos];
        self.pos += 1;
        c
    }

    fn look(&self) -> u8 {
        self.data[self.pos]
    }

    fn maybe_eat(&mut self, c: u8) -> bool {
        if self.pos < self.end() && self.data[self.pos] == c {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn lex_arg_quoted(&mut self, delim: u8) -> Result<String, LitError> {
        let mut out = Vec::new();
        while self.pos != self.end() {
            let c = self.eat();
            if c == delim {
                return Ok(String::from_utf8_lossy(&out).to_string());
            } else if c == b'\\' && delim == b'"' {
                if self.pos == self.end() {
                    return Ok(String::from_utf8_lossy(&out).to_string());
                }
                let nc = self.eat();
                if nc == b'"' {
                    out.push(b'"');
                } else if nc == b'\\' {
                    out.push(b'\\');
                } else {
                    out.push(b'\\');
                    out.push(nc);
                }
            } else {
                out.push(c);
            }
        }
        Err(LitError::value("missing quote character"))
    }

    fn lex_arg(&mut self, first: u8) -> Result<LexItem, LitError> {
        let mut out = Vec::new();
        let mut unquoted_glob = false;

        if first == b'\'' || first == b'"' {
            out.extend(self.lex_arg_quoted(first)?.into_bytes());
        } else {
            out.push(first);
        }

        while self.pos != self.end() {
            let c = self.look();
            if c.is_ascii_whitespace() || c == b'|' || c == b'&' || c == b';' {
                break;
            } else if c == b'>' || c == b'<' {
                // An integer-prefixed arg immediately followed by a redirect
                // operator becomes a single redirect token carrying the fd.
                let as_str = String::from_utf8_lossy(&out).to_string();
                match as_str.parse::<i32>() {
                    Ok(fd) => {
                        let op_token = self.lex_one_token()?;
                        if let LexItem::Token(t) = op_token {
                            return Ok(LexItem::Token(Token { text: t.text, kind: TokenKind::IntPrefix(fd) }));
                        }
                        unreachable!("redirect lexing always yields a Token");
                    }
                    Err(_) => break,
                }
            } else if c == b'"' || c == b'\'' {
                self.eat();
                let quoted = self.lex_arg_quoted(c)?;
                if quoted.contains('*') || quoted.contains('?') {
                    // Quoted glob characters are NOT glob-active; fall
                    // through as a literal append (matches the original,
                    // which only toggles unquoted_glob_char on unquoted
                    // '*'/'?').
                }
                out.extend(quoted.into_bytes());
            } else if !self.win32_escapes && c == b'\\' {
                self.eat();
                if self.pos == self.end() {
                    break;
                }
                out.push(self.eat());
            } else if c == b'*' || c == b'?' {
                unquoted_glob = true;
                out.push(self.eat());
            } else {
                out.push(self.eat());
            }
        }

        let s = String::from_utf8_lossy(&out).to_string();
        if unquoted_glob {
            Ok(LexItem::Glob(s))
        } else {
            Ok(LexItem::Token(Token::normal(s)))
        }
    }

    fn lex_one_token(&mut self) -> Result<LexItem, LitError> {
        let c = self.eat();
        match c {
            b';' => Ok(LexItem::Token(Token::op(";"))),
            b'|' => {
                if self.maybe_eat(b'|') {
                    Ok(LexItem::Token(Token::op("||")))
                } else {
                    Ok(LexItem::Token(Token::op("|")))
                }
            }
            b'&' => {
                if self.maybe_eat(b'&') {
                    Ok(LexItem::Token(Token::op("&&")))
                } else if self.maybe_eat(b'>') {
                    Ok(LexItem::Token(Token::op("&>")))
                } else {
                    Ok(LexItem::Token(Token::op("&")))
                }
            }
            b'>' => {
                if self.maybe_eat(b'&') {
                    Ok(LexItem::Token(Token::op(">&")))
                } else if self.maybe_eat(b'>') {
                    Ok(LexItem::Token(Token::op(">>")))
                } else {
                    Ok(LexItem::Token(Token::op(">")))
                }
            }
            b'<' => {
                if self.maybe_eat(b'&') {
                    Ok(LexItem::Token(Token::op("<&")))
                } else if self.maybe_eat(b'<') {
                    Ok(LexItem::Token(Token::op("<<")))
                } else {
                    Ok(LexItem::Token(Token::op("<")))
                }
            }
            _ => self.lex_arg(c),
        }
    }

    pub fn lex(mut self) -> Result<Vec<LexItem>, LitError> {
        let mut result = Vec::new();
        while self.pos != self.end() {
            if self.look().is_ascii_whitespace() {
                self.eat();
            } else {
                result.push(self.lex_one_token()?);
            }
        }
        Ok(result)
    }
}

/// Tokenize `data` into a flat token stream.
pub fn lex(data: &str, win32_escapes: bool) -> Result<Vec<LexItem>, LitError> {
    ShellLexer::new(data, win32_escapes).lex()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal(s: &str) -> LexItem {
        LexItem::Token(Token::normal(s))
    }

    #[test]
    fn redirect_with_fd_prefix() {
        let toks = lex("a2>c", false).unwrap();
        assert_eq!(
            toks,
            vec![
                normal("a2"),
                LexItem::Token(Token { text: ">".into(), kind: TokenKind::Normal }),
                normal("c"),
            ]
        );
    }

    #[test]
    fn fd_prefix_with_space_before_redirect() {
        let toks = lex("a 2>c", false).unwrap();
        assert_eq!(
            toks,
            vec![
                normal("a"),
                LexItem::Token(Token { text: ">".into(), kind: TokenKind::IntPrefix(2) }),
                normal("c"),
            ]
        );
    }

    #[test]
    fn double_quote_escapes() {
        let toks = lex(r#""hello\"world""#, false).unwrap();
        assert_eq!(toks, vec![normal("hello\"world")]);
    }

    #[test]
    fn single_quote_is_literal() {
        let toks = lex(r#"'a\b*c'"#, false).unwrap();
        assert_eq!(toks, vec![normal(r"a\b*c")]);
    }

    #[test]
    fn unquoted_glob_char_is_glob_item() {
        let toks = lex("*.c", false).unwrap();
        assert_eq!(toks, vec![LexItem::Glob("*.c".to_string())]);
    }

    #[test]
    fn unterminated_quote_is_error() {
        let err = lex("\"unterminated", false).unwrap_err();
        assert!(err.to_string().contains("missing quote character"));
    }

    #[test]
    fn backslash_escapes_next_char_outside_quotes() {
        let toks = lex(r"a\ b", false).unwrap();
        assert_eq!(toks, vec![normal("a b")]);
    }

    #[test]
    fn win32_escapes_mode_treats_backslash_literally() {
        let toks = lex(r"C:\foo", true).unwrap();
        assert_eq!(toks, vec![normal(r"C:\foo")]);
    }

    #[test]
    fn operators_and_sequencing() {
        let toks = lex("a && b || c ; d", false).unwrap();
        assert_eq!(
            toks,
            vec![
                normal("a"),
                LexItem::Token(Token::op("&&")),
                normal("b"),
                LexItem::Token(Token::op("||")),
                normal("c"),
                LexItem::Token(Token::op(";")),
                normal("d"),
            ]
        );
    }
}
