//! ShellParse: builds a Seq/Pipeline/Command tree from the lexer's token
//! stream. Ported from `ShellUtil.cpp`'s `ShParser`.

use super::ast::{Arg, Command, CommandTree, Pipeline, Redirect, SeqOp};
use super::lexer::{lex, LexItem, TokenKind};
use crate::error::LitError;

const SEQ_OPERATORS: &[&str] = &[";", "&", "&&", "||"];
const PIPELINE_TERMINATORS: &[&str] = &["|", ";", "&", "||", "&&"];
const ALL_OPERATOR_TEXTS: &[&str] =
    &[";", "|", "&", "||", "&&", "&>", ">", ">>", ">&", "<", "<&", "<<"];

struct ShellParser {
    tokens: Vec<LexItem>,
    pos: usize,
    pipe_error: bool,
}

impl ShellParser {
    fn look(&self) -> Option<&LexItem> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<LexItem> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn parse_command(&mut self) -> Result<Command, LitError> {
        let first = self.advance().ok_or_else(|| LitError::value("empty command!"))?;
        let mut args = vec![match first {
            LexItem::Token(t) => Arg::Literal(t.text),
            LexItem::Glob(g) => Arg::Glob(g),
        }];
        let mut redirects = Vec::new();

        loop {
            match self.look() {
                None => break,
                Some(LexItem::Glob(_)) => {
                    if let Some(LexItem::Glob(g)) = self.advance() {
                        args.push(Arg::Glob(g));
                    }
                    continue;
                }
                Some(LexItem::Token(t)) => {
                    // A token is operator-like if it carries an fd prefix
                    // (always a redirect) or its bare text is one of the
                    // known operator spellings. A quoted literal that
                    // happens to spell an operator (e.g. an argument that
                    // is literally `"|"`) is indistinguishable from a bare
                    // operator under this scheme; this mirrors the
                    // original's own ambiguity and is not exercised by any
                    // RUN line in practice.
                    let is_operator =
                        matches!(t.kind, TokenKind::IntPrefix(_)) || ALL_OPERATOR_TEXTS.contains(&t.text.as_str());
                    if !is_operator {
                        if let Some(LexItem::Token(t)) = self.advance() {
                            args.push(Arg::Literal(t.text));
                        }
                        continue;
                    }
                    if PIPELINE_TERMINATORS.contains(&t.text.as_str()) && matches!(t.kind, TokenKind::Normal) {
                        break;
                    }
                    // A redirect operator (possibly fd-prefixed).
                    let op_tok = match self.advance() {
                        Some(LexItem::Token(t)) => t,
                        _ => unreachable!(),
                    };
                    let arg_tok = self.advance();
                    let target = match arg_tok {
                        Some(LexItem::Token(t)) => t.text,
                        Some(LexItem::Glob(g)) => g,
                        None => {
                            return Err(LitError::value(format!(
                                "syntax error near token '{}'",
                                op_tok.text
                            )))
                        }
                    };
                    let fd = match op_tok.kind {
                        TokenKind::IntPrefix(n) => Some(n),
                        TokenKind::Normal => None,
                    };
                    redirects.push(Redirect { op: op_tok.text, fd, target });
                }
            }
        }

        Ok(Command { args, redirects })
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, LitError> {
        let mut commands = vec![self.parse_command()?];
        loop {
            match self.look() {
                Some(LexItem::Token(t)) if t.text == "|" && matches!(t.kind, TokenKind::Normal) => {
                    self.advance();
                    commands.push(self.parse_command()?);
                }
                _ => break,
            }
        }
        Ok(Pipeline { commands, negate: false, pipe_error: self.pipe_error })
    }

    fn parse(&mut self) -> Result<CommandTree, LitError> {
        let mut lhs = CommandTree::Pipeline(self.parse_pipeline()?);
        loop {
            match self.look() {
                Some(LexItem::Token(t)) if SEQ_OPERATORS.contains(&t.text.as_str()) => {
                    let op_text = t.text.clone();
                    self.advance();
                    if self.look().is_none() {
                        return Err(LitError::value(format!("missing argument to operator {}", op_text)));
                    }
                    let op = SeqOp::from_str(&op_text).expect("checked against SEQ_OPERATORS");
                    let rhs = CommandTree::Pipeline(self.parse_pipeline()?);
                    lhs = CommandTree::Seq(Box::new(lhs), op, Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }
}

/// Parse `data` (already-substituted shell text) into a command tree.
/// `pipe_fail` is the enclosing config's `pipefail` flag, applied to every
/// Pipeline node produced.
pub fn parse(data: &str, win32_escapes: bool, pipe_fail: bool) -> Result<CommandTree, LitError> {
    let tokens = lex(data, win32_escapes)?;
    let mut parser = ShellParser { tokens, pos: 0, pipe_error: pipe_fail };
    parser.parse()
}
