//! Command tree types for the shell sublanguage.
//!
//! Ported from `ShellCommands.h`'s `AbstractCommand`/`Command`/`Pipeline`/
//! `Seq` hierarchy. Where the original used `std::any` to hold either a
//! literal string or a `GlobItem` argument, this is a closed enum per the
//! REDESIGN FLAG in spec.md §9.

/// A single command-line argument: either a literal or an unexpanded glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Literal(String),
    Glob(String),
}

impl Arg {
    pub fn as_str(&self) -> &str {
        match self {
            Arg::Literal(s) => s,
            Arg::Glob(s) => s,
        }
    }
}

/// A redirect operator, optionally carrying an integer fd prefix (`2>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub op: String,
    pub fd: Option<i32>,
    pub target: String,
}

/// A single command: argv plus any redirects attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub args: Vec<Arg>,
    pub redirects: Vec<Redirect>,
}

/// A sequence of commands connected by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub negate: bool,
    pub pipe_error: bool,
}

/// Sequence operator connecting two command trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqOp {
    Semi,
    Amp,
    AndAnd,
    OrOr,
}

impl SeqOp {
    pub fn as_str(self) -> &'static str {
        match self {
            SeqOp::Semi => ";",
            SeqOp::Amp => "&",
            SeqOp::AndAnd => "&&",
            SeqOp::OrOr => "||",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ";" => Some(SeqOp::Semi),
            "&" => Some(SeqOp::Amp),
            "&&" => Some(SeqOp::AndAnd),
            "||" => Some(SeqOp::OrOr),
            _ => None,
        }
    }
}

/// The command-tree sum type: a single pipeline, or a sequence combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandTree {
    Pipeline(Pipeline),
    Seq(Box<CommandTree>, SeqOp, Box<CommandTree>),
}
