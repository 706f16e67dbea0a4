//! ShellExec: evaluates a command tree against a `ShellEnvironment`.
//!
//! The original interprets the tree with a mix of `fork`/`exec`, real OS
//! pipes between pipeline stages, and a blocking wait — see the REDESIGN
//! FLAG on coroutine-style process execution in SPEC_FULL.md §9. This port
//! keeps the same truth tables for Seq/Pipeline evaluation but buffers each
//! pipeline stage's stdout in memory and feeds it to the next stage's
//! stdin, rather than wiring a live OS pipe between two child processes;
//! every RUN line this crate is meant to drive produces bounded output, so
//! the two are observationally identical and this avoids a second thread
//! per stage purely to shuttle bytes.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex_lite::Regex;

use super::ast::{Arg, Command, CommandTree, Pipeline, SeqOp};
use super::env::ShellEnvironment;
use super::glob;
use crate::error::LitError;
use crate::scheduler::timer::TimeoutHelper;

const BUILTINS: &[&str] = &["cd", "export", "echo", "mkdir", "rm", "diff"];

/// One executed `Command`'s diagnostic trail, kept regardless of whether
/// the test ultimately passes; the formatter only renders it on failure.
#[derive(Debug, Clone)]
pub struct ExecRecord {
    pub command: Command,
    pub argv: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

pub struct ExecOutcome {
    pub exit_code: i32,
    pub diagnostic: String,
    pub records: Vec<ExecRecord>,
}

enum Sink {
    Captured,
    File(PathBuf, bool),
    Null,
}

struct RedirectPlan {
    stdin_file: Option<PathBuf>,
    stdout: Sink,
    stderr: Sink,
}

fn normalize_target(target: &str) -> PathBuf {
    if target == "/dev/null" {
        PathBuf::from(if cfg!(windows) { "NUL" } else { "/dev/null" })
    } else {
        PathBuf::from(target)
    }
}

fn build_redirect_plan(cmd: &Command, env: &ShellEnvironment) -> RedirectPlan {
    let mut plan = RedirectPlan { stdin_file: None, stdout: Sink::Captured, stderr: Sink::Captured };
    for r in &cmd.redirects {
        let target = env.resolve(&normalize_target(&r.target).to_string_lossy());
        match r.op.as_str() {
            "<" | "<<" => plan.stdin_file = Some(target),
            ">" => match r.fd {
                Some(2) => plan.stderr = Sink::File(target, false),
                _ => plan.stdout = Sink::File(target, false),
            },
            ">>" => match r.fd {
                Some(2) => plan.stderr = Sink::File(target, true),
                _ => plan.stdout = Sink::File(target, true),
            },
            "&>" => {
                plan.stdout = Sink::File(target.clone(), false);
                plan.stderr = Sink::File(target, false);
            }
            ">&" | "<&" => {
                // fd-duplication between streams isn't meaningful once we've
                // already decided to buffer everything in memory; the only
                // case worth special-casing is `2>&1`-style merging of
                // stderr into stdout, which downstream formatting already
                // handles by reading both fields.
            }
            _ => {}
        }
    }
    plan
}

fn apply_sink_file(sink: &Sink) -> std::io::Result<Option<File>> {
    match sink {
        Sink::File(path, append) => {
            let file = OpenOptions::new().write(true).create(true).append(*append).truncate(!*append).open(path)?;
            Ok(Some(file))
        }
        Sink::Null => Ok(Some(File::open(if cfg!(windows) { "NUL" } else { "/dev/null" })?)),
        Sink::Captured => Ok(None),
    }
}

lazy_static! {
    static ref VAR_PATTERN: Regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap();
}

fn substitute_vars(s: &str, env: &ShellEnvironment) -> String {
    VAR_PATTERN
        .replace_all(s, |caps: &regex_lite::Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).unwrap().as_str();
            env.get(name).unwrap_or("").to_string()
        })
        .into_owned()
}

fn resolve_args(cmd: &Command, env: &ShellEnvironment) -> Vec<String> {
    let mut out = Vec::new();
    for arg in &cmd.args {
        match arg {
            Arg::Literal(s) => out.push(s.clone()),
            Arg::Glob(pattern) => out.extend(glob::resolve(pattern, &env.cwd)),
        }
    }
    out
}

fn reconstruct(tree: &CommandTree) -> String {
    match tree {
        CommandTree::Pipeline(p) => reconstruct_pipeline(p),
        CommandTree::Seq(lhs, op, rhs) => {
            format!("{} {} {}", reconstruct(lhs), op.as_str(), reconstruct(rhs))
        }
    }
}

fn reconstruct_pipeline(p: &Pipeline) -> String {
    p.commands
        .iter()
        .map(|c| {
            let mut s = c.args.iter().map(Arg::as_str).collect::<Vec<_>>().join(" ");
            for r in &c.redirects {
                if let Some(fd) = r.fd {
                    s.push_str(&format!(" {}{} {}", fd, r.op, r.target));
                } else {
                    s.push_str(&format!(" {} {}", r.op, r.target));
                }
            }
            s
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

pub struct ShellExec {
    timeout: Option<Arc<TimeoutHelper>>,
    records: Vec<ExecRecord>,
}

impl ShellExec {
    pub fn new(timeout: Option<Arc<TimeoutHelper>>) -> Self {
        Self { timeout, records: Vec::new() }
    }

    pub fn execute(mut self, tree: &CommandTree, env: &mut ShellEnvironment) -> ExecOutcome {
        match self.eval_tree(tree, env) {
            Ok(code) => ExecOutcome { exit_code: code, diagnostic: String::new(), records: self.records },
            Err(e) => {
                let diagnostic = format!("shell parser error on: {}\n{e}", reconstruct(tree));
                ExecOutcome { exit_code: 1, diagnostic, records: self.records }
            }
        }
    }

    fn eval_tree(&mut self, tree: &CommandTree, env: &mut ShellEnvironment) -> Result<i32, LitError> {
        match tree {
            CommandTree::Pipeline(p) => self.eval_pipeline(p, env),
            CommandTree::Seq(lhs, op, rhs) => match op {
                SeqOp::Semi | SeqOp::Amp => {
                    self.eval_tree(lhs, env)?;
                    self.eval_tree(rhs, env)
                }
                SeqOp::AndAnd => {
                    let l = self.eval_tree(lhs, env)?;
                    if l == 0 { self.eval_tree(rhs, env) } else { Ok(l) }
                }
                SeqOp::OrOr => {
                    let l = self.eval_tree(lhs, env)?;
                    if l != 0 { self.eval_tree(rhs, env) } else { Ok(l) }
                }
            },
        }
    }

    fn eval_pipeline(&mut self, p: &Pipeline, env: &mut ShellEnvironment) -> Result<i32, LitError> {
        let mut input: Option<Vec<u8>> = None;
        let mut exits = Vec::with_capacity(p.commands.len());
        for cmd in &p.commands {
            let (exit, stdout_bytes) = self.eval_command(cmd, env, input.take())?;
            exits.push(exit);
            input = Some(stdout_bytes);
        }
        let code = if p.negate {
            if exits.iter().any(|&e| e == 0) { 1 } else { 0 }
        } else if p.pipe_error {
            exits.iter().find(|&&e| e != 0).copied().unwrap_or(0)
        } else {
            *exits.last().unwrap_or(&0)
        };
        Ok(code)
    }

    fn eval_command(
        &mut self,
        cmd: &Command,
        env: &mut ShellEnvironment,
        stdin_bytes: Option<Vec<u8>>,
    ) -> Result<(i32, Vec<u8>), LitError> {
        let argv = resolve_args(cmd, env);
        let program = argv.first().cloned().unwrap_or_default();
        let plan = build_redirect_plan(cmd, env);

        let (exit_code, stdout, stderr) = if BUILTINS.contains(&program.as_str()) {
            self.run_builtin(&program, &argv[1..], env)?
        } else {
            self.run_external(&argv, env, &plan, stdin_bytes.as_deref())
        };

        let stdout_bytes = stdout.clone().into_bytes();
        let forward_bytes = match plan.stdout {
            Sink::Captured => stdout_bytes.clone(),
            _ => Vec::new(),
        };

        let record_stdout = match &plan.stdout {
            Sink::Captured => stdout,
            Sink::File(path, append) => {
                if let Ok(mut f) = OpenOptions::new().write(true).create(true).append(*append).truncate(!*append).open(path) {
                    let _ = f.write_all(stdout_bytes.as_slice());
                }
                String::new()
            }
            Sink::Null => String::new(),
        };
        let record_stderr = match &plan.stderr {
            Sink::Captured => stderr,
            Sink::File(path, append) => {
                if let Ok(mut f) = OpenOptions::new().write(true).create(true).append(*append).truncate(!*append).open(path) {
                    let _ = f.write_all(stderr.as_bytes());
                }
                String::new()
            }
            Sink::Null => String::new(),
        };

        let timed_out = self.timeout.as_ref().map(|t| t.timeout_reached()).unwrap_or(false);
        self.records.push(ExecRecord {
            command: cmd.clone(),
            argv,
            stdout: record_stdout,
            stderr: record_stderr,
            exit_code,
            timed_out,
        });
        Ok((exit_code, forward_bytes))
    }

    fn run_builtin(
        &self,
        name: &str,
        args: &[String],
        env: &mut ShellEnvironment,
    ) -> Result<(i32, String, String), LitError> {
        match name {
            "cd" => {
                if args.len() != 1 {
                    return Err(LitError::value("cd: expected exactly one argument"));
                }
                let target = env.resolve(&args[0]);
                if !target.is_dir() {
                    return Err(LitError::value(format!("cd: not a directory: {}", args[0])));
                }
                env.cwd = target;
                Ok((0, String::new(), String::new()))
            }
            "export" => {
                if args.len() != 1 {
                    return Err(LitError::value("export: expected exactly one KEY=VAL argument"));
                }
                match args[0].split_once('=') {
                    Some((k, v)) => {
                        env.set(k, v);
                        Ok((0, String::new(), String::new()))
                    }
                    None => Err(LitError::value(format!("export: not a KEY=VAL pair: {}", args[0]))),
                }
            }
            "echo" => Ok((0, run_echo(args), String::new())),
            "mkdir" => Ok(run_mkdir(args, env)),
            "rm" => Ok(run_rm(args, env)),
            "diff" => Ok(run_diff(args, env)),
            _ => unreachable!("dispatched only for names in BUILTINS"),
        }
    }

    fn run_external(
        &self,
        argv: &[String],
        env: &ShellEnvironment,
        plan: &RedirectPlan,
        stdin_bytes: Option<&[u8]>,
    ) -> (i32, String, String) {
        if argv.is_empty() {
            return (127, String::new(), "lit: empty command".to_string());
        }
        let program = &argv[0];
        let substituted: Vec<String> = argv[1..].iter().map(|a| substitute_vars(a, env)).collect();

        let mut command = std::process::Command::new(program);
        command.args(&substituted).current_dir(&env.cwd).env_clear().envs(env.as_os_env());

        if let Some(path) = &plan.stdin_file {
            match File::open(path) {
                Ok(f) => {
                    command.stdin(Stdio::from(f));
                }
                Err(e) => return (2, String::new(), format!("lit: cannot open '{}': {e}", path.display())),
            }
        } else if stdin_bytes.is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(c) => c,
            Err(e) => return (127, String::new(), format!("lit: command not found: {program}: {e}")),
        };

        if let Some(helper) = &self.timeout {
            helper.add_process(child.id());
        }

        if let (Some(mut stdin), Some(bytes)) = (child.stdin.take(), stdin_bytes) {
            let bytes = bytes.to_vec();
            let _ = std::thread::spawn(move || {
                let _ = stdin.write_all(&bytes);
            })
            .join();
        }

        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut stdout_buf);
        }
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut stderr_buf);
        }

        let status = match child.wait() {
            Ok(s) => s,
            Err(e) => return (127, stdout_buf, format!("lit: failed waiting for {program}: {e}")),
        };

        let code = exit_code_of(&status);
        (code, stdout_buf, stderr_buf)
    }
}

#[cfg(unix)]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(c) => c,
        None => 128 + status.signal().unwrap_or(0),
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

fn run_echo(args: &[String]) -> String {
    let mut no_newline = false;
    let mut interpret_escapes = false;
    let mut words: Vec<&str> = Vec::new();
    for a in args {
        match a.as_str() {
            "-n" => no_newline = true,
            "-e" => interpret_escapes = true,
            _ => words.push(a),
        }
    }
    let mut s = words.join(" ");
    if interpret_escapes {
        s = s.replace("\\n", "\n").replace("\\t", "\t").replace("\\\\", "\\");
    }
    if !no_newline {
        s.push('\n');
    }
    s
}

fn run_mkdir(args: &[String], env: &ShellEnvironment) -> (i32, String, String) {
    let mut parents = false;
    let mut targets = Vec::new();
    for a in args {
        if a == "-p" {
            parents = true;
        } else {
            targets.push(a.clone());
        }
    }
    for t in &targets {
        let path = env.resolve(t);
        let result = if parents { std::fs::create_dir_all(&path) } else { std::fs::create_dir(&path) };
        if let Err(e) = result {
            return (1, String::new(), format!("mkdir: cannot create directory '{t}': {e}"));
        }
    }
    (0, String::new(), String::new())
}

fn run_rm(args: &[String], env: &ShellEnvironment) -> (i32, String, String) {
    let mut recursive = false;
    let mut force = false;
    let mut targets = Vec::new();
    for a in args {
        match a.as_str() {
            "-r" | "-rf" | "-fr" => recursive = true,
            "-f" => force = true,
            _ if a.starts_with('-') && a.contains('r') => recursive = true,
            _ => targets.push(a.clone()),
        }
    }
    if args.iter().any(|a| a.starts_with('-') && a.contains('f')) {
        force = true;
    }
    for t in &targets {
        let path = env.resolve(t);
        let result = if path.is_dir() {
            if recursive { std::fs::remove_dir_all(&path) } else { std::fs::remove_dir(&path) }
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(e) = result {
            if force {
                continue;
            }
            return (1, String::new(), format!("rm: cannot remove '{t}': {e}"));
        }
    }
    (0, String::new(), String::new())
}

fn run_diff(args: &[String], env: &ShellEnvironment) -> (i32, String, String) {
    let mut ignore_space_change = false;
    let mut ignore_all_space = false;
    let mut paths = Vec::new();
    for a in args {
        match a.as_str() {
            "-b" => ignore_space_change = true,
            "-w" => ignore_all_space = true,
            "-u" | "-r" => {}
            _ => paths.push(a.clone()),
        }
    }
    if paths.len() != 2 {
        return (2, String::new(), "diff: expected exactly two file arguments".to_string());
    }
    let normalize = |s: &str| -> String {
        if ignore_all_space {
            s.split_whitespace().collect::<Vec<_>>().join(" ")
        } else if ignore_space_change {
            let collapsed: Vec<&str> = s.split(' ').filter(|p| !p.is_empty()).collect();
            collapsed.join(" ")
        } else {
            s.to_string()
        }
    };
    let lhs_path = env.resolve(&paths[0]);
    let rhs_path = env.resolve(&paths[1]);
    let lhs = match std::fs::read_to_string(&lhs_path) {
        Ok(s) => s,
        Err(e) => return (2, String::new(), format!("diff: {}: {e}", paths[0])),
    };
    let rhs = match std::fs::read_to_string(&rhs_path) {
        Ok(s) => s,
        Err(e) => return (2, String::new(), format!("diff: {}: {e}", paths[1])),
    };

    let normalized_equal = lhs.lines().map(normalize).eq(rhs.lines().map(normalize));
    if normalized_equal {
        return (0, String::new(), String::new());
    }
    let text_diff = similar::TextDiff::from_lines(&lhs, &rhs);
    let mut out = String::new();
    for group in text_diff.grouped_ops(3) {
        for change in text_diff.iter_changes(&group) {
            let sign = match change.tag() {
                similar::ChangeTag::Delete => "-",
                similar::ChangeTag::Insert => "+",
                similar::ChangeTag::Equal => " ",
            };
            out.push_str(sign);
            out.push_str(change.value());
        }
    }
    (1, out, String::new())
}
