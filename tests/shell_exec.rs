use lit::shell::env::ShellEnvironment;
use lit::shell::exec::ShellExec;
use lit::shell::parser::parse;

fn run(script: &str, cwd: &std::path::Path) -> lit::shell::exec::ExecOutcome {
    let tree = parse(script, false, false).unwrap();
    let mut env = ShellEnvironment::new(cwd.to_path_buf(), Vec::new());
    ShellExec::new(None).execute(&tree, &mut env)
}

#[test]
fn echo_builtin_captures_stdout() {
    let dir = std::env::temp_dir().join("lit_it_exec_echo");
    std::fs::create_dir_all(&dir).unwrap();
    let outcome = run("echo hi there", &dir);
    assert_eq!(outcome.exit_code, 0);
    assert!(outcome.records[0].stdout.contains("hi there"));
}

#[test]
fn mkdir_then_rm_round_trips_cleanly() {
    let dir = std::env::temp_dir().join("lit_it_exec_mkdir_rm");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let outcome = run("mkdir sub && rm -r sub", &dir);
    assert_eq!(outcome.exit_code, 0);
    assert!(!dir.join("sub").exists());
}

#[test]
fn pipeline_exit_code_is_the_last_stage_by_default() {
    let dir = std::env::temp_dir().join("lit_it_exec_pipeline");
    std::fs::create_dir_all(&dir).unwrap();
    let outcome = run("false | true", &dir);
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn seq_or_short_circuits_when_lhs_succeeds() {
    let dir = std::env::temp_dir().join("lit_it_exec_seq_or");
    std::fs::create_dir_all(&dir).unwrap();
    let outcome = run("true || false", &dir);
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn diff_of_identical_content_exits_zero() {
    let dir = std::env::temp_dir().join("lit_it_exec_diff");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.txt"), "same\n").unwrap();
    std::fs::write(dir.join("b.txt"), "same\n").unwrap();
    let outcome = run("diff a.txt b.txt", &dir);
    assert_eq!(outcome.exit_code, 0);
}
