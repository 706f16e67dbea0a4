use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use lit::cli::{Cli, EXIT_FATAL, EXIT_FAILURES, EXIT_OK};
use lit::config::{LitConfig, TableConfigLoader};
use lit::discovery::discover_tests;
use lit::formats::{ShTestFormat, TestFormat};
use lit::reporter::{render_json, render_junit, render_summary, SummaryOptions};
use lit::scheduler::{self, SchedulerOptions};
use lit::test::{ResultCode, Test, TestResult};

/// Stands in for a real test format when `--no-execute` is given: every
/// test is reported PASS without ever touching the filesystem or spawning
/// a shell.
struct NoExecuteFormat;

impl TestFormat for NoExecuteFormat {
    fn execute(&self, _test: &Test, _lit_config: &LitConfig) -> TestResult {
        TestResult::new(ResultCode::Pass, "").with_elapsed(0.0)
    }
}

fn parse_params(raw: &[String]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for entry in raw {
        match entry.split_once('=') {
            Some((key, value)) => {
                params.insert(key.to_string(), value.to_string());
            }
            None => {
                params.insert(entry.clone(), String::new());
            }
        }
    }
    params
}

fn progress_line(test: &Test, result: &TestResult, cli: &Cli) -> Option<String> {
    if cli.quiet && !result.code.is_failure() {
        return None;
    }
    if cli.succinct && !result.code.is_failure() {
        return None;
    }
    let mut line = format!("{}: {}", result.code.name(), test.display_name());
    if cli.show_all || (cli.verbose && result.code.is_failure()) {
        if !result.output.is_empty() {
            line.push('\n');
            line.push_str(&result.output);
        }
    }
    Some(line)
}

fn main() {
    let cli = Cli::parse();
    let _params = parse_params(&cli.param);

    let config_loader = Arc::new(TableConfigLoader::new());
    let mut lit_config = LitConfig::new(config_loader);
    lit_config.is_debug = cli.debug;
    lit_config.is_quiet = cli.quiet;

    let mut tests = match discover_tests(&cli.inputs, &lit_config, None) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("lit: error: {e}");
            std::process::exit(EXIT_FATAL);
        }
    };

    if let Some(pattern) = &cli.filter {
        let re = match regex_lite::Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                eprintln!("lit: error: invalid --filter regex: {e}");
                std::process::exit(EXIT_FATAL);
            }
        };
        tests.retain(|t| re.is_match(&t.display_name()));
    }

    if let (Some(num_shards), Some(run_shard)) = (cli.num_shards, cli.run_shard) {
        if num_shards == 0 || run_shard == 0 || run_shard > num_shards {
            eprintln!("lit: error: --run-shard must be in 1..=--num-shards");
            std::process::exit(EXIT_FATAL);
        }
        tests = tests
            .into_iter()
            .enumerate()
            .filter(|(i, _)| (*i as u64) % num_shards == run_shard - 1)
            .map(|(_, t)| t)
            .collect();
    }

    if let Some(max) = cli.max_tests {
        tests.truncate(max);
    }

    if cli.timeout > 0 {
        for test in &mut tests {
            let mut config = (*test.config).clone();
            config.max_individual_test_time = cli.timeout;
            test.config = Arc::new(config);
        }
    }

    let lit_config = Arc::new(lit_config);

    let format: Arc<dyn TestFormat> =
        if cli.no_execute { Arc::new(NoExecuteFormat) } else { Arc::new(ShTestFormat::new()) };

    let workers = cli.threads.unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

    let opts = SchedulerOptions {
        workers,
        max_failures: cli.max_failures,
        total_time_budget: cli.max_time.map(Duration::from_secs),
        shuffle: cli.shuffle,
        incremental: cli.incremental,
    };

    let progress_cli = cli.clone();
    let start = Instant::now();
    let results = scheduler::run(tests, format, Arc::clone(&lit_config), opts, HashMap::new(), move |test, result| {
        if let Some(line) = progress_line(test, result, &progress_cli) {
            eprintln!("{line}");
        }
    });
    let elapsed = start.elapsed().as_secs_f64();

    if let Some(path) = &cli.xunit_xml_output {
        let xml = render_junit(&results);
        if let Err(e) = std::fs::write(path, xml) {
            eprintln!("lit: error: could not write xunit output to {path}: {e}");
            std::process::exit(EXIT_FATAL);
        }
    }

    if let Some(path) = &cli.output {
        let json = render_json(env!("CARGO_PKG_VERSION"), elapsed, &results);
        if let Err(e) = std::fs::write(path, json) {
            eprintln!("lit: error: could not write json output to {path}: {e}");
            std::process::exit(EXIT_FATAL);
        }
    }

    if !cli.succinct {
        let summary = render_summary(&results, &SummaryOptions { quiet: cli.quiet });
        if !summary.is_empty() {
            print!("{summary}");
        }
    }

    if cli.time_tests {
        println!("Total Run Time: {elapsed:.2}s");
    }

    let any_failures = results.iter().any(|(_, r)| r.code.is_failure());
    std::process::exit(if any_failures { EXIT_FAILURES } else { EXIT_OK });
}
