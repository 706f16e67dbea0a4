//! Scheduler: a worker pool of OS threads draining a shared queue of
//! Tests, enforcing a parallelism-group cap, a global deadline, and
//! max-failure cancellation. Ported from the concurrency contract in
//! spec.md §4.8/§5 — no direct source file in `original_source/` covers
//! the pool itself (`ThreadPool.h` is a generic executor the original
//! layers this on top of); the worker loop below is this crate's own
//! rendering of that contract in `std::thread` terms.

pub mod semaphore;
pub mod timer;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

use crate::config::LitConfig;
use crate::formats::TestFormat;
use crate::test::{ResultCode, Test, TestResult};
use semaphore::Semaphore;

pub struct SchedulerOptions {
    pub workers: usize,
    pub max_failures: Option<u64>,
    pub total_time_budget: Option<Duration>,
    pub shuffle: bool,
    pub incremental: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self { workers: 1, max_failures: None, total_time_budget: None, shuffle: false, incremental: false }
    }
}

/// Order tests per spec.md §4.8: early tests first, then either
/// lexicographic order, descending mtime (incremental), or a random
/// shuffle.
fn order_tests(mut tests: Vec<Test>, opts: &SchedulerOptions) -> Vec<Test> {
    if opts.shuffle {
        let mut rng = rand::thread_rng();
        tests.shuffle(&mut rng);
        return tests;
    }
    if opts.incremental {
        tests.sort_by_cached_key(|t| {
            let mtime = std::fs::metadata(t.source_path()).and_then(|m| m.modified()).ok();
            std::cmp::Reverse(mtime)
        });
        return tests;
    }
    tests.sort_by(|a, b| {
        let early_a = !a.config.is_early;
        let early_b = !b.config.is_early;
        early_a.cmp(&early_b).then_with(|| a.display_name().cmp(&b.display_name()))
    });
    tests
}

type ProgressCallback = dyn Fn(&Test, &TestResult) + Send + Sync;

struct Shared {
    hit_max_failures: AtomicBool,
    failure_count: AtomicU64,
    max_failures: Option<u64>,
    deadline: Option<Instant>,
    semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
    semaphore_caps: HashMap<String, u64>,
    progress: Mutex<Box<ProgressCallback>>,
}

impl Shared {
    fn semaphore_for(&self, group: &str) -> Option<Arc<Semaphore>> {
        let cap = *self.semaphore_caps.get(group)?;
        let mut sems = self.semaphores.lock().unwrap();
        Some(Arc::clone(sems.entry(group.to_string()).or_insert_with(|| Arc::new(Semaphore::new(cap)))))
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }
}

/// Run `tests` against `format` with `opts.workers` OS threads, publishing
/// each completed Result through `on_result` (always called with the
/// progress mutex held, so callers never see interleaved output).
pub fn run(
    tests: Vec<Test>,
    format: Arc<dyn TestFormat>,
    lit_config: Arc<LitConfig>,
    opts: SchedulerOptions,
    parallelism_groups: HashMap<String, u64>,
    on_result: impl Fn(&Test, &TestResult) + Send + Sync + 'static,
) -> Vec<(Test, TestResult)> {
    let ordered = order_tests(tests, &opts);
    let queue: Arc<Mutex<std::collections::VecDeque<Test>>> = Arc::new(Mutex::new(ordered.into()));
    let workers = opts.workers.max(1).min(queue.lock().unwrap().len().max(1));

    let shared = Arc::new(Shared {
        hit_max_failures: AtomicBool::new(false),
        failure_count: AtomicU64::new(0),
        max_failures: opts.max_failures,
        deadline: opts.total_time_budget.map(|d| Instant::now() + d),
        semaphores: Mutex::new(HashMap::new()),
        semaphore_caps: parallelism_groups,
        progress: Mutex::new(Box::new(on_result)),
    });

    let results: Arc<Mutex<Vec<(Test, TestResult)>>> = Arc::new(Mutex::new(Vec::new()));

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let shared = Arc::clone(&shared);
            let results = Arc::clone(&results);
            let format = Arc::clone(&format);
            let lit_config = Arc::clone(&lit_config);
            scope.spawn(move || worker_loop(queue, shared, results, format, lit_config));
        }
    });

    let remaining: Vec<Test> = {
        let mut q = queue.lock().unwrap();
        q.drain(..).collect()
    };
    for test in remaining {
        let result = TestResult::new(ResultCode::Unresolved, "Test not run").with_elapsed(0.0);
        {
            let cb = shared.progress.lock().unwrap();
            cb(&test, &result);
        }
        results.lock().unwrap().push((test, result));
    }

    Arc::try_unwrap(results).map(|m| m.into_inner().unwrap()).unwrap_or_default()
}

fn worker_loop(
    queue: Arc<Mutex<std::collections::VecDeque<Test>>>,
    shared: Arc<Shared>,
    results: Arc<Mutex<Vec<(Test, TestResult)>>>,
    format: Arc<dyn TestFormat>,
    lit_config: Arc<LitConfig>,
) {
    loop {
        if shared.deadline_passed() {
            return;
        }
        let test = {
            let mut q = queue.lock().unwrap();
            match q.pop_front() {
                Some(t) => t,
                None => return,
            }
        };

        if shared.hit_max_failures.load(Ordering::Acquire) {
            let result = TestResult::new(ResultCode::Unresolved, "skipped: max failures reached").with_elapsed(0.0);
            publish(&shared, &results, test, result);
            continue;
        }

        let group_name = test.config.parallelism_group.as_ref().map(|g| g.resolve(&test));
        let permit = group_name.as_deref().and_then(|g| shared.semaphore_for(g));
        if let Some(sem) = &permit {
            sem.wait();
        }
        let start = Instant::now();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| format.execute(&test, &lit_config)))
            .unwrap_or_else(|e| {
                let msg = if let Some(s) = e.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = e.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                TestResult::new(ResultCode::Unresolved, format!("Exception during script execution:\n{msg}"))
                    .with_elapsed(start.elapsed().as_secs_f64())
            });
        if let Some(sem) = &permit {
            sem.notify();
        }

        if result.code.is_failure() {
            let prev = shared.failure_count.fetch_add(1, Ordering::AcqRel);
            if let Some(max) = shared.max_failures {
                if prev + 1 >= max {
                    shared.hit_max_failures.store(true, Ordering::Release);
                }
            }
        }

        publish(&shared, &results, test, result);
    }
}

fn publish(shared: &Shared, results: &Arc<Mutex<Vec<(Test, TestResult)>>>, test: Test, result: TestResult) {
    {
        let cb = shared.progress.lock().unwrap();
        cb(&test, &result);
    }
    results.lock().unwrap().push((test, result));
}
