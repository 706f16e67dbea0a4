//! TimeoutHelper: kills the processes registered to it once a per-test
//! deadline elapses. Ported from `BasicTimer.cpp`/`TimeoutHelper.cpp`: the
//! original spins a dedicated thread that sleeps on a condvar and, on
//! timeout, walks a list of tracked pids and kills each one (and its
//! children). `addProcess` has to cope with a process being registered
//! *after* the timer already fired, which is why `kill()` is re-run from
//! the registering thread in that case.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

struct Inner {
    pids: Vec<u32>,
    timeout_reached: bool,
    done_kill_pass: bool,
}

/// Tracks the child processes spawned while executing one test's RUN lines
/// and kills them all if `timeout` elapses before the test finishes.
pub struct TimeoutHelper {
    timeout: Duration,
    inner: Mutex<Inner>,
    condvar: Condvar,
}

impl TimeoutHelper {
    pub fn new(timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            timeout,
            inner: Mutex::new(Inner { pids: Vec::new(), timeout_reached: false, done_kill_pass: false }),
            condvar: Condvar::new(),
        })
    }

    pub fn active(&self) -> bool {
        !self.timeout.is_zero()
    }

    pub fn timeout_reached(&self) -> bool {
        self.inner.lock().unwrap().timeout_reached
    }

    /// Spawn the background timer thread. Returns immediately; the thread
    /// joins implicitly once `cancel` wakes it or the timeout fires.
    pub fn start(self: &Arc<Self>) {
        if !self.active() {
            return;
        }
        let this = Arc::clone(self);
        std::thread::spawn(move || {
            let guard = this.inner.lock().unwrap();
            let (_guard, timeout_result) = this.condvar.wait_timeout(guard, this.timeout).unwrap();
            if timeout_result.timed_out() {
                drop(_guard);
                this.handle_timeout_reached();
            }
        });
    }

    /// Stop the timer without killing anything (the test finished on its
    /// own). Safe to call even if the timer already fired.
    pub fn cancel(&self) {
        self.condvar.notify_all();
    }

    /// Register a freshly spawned child pid so the timer can kill it. If
    /// the timeout already fired before this call, kill it immediately.
    pub fn add_process(&self, pid: u32) {
        if !self.active() {
            return;
        }
        let need_kill = {
            let mut inner = self.inner.lock().unwrap();
            inner.pids.push(pid);
            inner.done_kill_pass
        };
        if need_kill {
            self.kill();
        }
    }

    fn handle_timeout_reached(&self) {
        self.inner.lock().unwrap().timeout_reached = true;
        self.kill();
    }

    fn kill(&self) {
        let pids = {
            let mut inner = self.inner.lock().unwrap();
            inner.done_kill_pass = true;
            std::mem::take(&mut inner.pids)
        };
        for pid in pids {
            kill_process_group(pid);
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    unsafe {
        libc::kill(-(pid as i32), libc::SIGKILL);
        libc::kill(pid as i32, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_when_timeout_is_zero() {
        let helper = TimeoutHelper::new(Duration::from_secs(0));
        assert!(!helper.active());
        helper.add_process(999999);
        assert!(!helper.timeout_reached());
    }

    #[test]
    fn cancel_before_deadline_leaves_timeout_unreached() {
        let helper = TimeoutHelper::new(Duration::from_secs(5));
        helper.start();
        helper.cancel();
        std::thread::sleep(Duration::from_millis(50));
        assert!(!helper.timeout_reached());
    }
}
