//! Counting semaphore used to cap concurrency within a parallelism group.
//! Ported from `Semaphore.h`, which is a textbook condvar-guarded counter;
//! the only behavioral requirement carried over is that `wait` blocks while
//! the count is zero and `notify` wakes exactly one waiter.

use std::sync::{Condvar, Mutex};

pub struct Semaphore {
    count: Mutex<u64>,
    condvar: Condvar,
}

impl Semaphore {
    pub fn new(value: u64) -> Self {
        Self { count: Mutex::new(value), condvar: Condvar::new() }
    }

    pub fn notify(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.condvar.notify_one();
    }

    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            count = self.condvar.wait(count).unwrap();
        }
        *count -= 1;
    }

    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock().unwrap();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }
}
