#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use indexer_core::api::{RunContext, SharedTask, Task, TaskResult};

/// Payload that records which tasks touched it, in call order.
#[derive(Default)]
pub struct Journal {
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Journal {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, task: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == task).count()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self, task: &str) {
        self.calls.lock().unwrap().push(task.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Task that records itself on the journal, optionally sleeps, then
/// succeeds or fails with a fixed message.
pub struct Scripted {
    name: String,
    fail: Option<String>,
    delay: Duration,
    fail_on_cancel: bool,
}

#[async_trait]
impl Task<Journal> for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &RunContext, journal: &Journal) -> TaskResult {
        journal.enter(&self.name);
        if !self.delay.is_zero() {
            if let Err(err) = ctx.run_until_cancelled(tokio::time::sleep(self.delay)).await {
                journal.leave();
                if self.fail_on_cancel {
                    return Err(err.into());
                }
                return Ok(());
            }
        }
        journal.leave();
        match &self.fail {
            Some(msg) => Err(anyhow::anyhow!("{msg}")),
            None => Ok(()),
        }
    }
}

pub fn ok(name: &str) -> SharedTask<Journal> {
    Arc::new(Scripted {
        name: name.to_string(),
        fail: None,
        delay: Duration::ZERO,
        fail_on_cancel: false,
    })
}

pub fn err(name: &str, msg: &str) -> SharedTask<Journal> {
    Arc::new(Scripted {
        name: name.to_string(),
        fail: Some(msg.to_string()),
        delay: Duration::ZERO,
        fail_on_cancel: false,
    })
}

pub fn slow(name: &str, delay: Duration) -> SharedTask<Journal> {
    Arc::new(Scripted {
        name: name.to_string(),
        fail: None,
        delay,
        fail_on_cancel: false,
    })
}

/// Like [`slow`], but reports cancellation as its failure.
pub fn cancellable(name: &str, delay: Duration) -> SharedTask<Journal> {
    Arc::new(Scripted {
        name: name.to_string(),
        fail: None,
        delay,
        fail_on_cancel: true,
    })
}
