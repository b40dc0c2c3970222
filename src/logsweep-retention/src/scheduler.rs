//! Background scheduling of retention cycles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::CleanerConfig;
use crate::policy::Policy;
use crate::scanner::{CycleReport, Scanner};
use crate::{Result, RetentionError};

/// Cancellation signal shared between a [`CleanerHandle`] and its loop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, condvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`, returning early on cancellation.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        // An unrepresentable deadline waits until cancelled.
        let deadline = Instant::now().checked_add(timeout);
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);

        while !*cancelled {
            let Some(deadline) = deadline else {
                cancelled = condvar.wait(cancelled).unwrap_or_else(PoisonError::into_inner);
                continue;
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            cancelled = condvar
                .wait_timeout(cancelled, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        *cancelled
    }
}

/// A log cleaner bound to one policy.
pub struct Cleaner {
    scanner: Scanner,
}

impl Cleaner {
    /// Validate `config` without starting anything.
    pub fn new(config: CleanerConfig) -> Result<Self> {
        Ok(Self::with_policy(Policy::from_config(config)?))
    }

    pub fn with_policy(policy: Policy) -> Self {
        Self {
            scanner: Scanner::new(policy),
        }
    }

    /// Validate `config` and start the background loop.
    ///
    /// The first cycle starts right away; the loop is running when this
    /// returns.
    pub fn spawn(config: CleanerConfig) -> Result<CleanerHandle> {
        Self::new(config)?.start()
    }

    pub fn policy(&self) -> &Policy {
        self.scanner.policy()
    }

    /// Run a single cycle on the calling thread.
    pub fn run_once(&self) -> CycleReport {
        self.scanner.scan()
    }

    /// Start the cleaner on a dedicated thread.
    pub fn start(self) -> Result<CleanerHandle> {
        let token = CancellationToken::new();
        let cycles = Arc::new(AtomicU64::new(0));

        let loop_token = token.clone();
        let loop_cycles = Arc::clone(&cycles);
        let name = format!("logsweep-{}", self.policy().prefix());

        let thread = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run_loop(&loop_token, &loop_cycles))
            .map_err(RetentionError::Spawn)?;

        Ok(CleanerHandle {
            name,
            token,
            cycles,
            thread: Some(thread),
        })
    }

    fn run_loop(&self, token: &CancellationToken, cycles: &AtomicU64) {
        let policy = self.policy();
        info!(
            path = %policy.dir().display(),
            prefix = %policy.prefix(),
            interval_secs = policy.interval().as_secs(),
            reserve_secs = policy.reserve().as_secs(),
            "Log cleaner started"
        );

        loop {
            self.run_once();
            cycles.fetch_add(1, Ordering::SeqCst);

            if token.wait_timeout(policy.interval()) {
                break;
            }
        }

        info!(path = %policy.dir().display(), "Log cleaner stopped");
    }
}

/// Handle for controlling a running cleaner.
///
/// Dropping the handle stops the cleaner.
pub struct CleanerHandle {
    name: String,
    token: CancellationToken,
    cycles: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl CleanerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token observed by the loop; cancelling it stops the cleaner after the
    /// current cycle.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Cancel the loop and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(cleaner = %self.name, "Log cleaner thread panicked");
            } else {
                debug!(cleaner = %self.name, "Log cleaner joined");
            }
        }
    }

    /// Check if the cleaner thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CleanerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
