//! Progress reporting and cooperative cancellation.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Receives progress from a running import.
pub trait ImportObserver: Send + Sync {
    /// Percentage in `0..=100`, never decreasing within one import.
    fn on_progress(&self, percent: u8);

    fn on_log(&self, line: &str);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ImportObserver for NoopObserver {
    fn on_progress(&self, _percent: u8) {}

    fn on_log(&self, _line: &str) {}
}

/// Observer built from two closures.
pub struct FnObserver<P, L> {
    progress: P,
    log: L,
}

impl<P, L> FnObserver<P, L>
where
    P: Fn(u8) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    pub fn new(progress: P, log: L) -> Self {
        Self { progress, log }
    }
}

impl<P, L> ImportObserver for FnObserver<P, L>
where
    P: Fn(u8) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, percent: u8) {
        (self.progress)(percent)
    }

    fn on_log(&self, line: &str) {
        (self.log)(line)
    }
}

/// Clamps and de-duplicates progress before it reaches the observer, and
/// mirrors log lines to the `log` facade.
pub(crate) struct Progress<'o> {
    observer: &'o dyn ImportObserver,
    segment: String,
    last: Option<u8>,
}

impl<'o> Progress<'o> {
    pub(crate) fn new(observer: &'o dyn ImportObserver, segment: String) -> Self {
        Self {
            observer,
            segment,
            last: None,
        }
    }

    pub(crate) fn set(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        self.observer.on_progress(percent);
    }

    /// Position `done / total` of the way from `from` to `to`.
    pub(crate) fn span(&mut self, from: u8, to: u8, done: usize, total: usize) {
        let total = total.max(1);
        let step = usize::from(to.saturating_sub(from)) * done.min(total) / total;
        self.set(from.saturating_add(u8::try_from(step).unwrap_or(u8::MAX)));
    }

    pub(crate) fn log(&self, line: &str) {
        log::info!("{}: {line}", self.segment);
        self.observer.on_log(line);
    }
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn as_atomic(&self) -> &AtomicBool {
        &self.0
    }
}
