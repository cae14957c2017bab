use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Per-run counters of the project driver, shared across rayon workers.
/// Cloning shares state.
#[derive(Clone, Default)]
pub struct ExtractionProgress {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    files_total: AtomicUsize,
    files_processed: AtomicUsize,
    entities_extracted: AtomicUsize,
    errors: AtomicUsize,
    // Start and end of the current run.
    span: Mutex<(Option<Instant>, Option<Instant>)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub is_active: bool,
    pub files_total: usize,
    pub files_processed: usize,
    pub entities_extracted: usize,
    pub errors: usize,
    pub elapsed_ms: u64,
}

impl ExtractionProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the counters for a run over `total_files` files.
    pub fn start(&self, total_files: usize) {
        let c = &self.inner;
        c.files_total.store(total_files, Ordering::Release);
        c.files_processed.store(0, Ordering::Release);
        c.entities_extracted.store(0, Ordering::Release);
        c.errors.store(0, Ordering::Release);
        if let Ok(mut span) = c.span.lock() {
            *span = (Some(Instant::now()), None);
        }
    }

    pub fn inc(&self, entity_count: usize) {
        self.inner.files_processed.fetch_add(1, Ordering::Relaxed);
        self.inner.entities_extracted.fetch_add(entity_count, Ordering::Relaxed);
    }

    pub fn inc_error(&self) {
        self.inner.files_processed.fetch_add(1, Ordering::Relaxed);
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn finish(&self) {
        if let Ok(mut span) = self.inner.span.lock() {
            if span.0.is_some() {
                span.1 = Some(Instant::now());
            }
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let (is_active, elapsed) = match self.inner.span.lock() {
            Ok(span) => match *span {
                (Some(start), None) => (true, start.elapsed()),
                (Some(start), Some(end)) => (false, end.duration_since(start)),
                _ => (false, Duration::ZERO),
            },
            Err(_) => (false, Duration::ZERO),
        };

        ProgressSnapshot {
            is_active,
            files_total: self.inner.files_total.load(Ordering::Acquire),
            files_processed: self.inner.files_processed.load(Ordering::Acquire),
            entities_extracted: self.inner.entities_extracted.load(Ordering::Acquire),
            errors: self.inner.errors.load(Ordering::Acquire),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}
