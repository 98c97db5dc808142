// ABOUTME: Rate-limits a high-frequency progress producer into a slower consumer.
// ABOUTME: Latest-wins coalescing; stage changes and terminal events pass instantly.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::event::{EventSink, Stage, StageEvent};
use crate::config::ThrottleSettings;

/// Coalesces progress events for one sequencer invocation.
///
/// An event is forwarded immediately when the stage changed, the progress
/// delta reaches `min_change_percent`, or `min_interval` elapsed since the
/// last forward. Anything else is parked as the single pending event
/// (latest wins) and delivered by a deferred timer. Callers must `flush()`
/// after the last raw event of a sequence; state is owned by exactly one
/// invocation and never reused across devices.
pub struct ProgressThrottle {
    shared: Arc<Shared>,
}

struct Shared {
    sink: EventSink,
    min_interval: Duration,
    min_change_percent: u8,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last_forward: Option<Instant>,
    last_progress: Option<u8>,
    last_stage: Option<Stage>,
    pending: Option<StageEvent>,
    timer: Option<tokio::task::JoinHandle<()>>,
    // Generation guard: a timer that lost a cancellation race must not
    // deliver on behalf of a newer arm.
    timer_generation: u64,
}

impl ProgressThrottle {
    pub fn new(sink: EventSink, settings: &ThrottleSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                sink,
                min_interval: settings.min_interval,
                min_change_percent: settings.min_change_percent,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    /// Offer one raw event. Must be called from within a Tokio runtime.
    pub fn offer(&self, event: StageEvent) {
        let forwarded = {
            let mut inner = self.shared.inner.lock();

            let stage_changed = inner.last_stage != Some(event.stage);
            let delta = match inner.last_progress {
                Some(last) => event.progress.abs_diff(last),
                None => u8::MAX,
            };
            let elapsed = inner
                .last_forward
                .is_none_or(|t| t.elapsed() >= self.shared.min_interval);

            if stage_changed || delta >= self.shared.min_change_percent || elapsed {
                Self::cancel_timer(&mut inner);
                inner.pending = None;
                Self::mark_forwarded(&mut inner, &event);
                Some(event)
            } else {
                inner.pending = Some(event);
                if inner.timer.is_none() {
                    inner.timer_generation += 1;
                    let generation = inner.timer_generation;
                    let shared = Arc::clone(&self.shared);
                    inner.timer = Some(tokio::spawn(async move {
                        tokio::time::sleep(shared.min_interval).await;
                        Shared::fire_timer(&shared, generation);
                    }));
                }
                None
            }
        };

        // The sink runs user code; never hold the lock across it.
        if let Some(event) = forwarded {
            (self.shared.sink)(event);
        }
    }

    /// Deliver any parked event right away.
    ///
    /// Guarantees the terminal event of a sequence is never lost to
    /// coalescing.
    pub fn flush(&self) {
        let forwarded = {
            let mut inner = self.shared.inner.lock();
            Self::cancel_timer(&mut inner);
            let pending = inner.pending.take();
            if let Some(ref event) = pending {
                Self::mark_forwarded(&mut inner, event);
            }
            pending
        };
        if let Some(event) = forwarded {
            (self.shared.sink)(event);
        }
    }

    /// Progress value of the most recently forwarded event, if any.
    pub fn last_progress(&self) -> Option<u8> {
        self.shared.inner.lock().last_progress
    }

    fn cancel_timer(inner: &mut Inner) {
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.timer_generation += 1;
    }

    fn mark_forwarded(inner: &mut Inner, event: &StageEvent) {
        inner.last_forward = Some(Instant::now());
        inner.last_progress = Some(event.progress);
        inner.last_stage = Some(event.stage);
    }
}

impl Shared {
    fn fire_timer(shared: &Arc<Shared>, generation: u64) {
        let forwarded = {
            let mut inner = shared.inner.lock();
            if inner.timer_generation != generation {
                return;
            }
            inner.timer = None;
            let pending = inner.pending.take();
            if let Some(ref event) = pending {
                ProgressThrottle::mark_forwarded(&mut inner, event);
            }
            pending
        };
        if let Some(event) = forwarded {
            (shared.sink)(event);
        }
    }
}
