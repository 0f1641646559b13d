//! Scroll-driven trigger for incremental loading.
//!
//! A [`ScrollTrigger`] owns a background task fed with scroll metrics. Each
//! burst of scroll events is coalesced into one evaluation per frame and then
//! debounced; the load fires only when the viewport is within the threshold of
//! the document bottom and the loader is idle. Dropping the trigger cancels the
//! pending frame wait, the debounce timer and any load it started.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::feed::assembly::FeedView;
use crate::feed::loader::PageFetcher;
use crate::state::{LoaderPhase, ScrollMetrics};

/// Timing and distance parameters of a scroll trigger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerConfig {
    /// Load when the distance to the document bottom drops below this.
    pub threshold: f64,
    /// Coalescing interval standing in for one animation frame.
    pub frame: Duration,
    /// Quiet period required after the last scroll event.
    pub debounce: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 300.0,
            frame: Duration::from_millis(16),
            debounce: Duration::from_millis(100),
        }
    }
}

/// What: Decide whether a settled scroll position should load another page.
///
/// Inputs:
/// - `metrics`: Latest scroll metrics
/// - `threshold`: Distance to bottom below which loading starts
/// - `phase`: Current loader phase
///
/// Output:
/// - `true` only when the loader is idle and the viewport is near the bottom.
#[must_use]
pub fn should_load(metrics: ScrollMetrics, threshold: f64, phase: LoaderPhase) -> bool {
    phase == LoaderPhase::Idle && metrics.distance_to_bottom() < threshold
}

/// Scoped scroll listener bound to one feed view.
///
/// The listener lives exactly as long as this value.
pub struct ScrollTrigger {
    /// Latest scroll metrics; receivers only observe the newest value.
    tx: watch::Sender<ScrollMetrics>,
    /// Background evaluation task.
    task: JoinHandle<()>,
}

impl ScrollTrigger {
    /// What: Start listening for scroll updates of `view`.
    ///
    /// Inputs:
    /// - `view`: Feed whose loader is driven
    /// - `config`: Threshold and timing
    ///
    /// Output:
    /// - Trigger guard; drop it (or call [`teardown`](Self::teardown)) to stop.
    ///
    /// Details:
    /// - Must be called from within a Tokio runtime.
    #[must_use]
    pub fn install<F: PageFetcher>(view: FeedView<F>, config: TriggerConfig) -> Self {
        let (tx, rx) = watch::channel(ScrollMetrics::default());
        let key = view.key();
        let task = tokio::spawn(run(view, rx, config));
        debug!(kind = key.kind.as_config_key(), "scroll trigger installed");
        Self { tx, task }
    }

    /// What: Report the current scroll position.
    ///
    /// Inputs:
    /// - `metrics`: Scroll offset, viewport and document height
    ///
    /// Details:
    /// - Unchanged metrics are ignored so repeated reports do not keep
    ///   restarting the debounce timer.
    pub fn on_scroll(&self, metrics: ScrollMetrics) {
        self.tx.send_if_modified(|current| {
            if *current == metrics {
                false
            } else {
                *current = metrics;
                true
            }
        });
    }

    /// Whether the background task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop listening now. Equivalent to dropping the trigger.
    pub fn teardown(self) {
        drop(self);
    }
}

impl Drop for ScrollTrigger {
    fn drop(&mut self) {
        self.task.abort();
        trace!("scroll trigger torn down");
    }
}

/// Evaluation loop: wait for scroll, coalesce per frame, debounce, evaluate.
async fn run<F: PageFetcher>(
    view: FeedView<F>,
    mut rx: watch::Receiver<ScrollMetrics>,
    config: TriggerConfig,
) {
    loop {
        if rx.changed().await.is_err() {
            return;
        }
        sleep(config.frame).await;
        loop {
            tokio::select! {
                () = sleep(config.debounce) => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    sleep(config.frame).await;
                }
            }
        }
        let metrics = *rx.borrow_and_update();
        let phase = view.phase();
        if should_load(metrics, config.threshold, phase) {
            let outcome = view.load_more().await;
            debug!(?outcome, "scroll-triggered load settled");
        } else {
            trace!(
                distance = metrics.distance_to_bottom(),
                ?phase,
                "scroll settled without loading"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::feed::assembly::FeedOptions;
    use crate::feed::loader::LoaderConfig;
    use crate::state::{ItemKind, QueryKey};
    use crate::test_utils::{RecordingNotifier, ScriptedFetcher, items};

    fn view(fetcher: ScriptedFetcher) -> FeedView<ScriptedFetcher> {
        FeedView::new(
            QueryKey::kind(ItemKind::Channel),
            fetcher,
            LoaderConfig {
                page_size: 2,
                initial_page: 1,
            },
            FeedOptions::default(),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn near_bottom(offset: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_offset: offset,
            viewport_height: 500.0,
            document_height: 1000.0,
        }
    }

    #[test]
    /// What: Trigger condition needs both proximity and an idle loader
    fn should_load_requires_idle_and_proximity() {
        let close = near_bottom(450.0);
        let far = near_bottom(0.0);
        assert!(should_load(close, 300.0, LoaderPhase::Idle));
        assert!(!should_load(far, 300.0, LoaderPhase::Idle));
        assert!(!should_load(close, 300.0, LoaderPhase::Loading));
        assert!(!should_load(close, 300.0, LoaderPhase::Errored));
        assert!(!should_load(close, 300.0, LoaderPhase::Exhausted));
    }

    #[tokio::test(start_paused = true)]
    /// What: A burst of scroll events produces one load after the debounce
    ///
    /// - Input: Ten near-bottom events 5ms apart
    /// - Output: No fetch before the quiet period; exactly one fetch after it
    async fn burst_is_coalesced_into_one_load() {
        let fetcher = ScriptedFetcher::new().then_ok(items(0, 2)).then_ok(items(2, 2));
        let trigger = ScrollTrigger::install(view(fetcher.clone()), TriggerConfig::default());
        for i in 0..10 {
            trigger.on_scroll(near_bottom(400.0 + f64::from(i)));
            sleep(Duration::from_millis(5)).await;
        }
        sleep(Duration::from_millis(50)).await;
        assert!(fetcher.calls().is_empty());
        sleep(Duration::from_millis(200)).await;
        assert_eq!(fetcher.calls(), vec![1]);
        assert!(trigger.is_active());
    }

    #[tokio::test(start_paused = true)]
    /// What: Settling far from the bottom does not load
    async fn far_from_bottom_does_not_load() {
        let fetcher = ScriptedFetcher::new().then_ok(items(0, 2));
        let trigger = ScrollTrigger::install(view(fetcher.clone()), TriggerConfig::default());
        trigger.on_scroll(near_bottom(0.0));
        sleep(Duration::from_millis(500)).await;
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    /// What: Teardown before the debounce elapses cancels the pending evaluation
    async fn teardown_cancels_pending_evaluation() {
        let fetcher = ScriptedFetcher::new().then_ok(items(0, 2));
        let trigger = ScrollTrigger::install(view(fetcher.clone()), TriggerConfig::default());
        trigger.on_scroll(near_bottom(450.0));
        sleep(Duration::from_millis(30)).await;
        trigger.teardown();
        sleep(Duration::from_millis(500)).await;
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    /// What: An errored loader is not retried by scrolling
    async fn errored_loader_is_not_retried_by_scroll() {
        let fetcher = ScriptedFetcher::new().then_err("offline").then_ok(items(0, 2));
        let v = view(fetcher.clone());
        let _ = v.load_more().await;
        assert_eq!(v.phase(), LoaderPhase::Errored);
        let trigger = ScrollTrigger::install(v.clone(), TriggerConfig::default());
        trigger.on_scroll(near_bottom(450.0));
        sleep(Duration::from_millis(500)).await;
        assert_eq!(fetcher.calls(), vec![1]);
        drop(trigger);
    }

    #[tokio::test(start_paused = true)]
    /// What: Repeating identical metrics does not postpone the load
    async fn identical_metrics_do_not_restart_debounce() {
        let fetcher = ScriptedFetcher::new().then_ok(items(0, 2));
        let trigger = ScrollTrigger::install(view(fetcher.clone()), TriggerConfig::default());
        let m = near_bottom(450.0);
        for _ in 0..20 {
            trigger.on_scroll(m);
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(fetcher.calls(), vec![1]);
    }
}
