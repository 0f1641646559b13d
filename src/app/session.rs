//! Interactive session state: one feed per query key, scroll position and
//! the scroll trigger of the feed on screen.

use std::collections::HashMap;

use crossterm::event::{
    Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use tracing::{debug, info};

use crate::feed::{
    FeedFrame, FeedOptions, FeedView, LoaderConfig, Notice, PageFetcher, ScrollTrigger,
    SharedNotifier, TriggerConfig,
};
use crate::logic::RankingMode;
use crate::state::{LoaderPhase, QueryKey};

/// Builds the page fetcher for a newly opened query key.
pub type FetcherFactory<F> = Box<dyn Fn(QueryKey) -> F + Send + Sync>;

/// Per-session feed parameters.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Pagination of every loader.
    pub loader: LoaderConfig,
    /// Windowing and initial ranking of every view.
    pub options: FeedOptions,
    /// Scroll trigger timing and threshold.
    pub trigger: TriggerConfig,
}

/// Interactive feed session.
pub struct Session<F> {
    /// Feed views opened so far; switching back keeps their pages.
    feeds: HashMap<QueryKey, FeedView<F>>,
    /// Scroll position per feed, in rows.
    scroll: HashMap<QueryKey, f64>,
    /// Feed on screen.
    active: QueryKey,
    /// Ordering policy applied to every feed.
    ranking: RankingMode,
    /// Height of the list area, in rows.
    viewport_rows: f64,
    /// Latest notice delivered to the UI.
    notice: Option<Notice>,
    /// Listener bound to the active feed.
    trigger: Option<ScrollTrigger>,
    /// Creates fetchers for new keys.
    make_fetcher: FetcherFactory<F>,
    /// Sink handed to every view.
    notifier: SharedNotifier,
    /// Feed parameters.
    config: SessionConfig,
}

impl<F: PageFetcher> Session<F> {
    /// What: Create a session and open `initial`.
    ///
    /// Inputs:
    /// - `initial`: Feed shown first
    /// - `config`: Feed parameters; `config.options.ranking` is the starting policy
    /// - `make_fetcher`: Fetcher factory per query key
    /// - `notifier`: Sink for load failures
    ///
    /// Output:
    /// - Session with the first page of `initial` requested.
    ///
    /// Details:
    /// - Must be called from within a Tokio runtime.
    pub fn new(
        initial: QueryKey,
        config: SessionConfig,
        make_fetcher: FetcherFactory<F>,
        notifier: SharedNotifier,
    ) -> Self {
        let mut session = Self {
            feeds: HashMap::new(),
            scroll: HashMap::new(),
            active: initial,
            ranking: config.options.ranking,
            viewport_rows: 0.0,
            notice: None,
            trigger: None,
            make_fetcher,
            notifier,
            config,
        };
        session.activate(initial);
        session
    }

    /// What: Put `key` on screen, creating its feed on first use.
    ///
    /// Inputs:
    /// - `key`: Feed to show
    ///
    /// Details:
    /// - The previous trigger is torn down before the new one is installed.
    /// - An empty idle feed gets its first page requested immediately.
    pub fn activate(&mut self, key: QueryKey) {
        if let Some(old) = self.trigger.take() {
            old.teardown();
        }
        self.active = key;
        let ranking = self.ranking;
        let config = self.config;
        let notifier = self.notifier.clone();
        let make_fetcher = &self.make_fetcher;
        let view = self.feeds.entry(key).or_insert_with(|| {
            info!(kind = key.kind.as_config_key(), category = ?key.category_id, "opening feed");
            FeedView::new(
                key,
                make_fetcher(key),
                config.loader,
                FeedOptions {
                    ranking,
                    ..config.options
                },
                notifier,
            )
        });
        view.set_ranking(ranking);
        self.trigger = Some(ScrollTrigger::install(view.clone(), self.config.trigger));
        let empty = view.loader().with_state(|s| s.items.is_empty());
        if empty && view.phase() == LoaderPhase::Idle {
            let view = view.clone();
            tokio::spawn(async move {
                let outcome = view.load_more().await;
                debug!(?outcome, "initial page settled");
            });
        }
        self.push_metrics();
    }

    /// Show the next listing kind, keeping the category filter.
    pub fn cycle_kind(&mut self) {
        let next = QueryKey {
            kind: self.active.kind.next(),
            ..self.active
        };
        self.activate(next);
    }

    /// Request the page that failed last, if the active feed is errored.
    pub fn retry(&self) {
        let Some(view) = self.feeds.get(&self.active) else {
            return;
        };
        if view.phase() != LoaderPhase::Errored {
            return;
        }
        info!(kind = self.active.kind.as_config_key(), "retrying failed page");
        let view = view.clone();
        tokio::spawn(async move {
            let outcome = view.load_more().await;
            debug!(?outcome, "retry settled");
        });
    }

    /// What: Reload the active feed from its first page.
    ///
    /// Details:
    /// - Cached pages of the feed are dropped, so every page is fetched again.
    /// - The scroll position returns to the top.
    pub fn refresh(&mut self) {
        let Some(view) = self.feeds.get(&self.active).cloned() else {
            return;
        };
        view.reset();
        self.scroll.insert(self.active, 0.0);
        tokio::spawn(async move {
            let outcome = view.load_more().await;
            debug!(?outcome, "refresh settled");
        });
        self.push_metrics();
    }

    /// What: Handle one terminal event.
    ///
    /// Inputs:
    /// - `ev`: Crossterm event
    ///
    /// Output:
    /// - `true` when the session should end.
    pub fn handle_event(&mut self, ev: &CEvent) -> bool {
        match ev {
            CEvent::Key(key) => self.handle_key(*key),
            CEvent::Mouse(mouse) => {
                self.handle_mouse(*mouse);
                false
            }
            _ => false,
        }
    }

    /// Key bindings; returns `true` on quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let row = self.row_height();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(row),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-row),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_by(self.viewport_rows),
            KeyCode::PageUp => self.scroll_by(-self.viewport_rows),
            KeyCode::Home | KeyCode::Char('g') => self.scroll_to(0.0),
            KeyCode::End | KeyCode::Char('G') => self.scroll_to(f64::INFINITY),
            KeyCode::Tab => self.cycle_kind(),
            KeyCode::Char('p') => self.toggle_ranking(),
            KeyCode::Char('r') => self.retry(),
            KeyCode::Char('R') | KeyCode::F(5) => self.refresh(),
            _ => {}
        }
        false
    }

    /// Wheel scrolling moves one item per notch.
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let row = self.row_height();
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_by(row),
            MouseEventKind::ScrollUp => self.scroll_by(-row),
            _ => {}
        }
    }
}

impl<F> Session<F> {
    /// Feed on screen.
    #[must_use]
    pub const fn active(&self) -> QueryKey {
        self.active
    }

    /// Ordering policy in effect.
    #[must_use]
    pub const fn ranking(&self) -> RankingMode {
        self.ranking
    }

    /// View of the feed on screen.
    #[must_use]
    pub fn active_view(&self) -> Option<&FeedView<F>> {
        self.feeds.get(&self.active)
    }

    /// Scroll position of the active feed, in rows.
    #[must_use]
    pub fn scroll_offset(&self) -> f64 {
        self.scroll.get(&self.active).copied().unwrap_or(0.0)
    }

    /// Latest notice.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Replace the notice shown at the bottom.
    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Whether a scroll trigger is currently installed.
    #[must_use]
    pub fn has_trigger(&self) -> bool {
        self.trigger.as_ref().is_some_and(ScrollTrigger::is_active)
    }

    /// Record the list height after a layout pass and report metrics.
    pub fn set_viewport_rows(&mut self, rows: f64) {
        self.viewport_rows = rows.max(0.0);
        self.clamp_scroll();
        self.push_metrics();
    }

    /// Switch every feed between promotion and popularity ordering.
    pub fn toggle_ranking(&mut self) {
        self.ranking = self.ranking.toggled();
        for view in self.feeds.values_mut() {
            view.set_ranking(self.ranking);
        }
        info!(ranking = ?self.ranking, "ordering policy changed");
    }

    /// Frame of the active feed for the current scroll position.
    #[must_use]
    pub fn frame(&self) -> Option<FeedFrame> {
        self.active_view()
            .map(|v| v.frame(self.scroll_offset(), self.viewport_rows))
    }

    /// What: Report the current scroll metrics of the active feed to its trigger.
    ///
    /// Details:
    /// - Called after every render so a feed that does not yet fill the
    ///   viewport keeps loading once the previous page lands.
    pub fn push_metrics(&self) {
        let (Some(view), Some(trigger)) = (self.active_view(), self.trigger.as_ref()) else {
            return;
        };
        trigger.on_scroll(view.scroll_metrics(self.scroll_offset(), self.viewport_rows));
    }

    /// Move the active feed by `delta` rows.
    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll_to(self.scroll_offset() + delta);
    }

    /// Move the active feed to `offset`, clamped to the document.
    pub fn scroll_to(&mut self, offset: f64) {
        self.scroll.insert(self.active, offset);
        self.clamp_scroll();
        self.push_metrics();
    }

    /// Keep the scroll offset within `[0, document - viewport]`.
    fn clamp_scroll(&mut self) {
        let max = self.active_view().map_or(0.0, |v| {
            (v.scroll_metrics(0.0, self.viewport_rows).document_height - self.viewport_rows)
                .max(0.0)
        });
        let current = self.scroll_offset();
        let clamped = if current.is_nan() { 0.0 } else { current.clamp(0.0, max) };
        self.scroll.insert(self.active, clamped);
    }

    /// Height of one item in rows.
    const fn row_height(&self) -> f64 {
        self.config.options.window.item_height
    }
}
