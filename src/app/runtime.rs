use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::{select, sync::mpsc};

use crate::config::Settings;
use crate::feed::{ChannelNotifier, FeedFrame};
use crate::logic::RankingMode;
use crate::sources::{CatalogClient, PageCache, build_http_client};
use crate::state::QueryKey;
use crate::ui::{Screen, layout, ui};

use super::background::spawn_event_thread;
use super::session::{Session, SessionConfig};
use super::terminal::{restore_terminal, setup_terminal};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Redraw interval while nothing else happens; picks up pages landing in the background.
const TICK: Duration = Duration::from_millis(100);

/// What: Build the session that backs the TUI.
///
/// Inputs:
/// - `settings`: Effective settings
/// - `initial`: Feed shown first
/// - `ranking`: Starting ordering policy
/// - `notifier`: Sink for load failures
///
/// Output:
/// - Session whose fetchers share one HTTP client and one page cache.
///
/// # Errors
/// - Returns `Err` when the HTTP client cannot be built.
fn build_session(
    settings: &Settings,
    initial: QueryKey,
    ranking: RankingMode,
    notifier: ChannelNotifier,
) -> Result<Session<CatalogClient>> {
    let http = build_http_client(Duration::from_secs(settings.request_timeout_secs))?;
    let cache = Arc::new(PageCache::new(
        settings.cache_capacity,
        Duration::from_secs(settings.cache_ttl_secs),
    ));
    let base_url = settings.api_base_url.clone();
    let page_size = settings.page_size;
    let config = SessionConfig {
        loader: settings.loader_config(),
        options: settings.feed_options(ranking),
        trigger: settings.trigger_config(),
    };
    Ok(Session::new(
        initial,
        config,
        Box::new(move |key: QueryKey| {
            CatalogClient::new(http.clone(), &base_url, key, page_size, Arc::clone(&cache))
        }),
        Arc::new(notifier),
    ))
}

/// What: Run the catalog-feed TUI until the user quits.
///
/// Inputs:
/// - `settings`: Effective settings (file values with CLI overrides applied)
/// - `initial`: Feed shown first
/// - `ranking`: Starting ordering policy
///
/// Output:
/// - `Ok(())` when the UI exits cleanly; `Err` on terminal or client setup failures.
///
/// Details:
/// - Terminal events arrive from a blocking reader thread over a channel.
/// - Each loop iteration renders, records the list height and pushes scroll
///   metrics so a short feed keeps filling the viewport.
/// - The terminal is restored even when the loop fails.
pub async fn run(settings: Settings, initial: QueryKey, ranking: RankingMode) -> Result<()> {
    let (notifier, mut notice_rx) = ChannelNotifier::channel();
    let mut session = build_session(&settings, initial, ranking, notifier)?;

    setup_terminal()?;
    let result = match Terminal::new(CrosstermBackend::new(std::io::stdout())) {
        Ok(mut terminal) => {
            event_loop(&mut terminal, &mut session, &mut notice_rx, settings.item_height).await
        }
        Err(e) => Err(e.into()),
    };
    if let Err(e) = restore_terminal() {
        tracing::warn!(error = %e, "failed to restore terminal");
    }
    result
}

/// Main loop: draw, then wait for a terminal event, a notice or the tick.
async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut Session<CatalogClient>,
    notice_rx: &mut mpsc::UnboundedReceiver<crate::feed::Notice>,
    item_height: u16,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    spawn_event_thread(event_tx, Arc::clone(&cancelled));
    let mut tick = tokio::time::interval(TICK);

    let outcome = loop {
        let size = match terminal.size() {
            Ok(size) => size,
            Err(e) => break Err(e.into()),
        };
        let list = layout(ratatui::layout::Rect::new(0, 0, size.width, size.height)).list;
        session.set_viewport_rows(f64::from(list.height));

        let frame = session.frame().unwrap_or_else(empty_frame);
        let screen = Screen {
            key: session.active(),
            ranking: session.ranking(),
            frame: &frame,
            scroll_offset: session.scroll_offset(),
            item_height,
            notice: session.notice(),
        };
        if let Err(e) = terminal.draw(|f| ui(f, &screen)) {
            break Err(e.into());
        }

        select! {
            Some(ev) = event_rx.recv() => {
                if session.handle_event(&ev) {
                    break Ok(());
                }
            }
            Some(notice) = notice_rx.recv() => {
                session.set_notice(notice);
            }
            _ = tick.tick() => {}
        }
    };
    cancelled.store(true, Ordering::Relaxed);
    tracing::info!("event loop finished");
    outcome
}

/// Frame shown before the first feed exists.
fn empty_frame() -> FeedFrame {
    FeedFrame {
        items: Vec::new(),
        first_index: 0,
        total_items: 0,
        total_height: 0.0,
        offset_y: 0.0,
        virtualized: false,
        is_loading: false,
        has_more: true,
        error: None,
    }
}
