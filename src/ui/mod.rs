//! Terminal rendering of the feed screen.
//!
//! The screen is split into a tab header, the scrolling list, a status line
//! and a notice line. Rendering is a pure function of [`Screen`].

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::feed::{FeedFrame, Notice, NoticeLevel};
use crate::logic::RankingMode;
use crate::state::{ItemKind, QueryKey};

mod feed;
mod helpers;
mod palette;

pub use feed::item_lines;
pub use helpers::truncate_to_width;
use palette::PALETTE;

/// Everything needed to draw one frame of the screen.
pub struct Screen<'a> {
    /// Listing shown.
    pub key: QueryKey,
    /// Active ordering policy.
    pub ranking: RankingMode,
    /// Ranked and windowed rows plus loader flags.
    pub frame: &'a FeedFrame,
    /// Scroll position in rows.
    pub scroll_offset: f64,
    /// Rows per item.
    pub item_height: u16,
    /// Latest notice, if any.
    pub notice: Option<&'a Notice>,
}

/// Screen regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Tab header.
    pub header: Rect,
    /// Scrolling list.
    pub list: Rect,
    /// Loader status.
    pub status: Rect,
    /// Latest notice.
    pub notice: Rect,
}

/// What: Split the terminal area into screen regions.
///
/// Inputs:
/// - `area`: Full terminal area
///
/// Output:
/// - `ScreenLayout` with one-row header, status and notice bars around the list.
#[must_use]
pub fn layout(area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    ScreenLayout {
        header: chunks[0],
        list: chunks[1],
        status: chunks[2],
        notice: chunks[3],
    }
}

/// Draw the whole screen.
pub fn ui(f: &mut Frame, screen: &Screen<'_>) {
    let th = PALETTE;
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(th.base)), area);
    let regions = layout(area);
    render_header(f, regions.header, screen);
    feed::render_feed(f, regions.list, screen);
    render_status(f, regions.status, screen);
    render_notice(f, regions.notice, screen.notice);
}

/// Human label of a listing kind.
const fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Channel => "Channels",
        ItemKind::Bot => "Bots",
        ItemKind::Group => "Groups",
        ItemKind::News => "News",
    }
}

/// Kind tabs, category filter and ordering policy.
fn render_header(f: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let th = PALETTE;
    let mut spans: Vec<Span<'static>> = Vec::new();
    for kind in ItemKind::ALL {
        let label = format!(" {} ", kind_label(kind));
        let style = if kind == screen.key.kind {
            Style::default()
                .fg(th.base)
                .bg(th.sapphire)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(th.subtext0)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    if let Some(category) = screen.key.category_id {
        spans.push(Span::styled(
            format!("category {category}  "),
            Style::default().fg(th.overlay1),
        ));
    }
    let policy = match screen.ranking {
        RankingMode::Promotion => "promoted first",
        RankingMode::Popularity => "most viewed",
    };
    spans.push(Span::styled(
        format!("[{policy}]"),
        Style::default().fg(th.mauve),
    ));
    f.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(th.mantle)),
        area,
    );
}

/// Item counts and loader state.
fn render_status(f: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let th = PALETTE;
    let frame = screen.frame;
    let (state, color) = if frame.is_loading {
        ("loading…".to_string(), th.yellow)
    } else if let Some(err) = &frame.error {
        (format!("error: {err} (r to retry)"), th.red)
    } else if frame.has_more {
        ("scroll for more".to_string(), th.green)
    } else {
        ("end of feed".to_string(), th.subtext0)
    };
    let shown = if frame.items.is_empty() {
        "0".to_string()
    } else {
        format!(
            "{}-{}",
            frame.first_index + 1,
            frame.first_index + frame.items.len()
        )
    };
    let text = format!(
        " {} items (rendering {shown}){}  ·  {state}  ·  Tab kind  p policy  R refresh  q quit",
        frame.total_items,
        if frame.virtualized { " windowed" } else { "" },
    );
    let line = Line::from(Span::styled(
        truncate_to_width(&text, usize::from(area.width)),
        Style::default().fg(color),
    ));
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(th.mantle)),
        area,
    );
}

/// Latest notice, colored by level.
fn render_notice(f: &mut Frame, area: Rect, notice: Option<&Notice>) {
    let th = PALETTE;
    let Some(notice) = notice else {
        return;
    };
    let color = match notice.level {
        NoticeLevel::Info => th.subtext0,
        NoticeLevel::Error => th.red,
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_to_width(&notice.message, usize::from(area.width)),
            Style::default().fg(color),
        ))),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::items;
    use ratatui::{Terminal, backend::TestBackend};

    fn frame_of(n: usize) -> FeedFrame {
        FeedFrame {
            items: items(1, n),
            first_index: 0,
            total_items: n,
            total_height: 0.0,
            offset_y: 0.0,
            virtualized: false,
            is_loading: false,
            has_more: true,
            error: None,
        }
    }

    fn buffer_text(term: &Terminal<TestBackend>) -> String {
        term.backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    /// What: Layout reserves one row each for header, status and notice
    fn layout_reserves_bars() {
        let l = layout(Rect::new(0, 0, 80, 24));
        assert_eq!(l.header.height, 1);
        assert_eq!(l.list.height, 21);
        assert_eq!(l.status.y, 22);
        assert_eq!(l.notice.y, 23);
    }

    #[test]
    /// What: A full screen renders tabs, status and the latest error notice
    fn ui_renders_status_and_notice() {
        let backend = TestBackend::new(100, 20);
        let mut term = Terminal::new(backend).expect("Failed to create terminal for test");
        let frame = frame_of(4);
        let notice = Notice {
            level: NoticeLevel::Error,
            message: "Could not load bots (page 2): timeout".into(),
        };
        let screen = Screen {
            key: QueryKey::kind(ItemKind::Bot),
            ranking: RankingMode::Popularity,
            frame: &frame,
            scroll_offset: 0.0,
            item_height: 3,
            notice: Some(&notice),
        };
        term.draw(|f| ui(f, &screen)).expect("draw");
        let text = buffer_text(&term);
        assert!(text.contains("Bots"));
        assert!(text.contains("most viewed"));
        assert!(text.contains("4 items"));
        assert!(text.contains("timeout"));
    }

    #[test]
    /// What: An empty feed that is loading shows the loading placeholder
    fn ui_renders_loading_placeholder() {
        let backend = TestBackend::new(60, 10);
        let mut term = Terminal::new(backend).expect("Failed to create terminal for test");
        let mut frame = frame_of(0);
        frame.is_loading = true;
        let screen = Screen {
            key: QueryKey::kind(ItemKind::Channel),
            ranking: RankingMode::Promotion,
            frame: &frame,
            scroll_offset: 0.0,
            item_height: 3,
            notice: None,
        };
        term.draw(|f| ui(f, &screen)).expect("draw");
        assert!(buffer_text(&term).contains("Loading"));
    }
}
