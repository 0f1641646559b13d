use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use super::Screen;
use super::helpers::{rows, truncate_to_width};
use super::palette::PALETTE;
use crate::state::CatalogItem;

/// What: Build the terminal lines of one feed row.
///
/// Inputs:
/// - `item`: Listing to draw
/// - `height`: Rows per item (at least one line is produced)
/// - `width`: Available columns
///
/// Output:
/// - Exactly `max(height, 1)` lines: header, description, then blank padding.
#[must_use]
pub fn item_lines(item: &CatalogItem, height: u16, width: u16) -> Vec<Line<'static>> {
    let th = PALETTE;
    let width = usize::from(width);
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut used = 0;
    if item.is_ultra_top {
        spans.push(Span::styled(
            "★ ",
            Style::default().fg(th.mauve).add_modifier(Modifier::BOLD),
        ));
        used += 2;
    }
    if item.is_top {
        spans.push(Span::styled("TOP ", Style::default().fg(th.yellow)));
        used += 4;
    }
    let handle = item
        .username
        .as_deref()
        .map(|u| format!(" @{}", u.trim_start_matches('@')))
        .unwrap_or_default();
    let views = item
        .view_count
        .map(|v| format!("  {v} views"))
        .unwrap_or_default();
    let title = if item.title.is_empty() {
        format!("#{}", item.id)
    } else {
        item.title.clone()
    };
    let room = width.saturating_sub(used + handle.width() + views.width());
    spans.push(Span::styled(
        truncate_to_width(&title, room),
        Style::default().fg(th.text).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(handle, Style::default().fg(th.sapphire)));
    spans.push(Span::styled(views, Style::default().fg(th.overlay1)));

    let mut lines = vec![Line::from(spans)];
    if height >= 2 {
        lines.push(Line::from(Span::styled(
            truncate_to_width(&item.description, width),
            Style::default().fg(th.subtext0),
        )));
    }
    while lines.len() < usize::from(height.max(1)) {
        lines.push(Line::default());
    }
    lines
}

/// What: Render the visible part of the feed into `area`.
///
/// Inputs:
/// - `f`: Frame to draw into
/// - `area`: List area
/// - `screen`: Render model
///
/// Details:
/// - Lines are laid out from the frame's `offset_y`; the part above the
///   scroll position is skipped so partially visible rows are clipped.
pub fn render_feed(f: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let th = PALETTE;
    let frame = screen.frame;
    if frame.items.is_empty() {
        let (msg, color) = if frame.is_loading {
            ("Loading…", th.yellow)
        } else if frame.error.is_some() {
            ("Could not load listings. Press r to retry.", th.red)
        } else {
            ("No listings.", th.subtext0)
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(color)))),
            area,
        );
        return;
    }
    let skip = rows(screen.scroll_offset - frame.offset_y);
    let lines: Vec<Line<'static>> = frame
        .items
        .iter()
        .flat_map(|item| item_lines(item, screen.item_height, area.width))
        .skip(skip)
        .take(usize::from(area.height))
        .collect();
    f.render_widget(
        Paragraph::new(lines).style(Style::default().bg(th.base)),
        area,
    );
}
