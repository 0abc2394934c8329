//! UI layout and rendering
//!
//! Stats pane on top, packet table (newest first) in the middle, the hex
//! pane for the selected packet when hex mode is on, and a status line.
//! Popups are drawn over everything.

use pkt_decode::display::{hex_dump, human_bytes};
use pkt_decode::{ProtocolClass, SummaryRecord};
use pkt_engine::{LimitKind, Popup, Snapshot};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;
use tracing::Level;

use crate::diagnostics_layer::DiagnosticEvent;
use crate::input::InputState;

/// Height of the stats pane including borders
const STATS_HEIGHT: u16 = 5;

/// Height of the hex pane including borders
const HEX_HEIGHT: u16 = 10;

/// Table border and header lines
const TABLE_CHROME: u16 = 3;

const KEY_HINTS: &str =
    "q quit  p pause  h hex  d device  c limit  Up/Down select  Home newest";

/// Screen regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub stats: Rect,
    pub table: Rect,
    pub hex: Option<Rect>,
    pub status: Rect,
}

/// Split the screen into its panes
pub fn layout(area: Rect, show_hex: bool) -> Areas {
    let mut constraints = vec![Constraint::Length(STATS_HEIGHT), Constraint::Min(TABLE_CHROME)];
    if show_hex {
        constraints.push(Constraint::Length(HEX_HEIGHT));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    Areas {
        stats: chunks[0],
        table: chunks[1],
        hex: show_hex.then(|| chunks[2]),
        status: chunks[chunks.len() - 1],
    }
}

/// Packet rows that fit in a table area
pub fn table_rows(table: Rect) -> usize {
    usize::from(table.height.saturating_sub(TABLE_CHROME)).max(1)
}

/// Main draw function; returns the number of table rows shown
pub fn draw(
    f: &mut Frame,
    snapshot: &Snapshot<'_>,
    input: &InputState,
    status: Option<&DiagnosticEvent>,
) -> usize {
    let areas = layout(f.area(), snapshot.show_hex);
    let rows = table_rows(areas.table);

    draw_stats(f, snapshot, areas.stats);
    draw_table(f, snapshot, rows, areas.table);
    if let Some(hex) = areas.hex {
        draw_hex(f, snapshot.selected_record(), hex);
    }
    draw_status(f, status, areas.status);

    match snapshot.popup {
        Some(Popup::DevicePicker) => draw_device_popup(f, snapshot, input),
        Some(Popup::LimitEntry) => draw_limit_popup(f, input),
        None => {}
    }

    rows
}

fn draw_stats(f: &mut Frame, snapshot: &Snapshot<'_>, area: Rect) {
    let counters = &snapshot.counters;

    let mut header = match snapshot.device() {
        Some(device) => vec![
            Span::styled(
                device.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" - {}", device.description)),
        ],
        None => vec![Span::raw("no device")],
    };
    let flags = [
        (snapshot.is_paused(), " PAUSED ", Color::Red),
        (snapshot.show_hex, " HEX ", Color::Blue),
        (snapshot.recording, " REC ", Color::Magenta),
        (snapshot.source_exhausted, " END OF SOURCE ", Color::DarkGray),
    ];
    for (_, text, color) in flags.into_iter().filter(|(on, _, _)| *on) {
        header.push(Span::raw(" "));
        header.push(flag(text, color));
    }

    let classes = ProtocolClass::ALL
        .iter()
        .map(|&class| format!("{} {}", class.label(), counters.class(class)))
        .collect::<Vec<_>>()
        .join("   ");
    let packets = Line::from(format!("Packets {}   {}", counters.total, classes));

    let mut traffic = format!(
        "Bytes {}   Rate {}/s  {} pkt/s",
        human_bytes(counters.bytes),
        human_bytes(snapshot.rates.bytes_per_sec),
        snapshot.rates.packets_per_sec
    );
    if let Some(progress) = snapshot.limit {
        traffic.push_str(&format!(
            "   Limit {}/{} {}",
            progress.current,
            progress.target,
            progress.kind.label().to_lowercase()
        ));
    }
    if snapshot.decode_failures > 0 {
        traffic.push_str(&format!("   Undecodable {}", snapshot.decode_failures));
    }

    let paragraph = Paragraph::new(vec![Line::from(header), packets, Line::from(traffic)])
        .block(Block::default().borders(Borders::ALL).title(" pktdash "));
    f.render_widget(paragraph, area);
}

fn flag(text: &'static str, color: Color) -> Span<'static> {
    Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .bg(color)
            .add_modifier(Modifier::BOLD),
    )
}

fn protocol_color(class: ProtocolClass) -> Color {
    match class {
        ProtocolClass::Tcp => Color::Green,
        ProtocolClass::Udp => Color::Cyan,
        ProtocolClass::Icmp => Color::Magenta,
        ProtocolClass::Other => Color::Gray,
    }
}

fn record_row(record: &SummaryRecord, selected: bool) -> Row<'static> {
    let info = match &record.anomaly {
        Some(anomaly) => format!("! {}", anomaly.describe()),
        None => String::new(),
    };

    let mut style = if record.is_valid() {
        Style::default()
    } else {
        Style::default().fg(Color::Yellow)
    };
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }

    Row::new(vec![
        Cell::from(record.timestamp_display()),
        Cell::from(record.source.clone()),
        Cell::from(record.destination.clone()),
        Cell::from(record.protocol.label())
            .style(Style::default().fg(protocol_color(record.protocol))),
        Cell::from(record.length.to_string()),
        Cell::from(info),
    ])
    .style(style)
}

fn draw_table(f: &mut Frame, snapshot: &Snapshot<'_>, rows: usize, area: Rect) {
    let header = Row::new(vec!["Time", "Source", "Destination", "Proto", "Length", "Info"])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let first = snapshot.selection.first_visible();
    let selected = snapshot.selection.selected();
    let body: Vec<Row> = snapshot
        .visible_records(rows)
        .enumerate()
        .map(|(i, record)| record_row(record, first + i == selected))
        .collect();

    let title = if snapshot.selection.is_following() {
        format!(" Packets ({}) ", snapshot.history.len())
    } else {
        format!(
            " Packets ({})  row {} ",
            snapshot.history.len(),
            selected + 1
        )
    };

    let table = Table::new(
        body,
        [
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Fill(2),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

fn draw_hex(f: &mut Frame, record: Option<&SummaryRecord>, area: Rect) {
    let (title, lines) = match record {
        Some(record) => match &record.payload {
            Some(payload) => (
                format!(" Payload ({} bytes) ", payload.len()),
                hex_dump(payload).map(Line::from).collect(),
            ),
            None => (
                " Payload ".to_string(),
                vec![Line::from("No payload captured for this packet")],
            ),
        },
        None => (" Payload ".to_string(), vec![Line::from("No packet selected")]),
    };

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

fn draw_status(f: &mut Frame, status: Option<&DiagnosticEvent>, area: Rect) {
    let line = match status {
        Some(event) => {
            let color = if event.level == Level::ERROR {
                Color::Red
            } else {
                Color::Yellow
            };
            Line::from(Span::styled(
                event.status_text(),
                Style::default().fg(color),
            ))
        }
        None => Line::from(Span::styled(
            KEY_HINTS,
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_device_popup(f: &mut Frame, snapshot: &Snapshot<'_>, input: &InputState) {
    let area = centered_rect(60, 50, f.area());

    let items: Vec<ListItem> = snapshot
        .devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let marker = if i == snapshot.current_device { '*' } else { ' ' };
            let style = if i == input.device_cursor() {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            ListItem::new(format!(
                "{} {:>2}  {}  {}",
                marker, i, device.name, device.description
            ))
            .style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Select device (Enter switch, Esc cancel) "),
    );

    f.render_widget(Clear, area);
    f.render_widget(list, area);
}

fn draw_limit_popup(f: &mut Frame, input: &InputState) {
    let area = centered_rect(50, 40, f.area());

    let mut lines: Vec<Line> = LimitKind::ALL
        .iter()
        .map(|&kind| {
            if kind == input.limit_kind() {
                Line::from(Span::styled(
                    format!("> {}", kind.label()),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("  {}", kind.label()))
            }
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Stop after: {}_", input.digits())));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Up/Down kind  0-9 target  Enter confirm  Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Capture limit "),
    );

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}
