use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use askaweather_core::ChatRole;
use crate::app::{App, BackendStatus, DraftLayout};

/// Most draft lines the input box grows to before it stops growing
const MAX_INPUT_ROWS: u16 = 4;

/// Parse a line with **bold** markers into styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Input box spans the full width, minus its borders
    let draft = app.draft_layout(area.width.saturating_sub(2));
    let draft_rows = u16::try_from(draft.rows.len())
        .unwrap_or(MAX_INPUT_ROWS)
        .clamp(1, MAX_INPUT_ROWS);

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(draft_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, &draft, frame, input_area);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status_text, status_color) = match app.backend_status {
        BackendStatus::Unknown => ("● connecting", Color::DarkGray),
        BackendStatus::Online => ("● online", Color::Green),
        BackendStatus::Offline => ("● offline", Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(" Askaweather ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw(" "),
        Span::styled(app.base_url().to_string(), Style::default().fg(Color::DarkGray)),
    ]);
    let subtitle = Line::from(Span::styled(
        " Your Personal Forecast Assistant",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(vec![title, subtitle]), area);
}

/// Lines of the chat thread: messages, the pending indicator, then the error
fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.conversation.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Assistant:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        if msg.content.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::default());
    }

    if app.conversation.is_submitting() {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(err) = app.conversation.last_error() {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

/// The chat thread (or the empty-state hint) wrapped the way it is drawn.
/// Scroll limits are measured on this same paragraph.
pub fn chat_paragraph(app: &App) -> Paragraph<'static> {
    let text = if app.conversation.messages().is_empty() && !app.conversation.is_submitting() {
        Text::from(vec![
            Line::from(Span::styled(
                "How's the weather looking?",
                Style::default().fg(Color::Gray).bold(),
            )),
            Line::from(Span::styled(
                "Try asking about your city or upcoming plans.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    } else {
        Text::from(chat_lines(app))
    };

    Paragraph::new(text).wrap(Wrap { trim: false })
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store inner dimensions for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let chat = chat_paragraph(app)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, draft: &DraftLayout, frame: &mut Frame, area: Rect) {
    let pending = app.conversation.is_submitting();

    let (title, border_color) = if pending {
        (" Waiting for reply... ", Color::DarkGray)
    } else {
        (" Message ", Color::Cyan)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let input = if app.conversation.draft().is_empty() {
        Paragraph::new(Span::styled(
            "Ask anything...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let style = if pending {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let lines: Vec<Line> = draft.rows.iter().map(|row| Line::from(row.as_str())).collect();
        Paragraph::new(lines).style(style)
    };

    // Keep the cursor row in view once the draft outgrows the box
    let (row, col) = draft.cursor;
    let inner_rows = area.height.saturating_sub(2).max(1);
    let row_scroll = row.saturating_sub(inner_rows - 1);

    frame.render_widget(input.block(block).scroll((row_scroll, 0)), area);

    if !pending {
        let x = (area.x + 1).saturating_add(col).min(area.right().saturating_sub(2));
        let y = area.y + 1 + row - row_scroll;
        frame.set_cursor_position(Position::new(x, y));
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let [hints_area, credit_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(31)]).areas(area);

    let hints = Line::from(vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Shift+Enter ", key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);
    frame.render_widget(Paragraph::new(hints), hints_area);

    let credit = Paragraph::new(Span::styled(
        "Powered by Claude & WeatherAPI",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(credit, credit_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use askaweather_core::{AssistantClient, ChatMessage, ClientError, StatusCode};
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(AssistantClient::new("http://localhost:8000"), tx)
    }

    fn render_to_string(app: &mut App) -> String {
        render_sized(app, 80, 24)
    }

    fn render_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_markdown_line_bold() {
        let line = parse_markdown_line("Expect **heavy rain** today");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "heavy rain");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_line_unclosed() {
        let line = parse_markdown_line("a **b");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **b");
    }

    #[test]
    fn test_empty_state_shows_hint_and_placeholder() {
        let mut app = test_app();
        let screen = render_to_string(&mut app);
        assert!(screen.contains("Askaweather"));
        assert!(screen.contains("How's the weather looking?"));
        assert!(screen.contains("Ask anything..."));
        assert!(screen.contains("Powered by Claude & WeatherAPI"));
    }

    #[test]
    fn test_pending_shows_thinking_and_disables_input() {
        let mut app = test_app();
        app.conversation.set_draft("Will it rain in Boston tomorrow?");
        app.conversation.begin_submit();

        let screen = render_to_string(&mut app);
        assert!(screen.contains("You:"));
        assert!(screen.contains("Will it rain in Boston tomorrow?"));
        assert!(screen.contains("Thinking."));
        assert!(screen.contains("Waiting for reply"));
    }

    #[test]
    fn test_reply_and_error_render() {
        let mut app = test_app();
        app.conversation.set_draft("Rain?");
        app.conversation.begin_submit();
        app.conversation.finish_submit(Ok(ChatMessage::assistant("Yes, 70% chance.")));
        app.conversation.set_draft("And Friday?");
        app.conversation.begin_submit();
        app.conversation.finish_submit(Err(ClientError::ResponseRejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }));

        let screen = render_to_string(&mut app);
        assert!(screen.contains("Assistant:"));
        assert!(screen.contains("Yes, 70% chance."));
        assert!(screen.contains("Failed to connect to the assistant. Please try again."));
        assert!(!screen.contains("Thinking"));
    }

    #[test]
    fn test_backend_status_in_header() {
        let mut app = test_app();
        app.set_backend_online(false);
        assert!(render_to_string(&mut app).contains("offline"));
    }

    #[test]
    fn test_render_records_chat_size() {
        let mut app = test_app();
        render_to_string(&mut app);
        // 24 rows - header 2 - input 3 - footer 1 - borders 2
        assert_eq!(app.chat_height, 16);
        assert_eq!(app.chat_width, 78);
    }

    #[test]
    fn test_error_tail_visible_after_word_wrapped_reply() {
        let mut app = test_app();
        app.conversation.set_draft("Rain?");
        app.conversation.begin_submit();
        app.conversation.finish_submit(Ok(ChatMessage::assistant(
            "aaaaaaaaaa bbbbbbbbbb cccccccccc",
        )));
        app.conversation.set_draft("And Friday?");
        app.conversation.begin_submit();
        app.conversation.finish_submit(Err(ClientError::ResponseRejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }));

        // First draw records the chat size, then jump to the end
        render_sized(&mut app, 20, 14);
        app.scroll_to_bottom();
        let screen = render_sized(&mut app, 20, 14);
        assert!(screen.contains("try again."), "error tail hidden:\n{screen}");

        let bottom = app.chat_scroll;
        app.scroll_down(100);
        assert_eq!(app.chat_scroll, bottom);
    }

    #[test]
    fn test_long_draft_wraps_and_grows_input() {
        let mut app = test_app();
        app.conversation.set_draft(format!("{}TAIL!", "x".repeat(95)));
        app.cursor_end();

        let screen = render_to_string(&mut app);
        assert!(screen.contains("TAIL!"), "draft tail clipped:\n{screen}");
        // 24 rows - header 2 - input 4 - footer 1 - borders 2
        assert_eq!(app.chat_height, 15);
    }

    #[test]
    fn test_input_growth_stops_at_four_rows() {
        let mut app = test_app();
        app.conversation.set_draft("a\nb\nc\nd\ne\nf");
        app.cursor_end();

        let screen = render_to_string(&mut app);
        // Box shows the last four rows, where the cursor is
        assert!(screen.lines().any(|line| line.starts_with("│f ")));
        assert!(!screen.lines().any(|line| line.starts_with("│a ")));
        assert_eq!(app.chat_height, 13);
    }
}
