use askaweather_core::{AssistantClient, ChatMessage, ClientError, Conversation};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use unicode_width::UnicodeWidthChar;

use crate::tui::AppEvent;
use crate::ui;

/// What the startup health probe found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online,
    Offline,
}

pub struct App {
    pub should_quit: bool,

    // Conversation state
    pub conversation: Conversation,
    pub draft_cursor: usize, // char index into the draft

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of chat area, updated during render
    pub chat_width: u16,  // Inner width of chat area, updated during render

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub backend_status: BackendStatus,

    client: AssistantClient,
    events: UnboundedSender<AppEvent>,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Draft text laid out for the input box: visual rows plus the cursor cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLayout {
    pub rows: Vec<String>,
    pub cursor: (u16, u16), // (row, column) in display cells
}

/// Hard-wrap `draft` into rows at most `width` cells wide and place the
/// cursor sitting before char `cursor`.
fn layout_draft(draft: &str, cursor: usize, width: u16) -> DraftLayout {
    let width = usize::from(width.max(1));
    let mut rows = vec![String::new()];
    let mut col = 0usize;
    let mut cursor_cell = None;

    for (i, c) in draft.chars().enumerate() {
        if c == '\n' {
            if i == cursor {
                cursor_cell = Some((rows.len() - 1, col));
            }
            rows.push(String::new());
            col = 0;
            continue;
        }

        let char_width = c.width().unwrap_or(0);
        if col > 0 && col + char_width > width {
            rows.push(String::new());
            col = 0;
        }
        if i == cursor {
            cursor_cell = Some((rows.len() - 1, col));
        }
        if let Some(row) = rows.last_mut() {
            row.push(c);
        }
        col += char_width;
    }

    let (mut row, mut col) = cursor_cell.unwrap_or((rows.len() - 1, col));
    if col >= width {
        if cursor_cell.is_none() {
            // Cursor after a full last row starts the next one
            rows.push(String::new());
            row += 1;
            col = 0;
        } else {
            col = width - 1;
        }
    }

    DraftLayout {
        rows,
        cursor: (to_u16(row), to_u16(col)),
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

impl App {
    pub fn new(client: AssistantClient, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::new(),
            draft_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            backend_status: BackendStatus::Unknown,
            client,
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Send the draft if the conversation accepts it. The request runs on a
    /// background task and its outcome comes back as [`AppEvent::Reply`].
    pub fn submit(&mut self) {
        let Some(payload) = self.conversation.begin_submit() else {
            return;
        };

        self.draft_cursor = 0;
        self.animation_frame = 0;
        self.scroll_to_bottom();

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = client.send(&payload).await;
            // Receiver is gone only when the app is shutting down
            let _ = events.send(AppEvent::Reply(outcome));
        });
    }

    pub fn apply_reply(&mut self, outcome: Result<ChatMessage, ClientError>) {
        self.conversation.finish_submit(outcome);
        self.scroll_to_bottom();
    }

    /// Probe the backend once; the answer arrives as [`AppEvent::Health`].
    pub fn probe_backend(&self) {
        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let online = match client.health().await {
                Ok(ok) => ok,
                Err(err) => {
                    debug!(error = %err, "health probe failed");
                    false
                }
            };
            let _ = events.send(AppEvent::Health(online));
        });
    }

    pub fn set_backend_online(&mut self, online: bool) {
        info!(online, base_url = self.base_url(), "backend health");
        self.backend_status = if online {
            BackendStatus::Online
        } else {
            BackendStatus::Offline
        };
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_submitting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Draft editing. The input is disabled while a reply is pending.

    pub fn insert_char(&mut self, c: char) {
        if self.conversation.is_submitting() {
            return;
        }
        let byte_pos = char_to_byte_index(self.conversation.draft(), self.draft_cursor);
        self.conversation.draft_mut().insert(byte_pos, c);
        self.draft_cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.conversation.is_submitting() || self.draft_cursor == 0 {
            return;
        }
        self.draft_cursor -= 1;
        let byte_pos = char_to_byte_index(self.conversation.draft(), self.draft_cursor);
        self.conversation.draft_mut().remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.conversation.is_submitting() {
            return;
        }
        if self.draft_cursor < self.conversation.draft().chars().count() {
            let byte_pos = char_to_byte_index(self.conversation.draft(), self.draft_cursor);
            self.conversation.draft_mut().remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.draft_cursor = self.draft_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.conversation.draft().chars().count();
        self.draft_cursor = (self.draft_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.draft_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.draft_cursor = self.conversation.draft().chars().count();
    }

    /// The draft wrapped to an input box `width` cells wide
    pub fn draft_layout(&self, width: u16) -> DraftLayout {
        layout_draft(self.conversation.draft(), self.draft_cursor, width)
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, rows: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        let max = self.content_rows().saturating_sub(self.visible_rows());
        self.chat_scroll = self.chat_scroll.saturating_add(rows).min(max);
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_rows() / 2).max(1)
    }

    /// Scroll chat to bottom so the newest message (or "Thinking...") is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.content_rows().saturating_sub(self.visible_rows());
    }

    fn visible_rows(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Rows the chat thread occupies, measured with the same wrapping the
    /// chat view renders with
    fn content_rows(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        to_u16(ui::chat_paragraph(self).line_count(wrap_width))
    }
}
