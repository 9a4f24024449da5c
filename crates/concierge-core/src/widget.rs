//! Chat panel state machine: Closed, Open, Maximized.
//!
//! The widget owns the transcript, the text entry and at most one in-flight
//! request. Requests run on a spawned task; the host polls for the reply
//! with [`ChatWidget::poll_response`] from its event loop. Dropping the
//! widget aborts whatever is still running.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::error;

use crate::ai::ProviderFactory;
use crate::error::GENERIC_FAILURE_REPLY;
use crate::pipeline::{PipelineSettings, RequestPipeline};
use crate::state::{ChatMessage, Transcript};
use crate::view::{ViewContext, ViewMode};

/// Delay between opening the panel and moving focus into the text entry.
pub const FOCUS_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Closed,
    Open,
    Maximized,
}

/// Transient flags a renderer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetUiState {
    pub is_open: bool,
    pub is_maximized: bool,
    pub is_loading: bool,
    pub init_error: Option<String>,
}

struct InFlight {
    task: JoinHandle<()>,
    reply: oneshot::Receiver<ChatMessage>,
}

pub struct ChatWidget {
    state: WidgetState,
    transcript: Transcript,
    pipeline: RequestPipeline,
    view: Option<watch::Receiver<ViewMode>>,

    input: String,
    cursor: usize, // char index into input
    input_focused: bool,
    focus_at: Option<Instant>,

    loading: bool,
    in_flight: Option<InFlight>,

    // Chat viewport, updated by the renderer
    scroll: u16,
    pinned: bool,
    chat_height: u16,
    chat_width: u16,
    rendered_lines: Option<u16>,
}

impl ChatWidget {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self {
            state: WidgetState::Closed,
            transcript: Transcript::new(),
            pipeline,
            view: None,
            input: String::new(),
            cursor: 0,
            input_focused: false,
            focus_at: None,
            loading: false,
            in_flight: None,
            scroll: 0,
            pinned: true,
            chat_height: 0,
            chat_width: 0,
            rendered_lines: None,
        }
    }

    /// Build a widget whose provider follows `context`.
    pub fn attached(
        factory: Arc<dyn ProviderFactory>,
        context: &ViewContext,
        settings: PipelineSettings,
    ) -> Self {
        let view = context.subscribe();
        let pipeline = RequestPipeline::new(factory, *view.borrow(), settings);
        let mut widget = Self::new(pipeline);
        widget.view = Some(view);
        widget
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != WidgetState::Closed
    }

    pub fn is_maximized(&self) -> bool {
        self.state == WidgetState::Maximized
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn mode(&self) -> ViewMode {
        self.pipeline.mode()
    }

    pub fn ui_state(&self) -> WidgetUiState {
        WidgetUiState {
            is_open: self.is_open(),
            is_maximized: self.is_maximized(),
            is_loading: self.loading,
            init_error: self.banner().map(str::to_string),
        }
    }

    /// Persistent banner text when the provider could not be built
    pub fn banner(&self) -> Option<&'static str> {
        self.pipeline.init_error().map(|e| e.init_banner())
    }

    pub fn is_input_enabled(&self) -> bool {
        self.pipeline.init_error().is_none() && !self.loading
    }

    // Open/close transitions

    pub fn open(&mut self) {
        if self.state == WidgetState::Closed {
            self.state = WidgetState::Open;
            self.focus_at = Some(Instant::now() + FOCUS_GRACE);
        }
    }

    /// Close the panel. The next open is always the normal size.
    pub fn close(&mut self) {
        self.state = WidgetState::Closed;
        self.focus_at = None;
        self.input_focused = false;
    }

    pub fn toggle_open(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn toggle_maximize(&mut self) {
        self.state = match self.state {
            WidgetState::Closed => WidgetState::Closed,
            WidgetState::Open => WidgetState::Maximized,
            WidgetState::Maximized => WidgetState::Open,
        };
    }

    /// Fire due timers. Returns true when something visible changed.
    pub fn tick(&mut self) -> bool {
        match self.focus_at {
            Some(at) if Instant::now() >= at => {
                self.focus_at = None;
                self.input_focused = self.is_open();
                true
            }
            _ => false,
        }
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn focus_input(&mut self) {
        if self.is_open() {
            self.focus_at = None;
            self.input_focused = true;
        }
    }

    pub fn blur_input(&mut self) {
        self.input_focused = false;
    }

    // Text entry

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Requests

    /// Send the current input. Returns false when the submit was ignored:
    /// blank input, a request already in flight, or no provider client.
    pub fn submit(&mut self) -> bool {
        if self.loading || self.input.trim().is_empty() {
            return false;
        }
        let Some(request) = self.pipeline.prepare(&self.transcript, &self.input) else {
            return false;
        };

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.transcript.push(ChatMessage::user(text));
        self.loading = true;
        self.scroll_to_bottom();

        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let message = request.run().await;
            let _ = tx.send(message);
        });
        self.in_flight = Some(InFlight { task, reply: rx });
        true
    }

    /// Collect a finished reply without blocking. Returns true if one landed.
    pub fn poll_response(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };
        let message = match in_flight.reply.try_recv() {
            Ok(message) => message,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => lost_reply(),
        };
        self.in_flight = None;
        self.finish(message);
        true
    }

    /// Wait for the in-flight request, if any, and append its reply.
    pub async fn settle(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };
        let message = (&mut in_flight.reply).await.unwrap_or_else(|_| lost_reply());
        self.in_flight = None;
        self.finish(message);
        true
    }

    fn finish(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        self.loading = false;
        self.scroll_to_bottom();
    }

    /// Drop the conversation back to the greeting, abandoning any request.
    pub fn clear_history(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
        self.loading = false;
        self.transcript.clear();
        self.rendered_lines = None;
        self.scroll_to_bottom();
    }

    /// Pick up a view-mode change, rebuilding the provider client.
    ///
    /// A request already in flight keeps the instruction it was sent with.
    pub fn sync_view(&mut self) -> bool {
        let Some(view) = self.view.as_mut() else {
            return false;
        };
        if !view.has_changed().unwrap_or(false) {
            return false;
        }
        let mode = *view.borrow_and_update();
        self.pipeline.rebuild(mode);
        true
    }

    // Scrolling

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        if lines > 0 {
            self.pinned = false;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
        self.pinned = self.scroll >= max;
    }

    /// Record the inner size of the chat area from the last render.
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        if width != self.chat_width {
            // Wrapped height no longer matches
            self.rendered_lines = None;
        }
        self.chat_width = width;
        self.chat_height = height;
        self.follow();
    }

    /// Record how many lines the renderer actually laid the transcript out
    /// on. Replaces the estimate until the next width change.
    pub fn set_rendered_lines(&mut self, lines: u16) {
        self.rendered_lines = Some(lines);
        self.follow();
    }

    /// Keep a pinned view on the newest entry, otherwise clamp.
    fn follow(&mut self) {
        let max = self.max_scroll();
        self.scroll = if self.pinned { max } else { self.scroll.min(max) };
    }

    fn content_lines(&self) -> u16 {
        if let Some(lines) = self.rendered_lines {
            return lines;
        }

        // Rough estimate for hosts that never report a measured height
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.transcript.messages() {
            total_lines = total_lines.saturating_add(1); // role line
            for line in msg.content.lines() {
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 {
                    1
                } else {
                    (char_count / wrap_width) + 1
                };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // blank line after message
        }

        if self.loading {
            total_lines = total_lines.saturating_add(2);
        }
        total_lines
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.content_lines().saturating_sub(visible_height)
    }

    /// Pin the view to the newest entry. Stays pinned across later
    /// measurements until the user scrolls up.
    pub fn scroll_to_bottom(&mut self) {
        self.pinned = true;
        self.scroll = self.max_scroll();
    }
}

impl Drop for ChatWidget {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}

fn lost_reply() -> ChatMessage {
    error!(context = "chat request", "request task ended without a reply");
    ChatMessage::assistant(GENERIC_FAILURE_REPLY)
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::{MockFactory, MockOutcome};
    use crate::error::{CREDENTIAL_MISSING_BANNER, RESOURCE_NOT_FOUND_REPLY};
    use crate::prompt;
    use crate::state::ChatRole;
    use crate::view::{AudienceLens, NetworkTier};

    fn widget(factory: &MockFactory) -> ChatWidget {
        let pipeline = RequestPipeline::new(
            Arc::new(factory.clone()),
            ViewMode::default(),
            PipelineSettings::default(),
        );
        ChatWidget::new(pipeline)
    }

    #[tokio::test]
    async fn test_open_maximize_close() {
        let mut w = widget(&MockFactory::new());
        assert_eq!(w.state(), WidgetState::Closed);

        w.toggle_maximize();
        assert_eq!(w.state(), WidgetState::Closed);

        w.open();
        assert_eq!(w.state(), WidgetState::Open);
        w.toggle_maximize();
        assert_eq!(w.state(), WidgetState::Maximized);
        w.toggle_maximize();
        assert_eq!(w.state(), WidgetState::Open);

        w.toggle_maximize();
        w.close();
        assert_eq!(w.state(), WidgetState::Closed);
        w.open();
        assert_eq!(w.state(), WidgetState::Open);
    }

    #[tokio::test]
    async fn test_history_survives_resize() {
        let mut w = widget(&MockFactory::new());
        w.open();
        w.set_input("hello");
        assert!(w.submit());
        w.settle().await;

        w.toggle_maximize();
        assert_eq!(w.messages().len(), 3);
        w.toggle_maximize();
        assert_eq!(w.messages().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_after_grace_period() {
        let mut w = widget(&MockFactory::new());
        w.open();
        assert!(!w.tick());
        assert!(!w.is_input_focused());

        tokio::time::sleep(FOCUS_GRACE).await;
        assert!(w.tick());
        assert!(w.is_input_focused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_focus() {
        let mut w = widget(&MockFactory::new());
        w.open();
        w.close();
        tokio::time::sleep(FOCUS_GRACE * 2).await;
        assert!(!w.tick());
        assert!(!w.is_input_focused());
    }

    #[tokio::test]
    async fn test_blank_submit_ignored() {
        let factory = MockFactory::new();
        let mut w = widget(&factory);
        w.set_input("   \t ");
        assert!(!w.submit());
        assert_eq!(w.messages().len(), 1);
        assert!(!w.is_loading());
        assert_eq!(factory.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_assistant() {
        let factory = MockFactory::new();
        factory.push_outcome(MockOutcome::Reply("**Prism AI** is edge-first.".to_string()));
        let mut w = widget(&factory);

        w.set_input("Tell me about Prism AI");
        assert!(w.submit());
        assert!(w.is_loading());
        assert!(!w.is_input_enabled());
        assert!(w.input().is_empty());
        assert_eq!(w.messages().len(), 2);
        assert_eq!(w.messages()[1], ChatMessage::user("Tell me about Prism AI"));

        assert!(w.settle().await);
        assert!(!w.is_loading());
        assert_eq!(w.messages()[2].role, ChatRole::Assistant);
        assert_eq!(w.messages()[2].content, "**Prism AI** is edge-first.");
    }

    #[tokio::test]
    async fn test_poll_response_collects_reply() {
        let factory = MockFactory::new();
        let mut w = widget(&factory);
        w.set_input("hi");
        w.submit();

        let mut landed = false;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if w.poll_response() {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(w.messages().len(), 3);
        assert!(!w.poll_response());
    }

    #[tokio::test]
    async fn test_error_reply_keeps_widget_usable() {
        let factory = MockFactory::new();
        factory.push_outcome(MockOutcome::ResourceNotFound);
        let mut w = widget(&factory);

        w.set_input("hi");
        w.submit();
        w.settle().await;
        assert_eq!(w.messages()[2].content, RESOURCE_NOT_FOUND_REPLY);
        assert!(w.is_input_enabled());
        assert!(w.banner().is_none());
    }

    #[tokio::test]
    async fn test_init_error_disables_input() {
        let factory = MockFactory::new().without_credential();
        let mut w = widget(&factory);

        w.toggle_open();
        assert!(w.is_open());
        assert!(!w.is_input_enabled());
        assert_eq!(w.banner(), Some(CREDENTIAL_MISSING_BANNER));
        assert_eq!(
            w.ui_state().init_error.as_deref(),
            Some(CREDENTIAL_MISSING_BANNER)
        );

        w.set_input("anyone there?");
        assert!(!w.submit());
        assert_eq!(w.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_history_aborts_in_flight() {
        let factory = MockFactory::new();
        factory.push_outcome(MockOutcome::Hang);
        let mut w = widget(&factory);
        w.set_input("hi");
        w.submit();

        w.clear_history();
        assert!(!w.is_loading());
        assert_eq!(w.messages().len(), 1);
        assert!(!w.poll_response());
    }

    #[tokio::test]
    async fn test_sync_view_rebuilds_provider() {
        let factory = MockFactory::new();
        let context = ViewContext::default();
        let mut w = ChatWidget::attached(
            Arc::new(factory.clone()),
            &context,
            PipelineSettings::default(),
        );
        assert!(!w.sync_view());

        context.set_lens(AudienceLens::Engineer);
        assert!(w.sync_view());
        assert_eq!(w.mode().lens, AudienceLens::Engineer);

        let built = factory.built_instructions();
        assert_eq!(built.len(), 2);
        assert_eq!(
            built[1],
            prompt::compose(ViewMode::new(AudienceLens::Engineer, NetworkTier::Fast))
        );
    }

    #[test]
    fn test_cursor_editing_is_char_indexed() {
        let mut w = widget(&MockFactory::new());
        for c in "héllo".chars() {
            w.insert_char(c);
        }
        w.cursor_home();
        w.cursor_right();
        w.delete();
        assert_eq!(w.input(), "hllo");

        w.cursor_end();
        w.backspace();
        assert_eq!(w.input(), "hll");
        assert_eq!(w.cursor(), 3);

        w.cursor_left();
        w.insert_char('é');
        assert_eq!(w.input(), "hlél");
    }

    #[test]
    fn test_scroll_to_bottom_tracks_viewport() {
        let mut w = widget(&MockFactory::new());
        w.set_viewport(10, 2);
        // greeting role line + wrapped greeting + blank line
        let expected = w.content_lines() - 2;
        assert_eq!(w.scroll(), expected);

        w.scroll_up(100);
        assert_eq!(w.scroll(), 0);
        w.scroll_down(1_000);
        assert_eq!(w.scroll(), expected);
    }

    #[test]
    fn test_rendered_lines_replace_estimate() {
        let mut w = widget(&MockFactory::new());
        w.set_viewport(50, 10);
        w.set_rendered_lines(40);
        assert_eq!(w.scroll(), 30);

        // A longer layout is followed while pinned
        w.set_rendered_lines(45);
        assert_eq!(w.scroll(), 35);
    }

    #[test]
    fn test_scrolled_up_view_is_not_dragged_down() {
        let mut w = widget(&MockFactory::new());
        w.set_viewport(50, 10);
        w.set_rendered_lines(40);
        w.scroll_up(5);
        assert_eq!(w.scroll(), 25);

        w.set_rendered_lines(45);
        assert_eq!(w.scroll(), 25);

        w.scroll_down(100);
        assert_eq!(w.scroll(), 35);
        w.set_rendered_lines(50);
        assert_eq!(w.scroll(), 40);
    }

    #[tokio::test]
    async fn test_new_entry_repins_scrolled_view() {
        let mut w = widget(&MockFactory::new());
        w.set_viewport(50, 10);
        w.set_rendered_lines(40);
        w.scroll_up(10);

        w.set_input("hi");
        w.submit();
        w.settle().await;
        w.set_rendered_lines(46);
        assert_eq!(w.scroll(), 36);
    }

    #[test]
    fn test_width_change_drops_measurement() {
        let mut w = widget(&MockFactory::new());
        w.set_viewport(50, 10);
        w.set_rendered_lines(400);
        assert_eq!(w.scroll(), 390);

        w.set_viewport(60, 10);
        assert_eq!(w.scroll(), w.content_lines().saturating_sub(10));
        assert!(w.scroll() < 390);
    }
}
