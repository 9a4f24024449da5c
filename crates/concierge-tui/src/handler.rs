use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::App;
use crate::tui::AppEvent;

const PAGE_SCROLL: u16 = 5;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::Char('`') {
        app.toggle_console();
        return;
    }

    if app.show_console {
        handle_console(app, key);
    } else if app.widget.is_open() && app.widget.is_input_focused() {
        handle_chat_input(app, key);
    } else {
        handle_page(app, key);
    }
}

fn handle_console(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('f') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.console.toggle_maximized();
        return;
    }

    match key.code {
        KeyCode::Esc => app.show_console = false,
        KeyCode::Enter => app.run_console_command(),
        KeyCode::Backspace => {
            app.console_input.pop();
        }
        KeyCode::Char(c) => app.console_input.push(c),
        _ => {}
    }
}

fn handle_chat_input(app: &mut App, key: KeyEvent) {
    let widget = &mut app.widget;

    // Size toggle without leaving the text entry
    if key.code == KeyCode::Char('f') && key.modifiers.contains(KeyModifiers::CONTROL) {
        widget.toggle_maximize();
        return;
    }

    match key.code {
        KeyCode::Esc => widget.close(),
        KeyCode::Tab => widget.blur_input(),
        KeyCode::PageUp => widget.scroll_up(PAGE_SCROLL),
        KeyCode::PageDown => widget.scroll_down(PAGE_SCROLL),
        KeyCode::Enter => {
            widget.submit();
        }
        // No editing while a reply is pending or the client failed to start
        _ if !widget.is_input_enabled() => {}
        KeyCode::Backspace => widget.backspace(),
        KeyCode::Delete => widget.delete(),
        KeyCode::Left => widget.cursor_left(),
        KeyCode::Right => widget.cursor_right(),
        KeyCode::Home => widget.cursor_home(),
        KeyCode::End => widget.cursor_end(),
        KeyCode::Char(c) => widget.insert_char(c),
        _ => {}
    }
}

fn handle_page(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Chat widget
        KeyCode::Char('c') | KeyCode::Enter => app.widget.toggle_open(),
        KeyCode::Char('m') => app.widget.toggle_maximize(),
        KeyCode::Char('i') | KeyCode::Tab => app.widget.focus_input(),
        KeyCode::Esc => app.widget.close(),
        KeyCode::PageUp => app.widget.scroll_up(PAGE_SCROLL),
        KeyCode::PageDown => app.widget.scroll_down(PAGE_SCROLL),

        // View modes
        KeyCode::Char('l') => app.cycle_lens(),
        KeyCode::Char('t') => app.cycle_tier(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::{AudienceLens, Config, NetworkTier, ViewMode, WidgetState};

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_open_focus_type_submit() {
        let mut app = App::new(&Config::new(), ViewMode::default(), true);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.widget.state(), WidgetState::Open);

        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Where did Amos study?");
        assert_eq!(app.widget.input(), "Where did Amos study?");

        press(&mut app, KeyCode::Enter);
        assert!(app.widget.is_loading());
        app.widget.settle().await;
        assert_eq!(app.widget.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_page_keys_do_not_type() {
        let mut app = App::new(&Config::new(), ViewMode::default(), true);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.widget.state(), WidgetState::Maximized);
        assert!(app.widget.input().is_empty());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.widget.state(), WidgetState::Closed);
    }

    #[tokio::test]
    async fn test_missing_key_blocks_typing() {
        std::env::remove_var("GEMINI_API_KEY");
        let mut app = App::new(&Config::new(), ViewMode::default(), false);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "hi");

        assert!(app.widget.banner().is_some());
        assert!(app.widget.input().is_empty());
        assert!(app.widget.is_open());
    }

    #[tokio::test]
    async fn test_backtick_toggles_console() {
        let mut app = App::new(&Config::new(), ViewMode::default(), true);
        press(&mut app, KeyCode::Char('`'));
        assert!(app.show_console);
        type_text(&mut app, "tier offline");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.widget.mode().tier, concierge_core::NetworkTier::Offline);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_console);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_ignored_while_reply_pending() {
        let mode = ViewMode::new(AudienceLens::Recruiter, NetworkTier::Slow);
        let mut app = App::new(&Config::new(), mode, true);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "first");
        press(&mut app, KeyCode::Enter);
        assert!(app.widget.is_loading());

        type_text(&mut app, "xyz");
        press(&mut app, KeyCode::Backspace);
        assert!(app.widget.input().is_empty());
        assert!(!app.widget.is_input_enabled());

        app.widget.settle().await;
        type_text(&mut app, "xyz");
        assert_eq!(app.widget.input(), "xyz");
    }

    #[tokio::test]
    async fn test_console_ctrl_f_toggles_fullscreen() {
        let mut app = App::new(&Config::new(), ViewMode::default(), true);
        press(&mut app, KeyCode::Char('`'));
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL)),
        );
        assert!(app.console.is_maximized());
        assert!(app.console_input.is_empty());
    }
}
