use std::sync::Arc;

use concierge_core::{
    ChatWidget, Config, Console, ConsoleEffect, GeminiFactory, MockFactory, ProviderFactory,
    ViewContext, ViewMode,
};

pub struct App {
    // Core state
    pub should_quit: bool,
    pub context: ViewContext,
    pub provider_label: String,

    // Chat widget
    pub widget: ChatWidget,

    // System console overlay
    pub show_console: bool,
    pub console: Console,
    pub console_input: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config, mode: ViewMode, use_mock: bool) -> Self {
        let (factory, provider_label): (Arc<dyn ProviderFactory>, String) = if use_mock {
            (Arc::new(MockFactory::new()), "Mock".to_string())
        } else {
            let factory = GeminiFactory::new(config.resolve_api_key())
                .with_model(config.model.clone())
                .with_base_url(config.base_url.clone());
            (Arc::new(factory), config.model.clone())
        };

        Self::with_factory(config, mode, factory, provider_label)
    }

    pub fn with_factory(
        config: &Config,
        mode: ViewMode,
        factory: Arc<dyn ProviderFactory>,
        provider_label: String,
    ) -> Self {
        let context = ViewContext::new(mode);
        let widget = ChatWidget::attached(factory, &context, config.pipeline_settings());
        let console = Console::new(context.clone());

        Self {
            should_quit: false,
            context,
            provider_label,
            widget,
            show_console: false,
            console,
            console_input: String::new(),
            animation_frame: 0,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.context.snapshot()
    }

    pub fn cycle_lens(&mut self) {
        let next = self.mode().lens.next();
        self.context.set_lens(next);
    }

    pub fn cycle_tier(&mut self) {
        let next = self.mode().tier.next();
        self.context.set_tier(next);
    }

    /// Called on every Tick event
    pub fn tick(&mut self) {
        self.widget.sync_view();
        self.widget.tick();
        self.widget.poll_response();
        if self.widget.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn toggle_console(&mut self) {
        self.show_console = !self.show_console;
        self.console_input.clear();
    }

    pub fn run_console_command(&mut self) {
        let command = std::mem::take(&mut self.console_input);
        match self.console.execute(&command) {
            ConsoleEffect::None => {}
            ConsoleEffect::Exit => self.show_console = false,
            ConsoleEffect::ClearChat => self.widget.clear_history(),
        }
        // Console commands may have changed the view mode
        self.widget.sync_view();
    }
}
