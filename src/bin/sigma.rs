use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::Clear;
use sigma_chat::app::{ask_once, build_runtime, TuiMode};
use sigma_chat::config::Config;
use sigma_chat::logging;
use sigma_chat::runtime::frontend::{FrontendAdapter, ScrollAction, UserInputEvent};
use sigma_chat::runtime::mode::RuntimeMode;
use sigma_chat::terminal::TerminalSession;
use sigma_chat::types::ReasoningMode;
use sigma_chat::ui::editor::InputEditor;
use sigma_chat::ui::layout::split_chat_panes;
use sigma_chat::ui::render::{input_visual_rows, render_input, render_messages, render_status_line};
use std::time::Duration;

const MAX_INPUT_PANE_ROWS: usize = 6;
const PAGE_STEP: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "sigma")]
#[command(version, about = "Terminal client for the sigma reasoning backend", long_about = None)]
struct Args {
    /// Ask one question, print the answer and exit
    #[arg(long, value_name = "QUESTION")]
    ask: Option<String>,

    /// Backend base URL (overrides SIGMA_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Reasoning mode: auto, pro or fast (overrides SIGMA_MODE)
    #[arg(long)]
    mode: Option<ReasoningMode>,

    /// Do not request the thinking trace
    #[arg(long)]
    no_thinking: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = url.trim().to_string();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.no_thinking {
            config.include_thinking = false;
        }
    }
}

struct ManagedTuiFrontend {
    terminal: TerminalSession,
    editor: InputEditor,
    quit: bool,
}

impl ManagedTuiFrontend {
    fn new() -> Result<Self> {
        let terminal = TerminalSession::enter()?;
        Self::drain_startup_events();
        Ok(Self {
            terminal,
            editor: InputEditor::new(),
            quit: false,
        })
    }

    fn drain_startup_events() {
        for _ in 0..1024 {
            match event::poll(Duration::from_millis(0)) {
                Ok(true) => {
                    if event::read().is_err() {
                        break;
                    }
                }
                Ok(false) | Err(_) => break,
            }
        }
    }

    fn map_key(&mut self, key: KeyEvent, mode: &TuiMode) -> Option<UserInputEvent> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Some(UserInputEvent::Interrupt),
            KeyCode::Char('d') if ctrl => {
                if self.editor.is_empty() {
                    self.quit = true;
                }
                None
            }
            KeyCode::Char('j') if ctrl => {
                self.editor.insert_str("\n");
                None
            }
            KeyCode::Char('p') if ctrl => {
                self.editor.history_prev();
                None
            }
            KeyCode::Char('n') if ctrl => {
                self.editor.history_next();
                None
            }
            KeyCode::PageUp => Some(UserInputEvent::Scroll(ScrollAction::PageUp(PAGE_STEP))),
            KeyCode::PageDown => Some(UserInputEvent::Scroll(ScrollAction::PageDown(PAGE_STEP))),
            KeyCode::Up => Some(UserInputEvent::Scroll(ScrollAction::LineUp)),
            KeyCode::Down => Some(UserInputEvent::Scroll(ScrollAction::LineDown)),
            KeyCode::Home if ctrl => Some(UserInputEvent::Scroll(ScrollAction::Home)),
            KeyCode::End if ctrl => Some(UserInputEvent::Scroll(ScrollAction::End)),
            KeyCode::Home => {
                self.editor.move_home();
                None
            }
            KeyCode::End => {
                self.editor.move_end();
                None
            }
            KeyCode::Left => {
                self.editor.move_left();
                None
            }
            KeyCode::Right => {
                self.editor.move_right();
                None
            }
            KeyCode::Backspace => {
                self.editor.backspace();
                None
            }
            KeyCode::Delete => {
                self.editor.delete();
                None
            }
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.editor.insert_str("\n");
                None
            }
            KeyCode::Enter => self
                .editor
                .submit(|text| mode.accepts_input(text))
                .map(UserInputEvent::Text),
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.editor.insert_str(&ch.to_string());
                None
            }
            _ => None,
        }
    }
}

impl FrontendAdapter<TuiMode> for ManagedTuiFrontend {
    fn poll_user_input(&mut self, mode: &TuiMode) -> Option<UserInputEvent> {
        if mode.quit_requested() {
            self.quit = true;
            return None;
        }

        let Ok(has_event) = event::poll(Duration::from_millis(16)) else {
            self.quit = true;
            return None;
        };
        if !has_event {
            return None;
        }

        let Ok(ev) = event::read() else {
            self.quit = true;
            return None;
        };

        match ev {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    return None;
                }
                self.map_key(key, mode)
            }
            Event::Paste(text) => {
                self.editor.insert_str(&text);
                None
            }
            _ => None,
        }
    }

    fn render(&mut self, mode: &TuiMode) {
        let status = mode.status_line();
        let lines = mode.history_lines();
        let scroll_back = mode.history_scroll_back();
        let input = self.editor.buffer();
        let cursor = self.editor.cursor();

        let result = self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Clear, area);
            let input_width = area.width.saturating_sub(2).max(1) as usize;
            let input_rows = input_visual_rows(input, input_width).clamp(1, MAX_INPUT_PANE_ROWS) as u16;
            let panes = split_chat_panes(area, input_rows);

            render_status_line(frame, panes.header, &status);
            render_messages(frame, panes.history, &lines, scroll_back);
            render_input(frame, panes.input, input, cursor);
        });
        if let Err(error) = result {
            tracing::error!(%error, "terminal draw failed");
            self.quit = true;
        }
    }

    fn should_quit(&self) -> bool {
        self.quit
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init()?;

    let mut config = Config::load()?;
    args.apply(&mut config);
    config.validate()?;
    tracing::info!(api_url = %config.api_url, mode = %config.mode, "starting sigma");

    if let Some(question) = &args.ask {
        return ask_once(&config, question).await;
    }

    let (mut runtime, mut ctx) = build_runtime(config)?;
    let mut frontend = ManagedTuiFrontend::new()?;
    runtime.run(&mut frontend, &mut ctx).await;
    Ok(())
}
