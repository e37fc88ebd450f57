use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use workbench_core::{update, AppState, ArtifactTab, Msg, SessionPhase};
use workbench_logging::{wb_info, wb_warn};

use crate::cli::{parse_chat_line, ChatCommand, CHAT_HELP};
use crate::effects::{timestamp, translate_event, EffectRunner};
use crate::persistence::{load_session, save_session};
use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct App {
    state: AppState,
    runner: EffectRunner,
    last_status: String,
}

impl App {
    /// Starts from the session saved in the runner's output directory, if any.
    pub fn new(runner: EffectRunner) -> Self {
        let mut app = Self {
            state: AppState::new(),
            runner,
            last_status: String::new(),
        };
        if let Some(snapshot) = load_session(app.runner.output()) {
            app.dispatch(Msg::RestoreSession(snapshot));
        }
        app
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let mut queue = vec![msg];
        while let Some(msg) = queue.pop() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            let was_dirty = state.consume_dirty();
            self.state = state;
            let mut feedback = self.runner.run(effects);
            feedback.reverse();
            queue.extend(feedback);
            if was_dirty {
                self.render_progress();
            }
        }
    }

    fn render_progress(&mut self) {
        if !self.state.is_busy() {
            return;
        }
        let status = render::status_line(&self.state.view());
        if status != self.last_status {
            eprintln!("{status}");
            self.last_status = status;
        }
    }

    /// Feeds engine events into the state until the request and uploads settle.
    pub fn pump(&mut self, timeout: Option<Duration>) {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        while self.state.is_busy() || self.state.has_pending_uploads() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) && self.state.is_busy()
            {
                wb_warn!("Request timed out, cancelling");
                eprintln!("Timed out.");
                self.dispatch(Msg::CancelRequested);
                continue;
            }
            if let Some(event) = self.runner.next_event(POLL_INTERVAL) {
                for msg in translate_event(event) {
                    self.dispatch(msg);
                }
            }
        }
        self.last_status.clear();
    }

    pub fn add_text_document(&mut self, path: &Path) -> Result<()> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_uppercase())
            .unwrap_or_else(|| "TXT".to_string());
        self.dispatch(Msg::DocumentAdded {
            name,
            kind,
            content,
        });
        Ok(())
    }

    /// Sends one message and waits for the outcome.
    pub fn ask(&mut self, message: &str, timeout: Option<Duration>) {
        let before = self.state.messages().len();
        self.dispatch(Msg::InputChanged(message.to_string()));
        self.dispatch(Msg::Submitted { at: timestamp() });
        self.pump(timeout);
        self.print_outcome(before);
    }

    fn print_outcome(&self, messages_before: usize) {
        let view = self.state.view();
        for message in view.messages.iter().skip(messages_before + 1) {
            println!("{}", render::render_message(message));
        }
        if let Some(error) = &view.error {
            eprintln!("{error}");
        } else if view.phase == SessionPhase::Idle && view.messages.len() <= messages_before + 1 {
            eprintln!("No complete answer was received.");
        }
    }

    pub fn upload(&mut self, path: &str) {
        self.dispatch(Msg::UploadRequested {
            path: path.to_string(),
        });
        self.pump(None);
        let view = self.state.view();
        match &view.error {
            Some(error) => eprintln!("{error}"),
            None => println!(
                "{}",
                render::render_documents(&view.documents, view.selected_document.as_deref())
            ),
        }
    }

    pub fn print_tab(&mut self, tab: ArtifactTab) {
        self.dispatch(Msg::TabSelected(tab));
        println!("{}", render::render_tab(&self.state.view()));
    }

    pub fn print_conversation(&self) {
        for message in self.state.messages() {
            println!("{}", render::render_message(message));
        }
    }

    pub fn chat(&mut self, timeout: Option<Duration>) -> Result<()> {
        println!("Type a message, or /help.");
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            match parse_chat_line(&line?) {
                ChatCommand::Say(text) => self.ask(&text, timeout),
                ChatCommand::Tab(tab) => self.print_tab(tab),
                ChatCommand::Version(n) => {
                    self.dispatch(Msg::TranslationSelected(n - 1));
                    self.print_tab(ArtifactTab::Translation);
                }
                ChatCommand::Add(path) => {
                    if let Err(err) = self.add_text_document(&path) {
                        eprintln!("{err:#}");
                    }
                }
                ChatCommand::Upload(path) => self.upload(&path),
                ChatCommand::Select(id) => self.dispatch(Msg::DocumentSelected(id)),
                ChatCommand::Tags { id, tags } => {
                    self.dispatch(Msg::DocumentTagsEdited { id, tags })
                }
                ChatCommand::Remove(id) => self.dispatch(Msg::DocumentRemoved { id }),
                ChatCommand::Docs => {
                    let view = self.state.view();
                    println!(
                        "{}",
                        render::render_documents(
                            &view.documents,
                            view.selected_document.as_deref()
                        )
                    );
                }
                ChatCommand::Export => self.dispatch(Msg::ExportRequested),
                ChatCommand::NewCase => {
                    self.dispatch(Msg::NewCase);
                    println!("New case started.");
                }
                ChatCommand::Help => println!("{CHAT_HELP}"),
                ChatCommand::Quit => break,
                ChatCommand::Empty => {}
                ChatCommand::Unknown(line) => eprintln!("Unknown command: {line}"),
            }
        }
        Ok(())
    }

    /// Saves the session; document edits are not persisted by the core on their own.
    pub fn shutdown(self) {
        save_session(self.runner.output(), &self.state.snapshot());
        wb_info!("Session saved to {:?}", self.runner.output().path());
    }
}
