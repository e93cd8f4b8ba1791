//! Interactive chat loop.
//!
//! Input lines are turned into [`ReplCommand`]s through a [`CommandTable`];
//! anything not starting with `/` is sent as a message. The session store
//! reports changes through its event hook, and the loop redraws only the
//! parts that changed after each command.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use super::render;
use crate::app::ChatApp;
use crate::auth::{AuthProvider, AuthUser};
use crate::error::Result;
use crate::session::{ChatEvent, SessionStore};

/// A user action understood by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    New,
    List,
    Show,
    Select(String),
    Delete(Option<String>),
    Rename(String),
    Send(String),
    Logout,
    Help,
    Quit,
}

/// One registered slash command.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub parse: fn(&str) -> std::result::Result<ReplCommand, String>,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Slash-command registry owned by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    specs: Vec<CommandSpec>,
}

fn required(arg: &str, usage: &str) -> std::result::Result<String, String> {
    if arg.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(arg.to_string())
    }
}

impl CommandTable {
    /// The built-in command set.
    pub fn standard() -> Self {
        let mut table = Self::default();
        table.register(CommandSpec {
            name: "new",
            usage: "/new",
            summary: "start a new conversation",
            parse: |_| Ok(ReplCommand::New),
        });
        table.register(CommandSpec {
            name: "list",
            usage: "/list",
            summary: "show all conversations",
            parse: |_| Ok(ReplCommand::List),
        });
        table.register(CommandSpec {
            name: "show",
            usage: "/show",
            summary: "print the active conversation",
            parse: |_| Ok(ReplCommand::Show),
        });
        table.register(CommandSpec {
            name: "select",
            usage: "/select <number|id>",
            summary: "switch to another conversation",
            parse: |arg| required(arg, "/select <number|id>").map(ReplCommand::Select),
        });
        table.register(CommandSpec {
            name: "delete",
            usage: "/delete [number|id]",
            summary: "delete a conversation (default: the active one)",
            parse: |arg| {
                Ok(ReplCommand::Delete(
                    (!arg.is_empty()).then(|| arg.to_string()),
                ))
            },
        });
        table.register(CommandSpec {
            name: "rename",
            usage: "/rename <title>",
            summary: "retitle the active conversation",
            parse: |arg| required(arg, "/rename <title>").map(ReplCommand::Rename),
        });
        table.register(CommandSpec {
            name: "logout",
            usage: "/logout",
            summary: "sign out and leave",
            parse: |_| Ok(ReplCommand::Logout),
        });
        table.register(CommandSpec {
            name: "help",
            usage: "/help",
            summary: "show this help",
            parse: |_| Ok(ReplCommand::Help),
        });
        table.register(CommandSpec {
            name: "quit",
            usage: "/quit",
            summary: "leave the chat",
            parse: |_| Ok(ReplCommand::Quit),
        });
        table
    }

    /// Add or replace a command.
    pub fn register(&mut self, spec: CommandSpec) {
        match self.specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
    }

    /// Interpret one input line.
    pub fn parse(&self, line: &str) -> std::result::Result<ReplCommand, String> {
        let Some(rest) = line.trim_start().strip_prefix('/') else {
            return Ok(ReplCommand::Send(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest.trim(), ""),
        };
        match self.specs.iter().find(|s| s.name == name) {
            Some(spec) => (spec.parse)(arg),
            None => Err(format!("Unknown command /{name}. Type /help for commands.")),
        }
    }

    pub fn help(&self) -> String {
        let width = self.specs.iter().map(|s| s.usage.len()).max().unwrap_or(0);
        let mut out = String::from("Commands:\n");
        for spec in &self.specs {
            out.push_str(&format!("  {:<width$}  {}\n", spec.usage, spec.summary));
        }
        out.push_str("Anything else is sent as a message.\n");
        out
    }
}

/// Resolve a 1-based list number, a full id, or a unique id prefix.
pub fn resolve_target(store: &SessionStore, arg: &str) -> Option<String> {
    if let Ok(n) = arg.parse::<usize>() {
        if n >= 1 {
            if let Some(id) = store.id_at(n - 1) {
                return Some(id.to_string());
            }
        }
    }
    if store.contains(arg) {
        return Some(arg.to_string());
    }
    let mut matches = store
        .conversations()
        .into_iter()
        .filter(|row| row.id.starts_with(arg));
    match (matches.next(), matches.next()) {
        (Some(row), None) => Some(row.id),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Dirty {
    conversations: AtomicBool,
    messages: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The chat loop writing to `out`.
pub struct Repl<W: Write> {
    app: ChatApp,
    auth: Option<Arc<dyn AuthProvider>>,
    table: CommandTable,
    out: W,
    dirty: Arc<Dirty>,
    /// Active id and message count already on screen.
    shown: (Option<String>, usize),
}

impl<W: Write> Repl<W> {
    /// Wire the loop to `app`. With `show_typing`, a "thinking" marker is
    /// written to stderr while a reply is pending.
    pub fn new(
        mut app: ChatApp,
        auth: Option<Arc<dyn AuthProvider>>,
        out: W,
        show_typing: bool,
    ) -> Self {
        let dirty = Arc::new(Dirty::default());
        let sink_dirty = dirty.clone();
        app.store_mut().subscribe(Arc::new(move |event: &ChatEvent| match event {
            ChatEvent::ConversationsChanged => {
                sink_dirty.conversations.store(true, Ordering::Relaxed);
            }
            ChatEvent::MessagesChanged => sink_dirty.messages.store(true, Ordering::Relaxed),
            ChatEvent::Typing(active) if show_typing => {
                let mut err = std::io::stderr();
                let _ = if *active {
                    write!(err, "bot is thinking...")
                } else {
                    write!(err, "\r\x1b[2K")
                };
                let _ = err.flush();
            }
            ChatEvent::Typing(_) => {}
        }));
        Self {
            app,
            auth,
            table: CommandTable::standard(),
            out,
            dirty,
            shown: (None, 0),
        }
    }

    pub fn app(&self) -> &ChatApp {
        &self.app
    }

    pub fn into_parts(self) -> (ChatApp, W) {
        (self.app, self.out)
    }

    /// Read commands from `input` until `/quit`, `/logout`, or end of input.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        write!(self.out, "{}", render::greeting(self.app.user()))?;
        self.draw_list()?;
        self.draw_transcript()?;

        let mut lines = input.lines();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;
            let Some(line) = lines.next_line().await? else {
                writeln!(self.out)?;
                break;
            };
            let flow = match self.table.parse(&line) {
                Ok(command) => self.execute(command).await?,
                Err(message) => {
                    writeln!(self.out, "{message}")?;
                    Flow::Continue
                }
            };
            self.redraw()?;
            if flow == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    async fn execute(&mut self, command: ReplCommand) -> Result<Flow> {
        match command {
            ReplCommand::New => {
                self.app.store_mut().create_conversation();
            }
            ReplCommand::List => {
                self.dirty.conversations.store(true, Ordering::Relaxed);
            }
            ReplCommand::Show => {
                self.shown = (None, 0);
                self.dirty.messages.store(true, Ordering::Relaxed);
            }
            ReplCommand::Select(arg) => match resolve_target(self.app.store(), &arg) {
                Some(id) => {
                    self.app.store_mut().select_conversation(&id);
                }
                None => writeln!(self.out, "No conversation matches {arg}.")?,
            },
            ReplCommand::Delete(arg) => {
                let target = match arg.as_deref() {
                    Some(arg) => resolve_target(self.app.store(), arg),
                    None => self.app.store().active_id().map(str::to_string),
                };
                match target {
                    Some(id) => {
                        self.app.store_mut().delete_conversation(&id);
                    }
                    None => writeln!(self.out, "No conversation to delete.")?,
                }
            }
            ReplCommand::Rename(title) => match self.app.store().active_id().map(str::to_string) {
                Some(id) => {
                    self.app.store_mut().rename_conversation(&id, &title);
                }
                None => writeln!(self.out, "No active conversation.")?,
            },
            ReplCommand::Send(text) => {
                self.app.send_message(&text).await;
            }
            ReplCommand::Logout => {
                let Some(auth) = self.auth.clone() else {
                    writeln!(self.out, "Not signed in.")?;
                    return Ok(Flow::Continue);
                };
                if let Err(e) = auth.sign_out().await {
                    warn!(error = %e, "Sign-out failed");
                    writeln!(self.out, "Sign-out failed: {e}")?;
                    return Ok(Flow::Continue);
                }
                self.app.set_user(AuthUser::Unauthenticated);
                writeln!(self.out, "Signed out.")?;
                return Ok(Flow::Quit);
            }
            ReplCommand::Help => write!(self.out, "{}", self.table.help())?,
            ReplCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn redraw(&mut self) -> Result<()> {
        if self.dirty.conversations.swap(false, Ordering::Relaxed) {
            self.draw_list()?;
        }
        if self.dirty.messages.swap(false, Ordering::Relaxed) {
            self.draw_messages()?;
        }
        Ok(())
    }

    fn draw_list(&mut self) -> Result<()> {
        write!(self.out, "{}", render::conversation_list(&self.app.store().conversations()))?;
        Ok(())
    }

    fn draw_transcript(&mut self) -> Result<()> {
        let store = self.app.store();
        write!(
            self.out,
            "{}",
            render::transcript(store.active_title(), store.active_messages())
        )?;
        self.shown = (
            store.active_id().map(str::to_string),
            store.active_messages().len(),
        );
        Ok(())
    }

    /// Print only messages added since the last draw when the same
    /// conversation is still active; otherwise the whole transcript.
    fn draw_messages(&mut self) -> Result<()> {
        let store = self.app.store();
        let active = store.active_id().map(str::to_string);
        let messages = store.active_messages();
        let (shown_id, shown_count) = &self.shown;
        if active.is_some() && active == *shown_id && *shown_count <= messages.len() {
            let fresh: String = messages[*shown_count..]
                .iter()
                .map(render::message_line)
                .collect();
            let count = messages.len();
            write!(self.out, "{fresh}")?;
            self.shown.1 = count;
            return Ok(());
        }
        self.draw_transcript()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    #[test]
    fn plain_lines_are_messages() {
        let table = CommandTable::standard();
        assert_eq!(table.parse("hello"), Ok(ReplCommand::Send("hello".to_string())));
        assert_eq!(table.parse("  "), Ok(ReplCommand::Send("  ".to_string())));
    }

    #[test]
    fn slash_commands_take_arguments() {
        let table = CommandTable::standard();
        assert_eq!(table.parse("/new"), Ok(ReplCommand::New));
        assert_eq!(
            table.parse("/rename  Trip plans "),
            Ok(ReplCommand::Rename("Trip plans".to_string()))
        );
        assert_eq!(table.parse("/delete"), Ok(ReplCommand::Delete(None)));
        assert_eq!(
            table.parse("/delete 2"),
            Ok(ReplCommand::Delete(Some("2".to_string())))
        );
        assert!(table.parse("/select").unwrap_err().starts_with("Usage:"));
        assert!(table.parse("/bogus").unwrap_err().contains("Unknown command /bogus"));
    }

    #[test]
    fn register_replaces_existing_command() {
        let mut table = CommandTable::standard();
        table.register(CommandSpec {
            name: "new",
            usage: "/new",
            summary: "custom",
            parse: |_| Ok(ReplCommand::Help),
        });
        assert_eq!(table.parse("/new"), Ok(ReplCommand::Help));
        assert_eq!(table.help().matches("/new").count(), 1);
    }

    #[test]
    fn targets_resolve_by_number_id_or_prefix() {
        let mut store = SessionStore::open(Arc::new(MemoryKeyValueStore::new()));
        let first = store.create_conversation();
        let second = store.create_conversation();
        assert_eq!(resolve_target(&store, "1"), Some(first.clone()));
        assert_eq!(resolve_target(&store, "2"), Some(second.clone()));
        assert_eq!(resolve_target(&store, &second), Some(second.clone()));
        assert_eq!(resolve_target(&store, &first[..8]), Some(first.clone()));
        assert_eq!(resolve_target(&store, "100000000000"), None);
        assert_eq!(resolve_target(&store, "not-an-id"), None);
    }
}
