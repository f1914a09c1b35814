// ABOUTME: App orchestrator: wires storage, session, API client, auth, and chat together.
// ABOUTME: Runs the line-oriented REPL until /quit or end of input.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::{ApiClient, LoginRequest};
use crate::auth::AuthController;
use crate::chat::{ChatCoordinator, ChatView};
use crate::cli::command::HELP;
use crate::cli::render::{
    render_conversations, render_error, render_message, render_session, render_thread,
};
use crate::cli::{Command, Target, parse_line};
use crate::config::Config;
use crate::navigation::{Navigator, Route};
use crate::session::{Session, SessionStore};
use crate::storage::{FileStore, KeyValueStore};

/// Top-level application.
pub struct App {
    config: Config,
    fresh: bool,
}

impl App {
    pub fn new(config: Config, fresh: bool) -> Self {
        Self { config, fresh }
    }

    /// Build every subsystem, then read commands from stdin.
    pub async fn run(self) -> anyhow::Result<()> {
        let storage_path = self.config.storage_path();
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&storage_path)?);
        tracing::debug!(path = %storage_path.display(), "session storage opened");

        let session = SessionStore::new(storage);
        let navigator: Arc<dyn Navigator> = Arc::new(TerminalNavigator);
        let api = Arc::new(ApiClient::new(
            self.config.api.base_url.clone(),
            Duration::from_secs(self.config.api.timeout_seconds),
            Arc::clone(&session),
            Arc::clone(&navigator),
        )?);
        let auth = AuthController::new(api.clone(), Arc::clone(&session), navigator);

        // First subscription hydrates from storage.
        let status = session.subscribe(|s: &Arc<Session>| {
            println!("{}", render_session(s));
        });
        if self.fresh {
            session.clear_auth();
        }

        println!("parley: connected to {}. Type /help for commands.", api.base_url());

        let mut repl = Repl {
            session,
            auth,
            api,
            chat: None,
            page_size: self.config.chat.page_size,
        };
        let result = repl.run().await;
        status.unsubscribe();
        result
    }
}

/// Navigator that turns redirects into hints on the terminal.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(path = route.path(), "navigate");
        match route {
            Route::Home => println!("Ready. /list shows your conversations."),
            Route::Login => println!("Please sign in with /login or /register."),
            Route::Register => println!("Create an account with /register."),
        }
    }
}

struct Repl {
    session: Arc<SessionStore>,
    auth: AuthController,
    api: Arc<ApiClient>,
    /// Present only while signed in.
    chat: Option<ChatCoordinator>,
    page_size: u32,
}

impl Repl {
    async fn run(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.sync_chat().await;

            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            let command = match parse_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("! {e}");
                    continue;
                }
            };
            if !self.handle(command).await {
                break;
            }
        }
        Ok(())
    }

    /// Start the chat after sign-in and drop it after sign-out or an
    /// expired token.
    async fn sync_chat(&mut self) {
        let signed_in = self.session.is_authenticated();
        match (self.chat.is_some(), signed_in) {
            (false, true) => {
                let chat =
                    ChatCoordinator::from_api(Arc::clone(&self.api)).with_page_size(self.page_size);
                chat.load().await;
                let view = chat.snapshot();
                println!("{}", render_conversations(&view));
                report_error(&chat, &view);
                self.chat = Some(chat);
            }
            (true, false) => {
                tracing::debug!("session ended, dropping chat state");
                self.chat = None;
            }
            _ => {}
        }
    }

    /// Returns false when the REPL should stop.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Help => println!("{HELP}"),
            Command::Whoami => println!("{}", render_session(&self.session.snapshot())),
            Command::Login { email, password } => {
                if !self.auth.login(LoginRequest { email, password }).await {
                    self.report_auth_error();
                }
            }
            Command::Register(form) => {
                if !self.auth.register(&form).await {
                    self.report_auth_error();
                }
            }
            Command::Logout => {
                self.auth.logout().await;
                self.chat = None;
            }
            other => match &self.chat {
                Some(chat) => run_chat_command(chat, other).await,
                None => println!("Sign in first with /login or /register."),
            },
        }
        true
    }

    fn report_auth_error(&self) {
        let state = self.auth.state();
        for (field, message) in &state.field_errors {
            println!("! {field}: {message}");
        }
        if let Some(error) = &state.error {
            println!("! {error}");
        }
        self.auth.clear_errors();
    }
}

async fn run_chat_command(chat: &ChatCoordinator, command: Command) {
    match command {
        Command::List { page } => {
            chat.fetch_conversations(page, chat.page_size()).await;
            let view = chat.snapshot();
            println!("{}", render_conversations(&view));
            report_error(chat, &view);
        }
        Command::New { title } => {
            chat.create_conversation(title).await;
            show_thread(chat).await;
        }
        Command::Open(target) => {
            let Some(id) = resolve(chat, &target) else {
                return;
            };
            chat.select_conversation(&id);
            show_thread(chat).await;
        }
        Command::Close => {
            chat.close_conversation();
            println!("Conversation closed.");
        }
        Command::Rename { target, title } => {
            let Some(id) = resolve(chat, &target) else {
                return;
            };
            if let Some(updated) = chat.rename_conversation(&id, &title).await {
                println!("Renamed to {}", updated.display_title());
            }
            report_error(chat, &chat.snapshot());
        }
        Command::Delete(target) => {
            let Some(id) = resolve(chat, &target) else {
                return;
            };
            if chat.delete_conversation(&id).await {
                println!("Deleted {id}");
            }
            report_error(chat, &chat.snapshot());
        }
        Command::Say(text) => {
            if chat.snapshot().active_conversation_id.is_none() {
                println!("No conversation open. Use /open or /new");
                return;
            }
            if let Some(added) = chat.send_message(&text).await {
                // The user's own line is already on screen.
                for message in added.iter().skip(1) {
                    println!("{}", render_message(message));
                }
            }
            report_error(chat, &chat.snapshot());
        }
        _ => {}
    }
}

async fn show_thread(chat: &ChatCoordinator) {
    chat.settle().await;
    let view = chat.snapshot();
    println!("{}", render_thread(&view));
    report_error(chat, &view);
}

/// Print the view's error once, then dismiss it.
fn report_error(chat: &ChatCoordinator, view: &ChatView) {
    if let Some(banner) = render_error(view) {
        println!("{banner}");
        chat.clear_all_errors();
    }
}

/// Turn a REPL target into a conversation id using the loaded list.
fn resolve(chat: &ChatCoordinator, target: &Target) -> Option<String> {
    match target {
        Target::Id(id) => Some(id.clone()),
        Target::Index(n) => {
            let view = chat.snapshot();
            let found = view.conversations.get(n - 1).map(|c| c.id.clone());
            if found.is_none() {
                println!("! No conversation at #{n}. Try /list");
            }
            found
        }
    }
}
