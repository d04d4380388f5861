//! Line-oriented chat front-end over [`ChatStore`].

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};

use achaar_client::ChatStore;
use achaar_core::{format_file_size, AchaarError, Message, Role};

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Send(String),
    Retry,
    Clear,
    Attach(PathBuf),
    Detach(String),
    Docs,
    Help,
    Quit,
    Unknown(String),
    Blank,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Send(line.to_string());
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match (name, arg) {
        ("retry", _) => Input::Retry,
        ("clear", _) => Input::Clear,
        ("docs", _) => Input::Docs,
        ("help", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        ("attach", path) if !path.is_empty() => Input::Attach(PathBuf::from(path)),
        ("detach", id) if !id.is_empty() => Input::Detach(id.to_string()),
        _ => Input::Unknown(line.to_string()),
    }
}

const HELP: &str = "\
Type a message and press enter to send it.
  /attach <path>  upload a PDF and attach its text
  /detach <id>    remove an attached document
  /docs           list attached documents
  /retry          resend the last message
  /clear          start a new chat (documents stay attached)
  /quit           leave";

fn render(message: &Message) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%-I:%M %p");
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "achaar",
    };
    format!("[{}] {}: {}", time, who, message.content)
}

fn last_user_index(messages: &[Message]) -> Option<usize> {
    messages.iter().rposition(|m| m.role == Role::User)
}

/// Drives one session until `/quit` or end of input.
pub struct Terminal {
    store: Arc<ChatStore>,
    shown: usize,
}

impl Terminal {
    pub fn new(store: Arc<ChatStore>) -> Self {
        Self { store, shown: 0 }
    }

    /// Print messages appended since the last call.
    fn flush_transcript(&mut self) {
        let state = self.store.snapshot();
        if state.messages.len() < self.shown {
            // Transcript was truncated or cleared.
            self.shown = 0;
        }
        for message in &state.messages[self.shown..] {
            println!("{}", render(message));
        }
        self.shown = state.messages.len();
    }

    /// Run a send-style intent, echoing transcript updates and retry
    /// notices as they arrive.
    async fn with_status<F>(&mut self, send: F)
    where
        F: std::future::Future<Output = ()>,
    {
        let mut rx = self.store.subscribe();
        let mut last_notice: Option<String> = None;
        tokio::pin!(send);
        loop {
            tokio::select! {
                _ = &mut send => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        (&mut send).await;
                        break;
                    }
                    let state = rx.borrow_and_update().clone();
                    self.flush_transcript();
                    if state.is_loading && state.error.is_some() && state.error != last_notice {
                        if let Some(notice) = &state.error {
                            eprintln!("  ... {}", notice);
                        }
                    }
                    last_notice = state.error.clone();
                }
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), AchaarError> {
        println!("{}", HELP);
        self.flush_transcript();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_input(&line) {
                Input::Blank => continue,
                Input::Quit => break,
                Input::Help => println!("{}", HELP),
                Input::Unknown(text) => println!("Unknown command: {} (try /help)", text),
                Input::Send(text) => {
                    let store = Arc::clone(&self.store);
                    self.with_status(async move { store.send_message(&text).await })
                        .await;
                }
                Input::Retry => {
                    let store = Arc::clone(&self.store);
                    // Everything after the last user message is about to go.
                    if let Some(index) = last_user_index(&self.store.snapshot().messages) {
                        self.shown = index + 1;
                    }
                    self.with_status(async move { store.retry_last_message().await })
                        .await;
                }
                Input::Clear => {
                    self.store.clear_chat();
                    self.shown = 0;
                }
                Input::Attach(path) => match self.store.upload_document(&path).await {
                    Ok(doc) => println!(
                        "Attached {} ({}) as {}",
                        doc.name,
                        format_file_size(doc.size),
                        doc.id
                    ),
                    Err(e) => println!("Upload failed: {}", e),
                },
                Input::Detach(id) => {
                    if self.store.remove_document(&id) {
                        println!("Detached {}", id);
                    } else {
                        println!("No document with id {}", id);
                    }
                }
                Input::Docs => {
                    let state = self.store.snapshot();
                    if state.documents.is_empty() {
                        println!("No documents attached");
                    }
                    for doc in &state.documents {
                        println!(
                            "  {}  {}  {}",
                            doc.id,
                            doc.name,
                            format_file_size(doc.size)
                        );
                    }
                }
            }
            self.flush_transcript();
        }
        Ok(())
    }
}
