//! Terminal chat client.
//!
//! Each line typed is a message; Enter sends it. `/role <name>` switches the
//! role and `/quit` (or end of input) exits after outstanding replies arrive.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use faq_chat_sdk::widget::{ChatClient, Key, Renderer};
use faq_chat_sdk::{Client, DisplayedEntry, MessageClass};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server base URL
    #[arg(long, env = "FAQ_CHAT_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Role sent with each question
    #[arg(long, env = "FAQ_CHAT_ROLE", default_value = "student")]
    role: String,

    /// Seconds before a request counts as failed
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

/// Prints entries to stdout as they are appended.
#[derive(Debug, Default)]
struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render(&mut self, entry: &DisplayedEntry) {
        match entry.class {
            MessageClass::User => println!("you > {}", entry.text),
            MessageClass::Bot => println!("bot > {}", entry.text),
        }
    }

    fn scroll_to_latest(&mut self) {
        let _ = std::io::stdout().flush();
    }
}

enum Command<'a> {
    Quit,
    Role(&'a str),
    Message(&'a str),
}

fn parse_line(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    if trimmed == "/quit" {
        Command::Quit
    } else if trimmed == "/role" {
        Command::Role("")
    } else if let Some(role) = trimmed.strip_prefix("/role ") {
        Command::Role(role.trim())
    } else {
        Command::Message(line)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let transport = Client::with_timeout(&args.server, Duration::from_secs(args.timeout_secs))?;
    let mut chat = ChatClient::new(transport, args.role, TerminalRenderer);

    println!(
        "Connected to {} as '{}'. Type a question, /role <name>, or /quit.",
        args.server,
        chat.role()
    );

    let mut pending = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Command::Quit => break,
                    Command::Role(role) if !role.is_empty() => {
                        chat.set_role(role);
                        println!("(role is now '{role}')");
                    }
                    Command::Role(_) => println!("(usage: /role <name>)"),
                    Command::Message(text) => {
                        chat.input_mut().set(text);
                        if let Some(reply) = chat.handle_key(Key::Enter) {
                            pending.spawn(reply);
                        }
                    }
                }
            }
            Some(done) = pending.join_next(), if !pending.is_empty() => {
                if let Err(e) = done {
                    tracing::error!(error = %e, "Reply task failed");
                }
            }
        }
    }

    while let Some(done) = pending.join_next().await {
        if let Err(e) = done {
            tracing::error!(error = %e, "Reply task failed");
        }
    }
    Ok(())
}
