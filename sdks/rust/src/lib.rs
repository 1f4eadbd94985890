//! Rust SDK for faq-chat
//!
//! Two layers:
//!
//! - [`Client`] (default `http-client` feature): typed access to the
//!   server's JSON API.
//! - [`widget::ChatClient`]: the chat widget itself. It owns the role
//!   selection, the message input and an append-only message list, and turns
//!   every non-blank submission into one request whose outcome is always
//!   shown, as the answer or as a fixed fallback line.
//!
//! ```rust,no_run
//! use faq_chat_sdk::{Client, widget::{ChatClient, NullRenderer}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:5000")?;
//!     let mut chat = ChatClient::new(client, "student", NullRenderer);
//!
//!     chat.input_mut().set("When are the exams?");
//!     if let Some(pending) = chat.submit() {
//!         let reply = pending.await;
//!         println!("{}", reply.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod types;
pub mod widget;

#[cfg(feature = "http-client")]
pub mod client;

// Re-exports
pub use error::Error;
pub use types::*;

#[cfg(feature = "http-client")]
pub use client::Client;
