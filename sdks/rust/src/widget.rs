//! Chat widget: role selector, message input and an append-only message list
//! wired to a [`ChatTransport`].
//!
//! [`ChatClient::submit`] does the synchronous half of a send (echo the user's
//! text, clear the input) and hands back a [`PendingReply`]. Awaiting or
//! spawning that future performs the single request and appends exactly one
//! bot entry when it settles. Several replies may be pending at once; each
//! appends in the order it settles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::{DisplayedEntry, IncomingResponse, MessageClass, OutgoingMessage};

/// Shown when the server answered without a usable `answer`.
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from server";

/// Shown when the request failed or the body was not JSON (or was `null`).
pub const SERVER_UNREACHABLE: &str = "Could not reach server. Try again later.";

/// Something that can deliver an [`OutgoingMessage`] and return the reply.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    async fn send(&self, message: &OutgoingMessage) -> Result<IncomingResponse>;
}

/// Presentation hook for the message list.
pub trait Renderer: Send {
    /// Draw a newly appended entry.
    fn render(&mut self, entry: &DisplayedEntry);

    /// Bring the newest entry into view.
    fn scroll_to_latest(&mut self) {}
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _entry: &DisplayedEntry) {}
}

// =============================================================================
// Message list
// =============================================================================

/// Append-only list of displayed entries.
pub struct MessageList {
    entries: Vec<DisplayedEntry>,
    renderer: Box<dyn Renderer>,
}

impl std::fmt::Debug for MessageList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageList")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl MessageList {
    pub fn new(renderer: impl Renderer + 'static) -> Self {
        Self {
            entries: Vec::new(),
            renderer: Box::new(renderer),
        }
    }

    /// Append an entry, render it and scroll to it.
    pub fn append_entry(&mut self, text: impl Into<String>, class: MessageClass) {
        let entry = DisplayedEntry {
            text: text.into(),
            class,
        };
        self.renderer.render(&entry);
        self.entries.push(entry);
        self.renderer.scroll_to_latest();
    }

    /// Append with the default (bot) style.
    pub fn append(&mut self, text: impl Into<String>) {
        self.append_entry(text, MessageClass::default());
    }

    pub fn entries(&self) -> &[DisplayedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Input
// =============================================================================

/// Editable message text.
#[derive(Debug, Default, Clone)]
pub struct InputField {
    value: String,
}

impl InputField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

/// Keys the input field reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Backspace,
}

// =============================================================================
// Replies
// =============================================================================

/// How a submission settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The server sent a non-empty answer.
    Answer(String),
    /// The server replied, but without an answer.
    MissingAnswer,
    /// Network error, timeout, or a body that was not a JSON object or array.
    Unreachable,
}

impl Reply {
    pub fn from_result(result: Result<IncomingResponse>) -> Self {
        match result {
            Ok(IncomingResponse {
                answer: Some(answer),
            }) => Reply::Answer(answer),
            Ok(_) => Reply::MissingAnswer,
            Err(e) => {
                tracing::debug!(error = %e, "Chat request failed");
                Reply::Unreachable
            }
        }
    }

    /// Text to show for this reply.
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer(answer) => answer,
            Reply::MissingAnswer => UNEXPECTED_RESPONSE,
            Reply::Unreachable => SERVER_UNREACHABLE,
        }
    }
}

/// The outstanding half of a submission. Resolves once the bot entry has been
/// appended. Dropping it unpolled sends nothing.
pub type PendingReply = BoxFuture<'static, Reply>;

/// Whether any submission is still waiting for its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug)]
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Client
// =============================================================================

/// Chat widget bound to a transport.
pub struct ChatClient<T> {
    transport: Arc<T>,
    role: String,
    input: InputField,
    display: Arc<Mutex<MessageList>>,
    in_flight: Arc<AtomicUsize>,
}

impl<T> std::fmt::Debug for ChatClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("role", &self.role)
            .field("input", &self.input)
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T: ChatTransport> ChatClient<T> {
    pub fn new(transport: T, role: impl Into<String>, renderer: impl Renderer + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            role: role.into(),
            input: InputField::default(),
            display: Arc::new(Mutex::new(MessageList::new(renderer))),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Select the role sent with subsequent submissions.
    pub fn set_role(&mut self, role: impl Into<String>) {
        self.role = role.into();
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.input
    }

    /// Append directly to the message list.
    pub fn append_entry(&self, text: impl Into<String>, class: MessageClass) {
        lock(&self.display).append_entry(text, class);
    }

    /// Snapshot of everything displayed so far.
    pub fn entries(&self) -> Vec<DisplayedEntry> {
        lock(&self.display).entries().to_vec()
    }

    /// Number of submissions that have not settled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ClientState {
        if self.in_flight() == 0 {
            ClientState::Idle
        } else {
            ClientState::AwaitingResponse
        }
    }

    /// Send the current input.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the trimmed text
    /// is appended as a user entry and the input cleared before this returns;
    /// the request itself runs when the returned future is polled.
    pub fn submit(&mut self) -> Option<PendingReply> {
        let message = self.input.value().trim().to_string();
        if message.is_empty() {
            return None;
        }

        self.append_entry(message.clone(), MessageClass::User);
        self.input.clear();

        let outgoing = OutgoingMessage {
            role: self.role.clone(),
            message,
        };
        let transport = Arc::clone(&self.transport);
        let display = Arc::clone(&self.display);
        let in_flight = InFlight::start(&self.in_flight);

        Some(
            async move {
                let reply = Reply::from_result(transport.send(&outgoing).await);
                lock(&display).append_entry(reply.text(), MessageClass::Bot);
                drop(in_flight);
                reply
            }
            .boxed(),
        )
    }

    /// The send control was activated.
    pub fn click_send(&mut self) -> Option<PendingReply> {
        self.submit()
    }

    /// Feed a key press to the input field. Enter submits.
    pub fn handle_key(&mut self, key: Key) -> Option<PendingReply> {
        match key {
            Key::Enter => self.submit(),
            Key::Char(c) => {
                self.input.push(c);
                None
            }
            Key::Backspace => {
                self.input.backspace();
                None
            }
        }
    }
}

fn lock(display: &Mutex<MessageList>) -> std::sync::MutexGuard<'_, MessageList> {
    display.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use tokio::sync::oneshot;

    // =========================================================================
    // Test doubles
    // =========================================================================

    type Sent = Arc<Mutex<Vec<OutgoingMessage>>>;

    #[derive(Debug, Clone)]
    enum Scripted {
        Body(Value),
        Raw(&'static str),
    }

    #[derive(Debug)]
    struct ScriptedTransport {
        reply: Scripted,
        sent: Sent,
    }

    impl ScriptedTransport {
        fn new(reply: Scripted) -> (Self, Sent) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    reply,
                    sent: Arc::clone(&sent),
                },
                sent,
            )
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send(&self, message: &OutgoingMessage) -> Result<IncomingResponse> {
            self.sent.lock().unwrap().push(message.clone());
            match &self.reply {
                Scripted::Body(value) => IncomingResponse::from_body(&serde_json::to_vec(value)?),
                Scripted::Raw(body) => IncomingResponse::from_body(body.as_bytes()),
            }
        }
    }

    /// Each send waits until the test opens the gate keyed by its message.
    #[derive(Debug)]
    struct GatedTransport {
        gates: Mutex<HashMap<String, oneshot::Receiver<Value>>>,
    }

    #[async_trait]
    impl ChatTransport for GatedTransport {
        async fn send(&self, message: &OutgoingMessage) -> Result<IncomingResponse> {
            let gate = self
                .gates
                .lock()
                .unwrap()
                .remove(&message.message)
                .expect("gate per message");
            let body = gate.await.expect("gate opened");
            Ok(IncomingResponse::from_value(body))
        }
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingRenderer {
        rendered: Arc<Mutex<Vec<DisplayedEntry>>>,
        scrolls: Arc<AtomicUsize>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, entry: &DisplayedEntry) {
            self.rendered.lock().unwrap().push(entry.clone());
        }

        fn scroll_to_latest(&mut self) {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn client(reply: Scripted) -> (ChatClient<ScriptedTransport>, Sent) {
        let (transport, sent) = ScriptedTransport::new(reply);
        (ChatClient::new(transport, "student", NullRenderer), sent)
    }

    fn user(text: &str) -> DisplayedEntry {
        DisplayedEntry {
            text: text.to_string(),
            class: MessageClass::User,
        }
    }

    fn bot(text: &str) -> DisplayedEntry {
        DisplayedEntry {
            text: text.to_string(),
            class: MessageClass::Bot,
        }
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[test]
    fn append_defaults_to_bot_and_scrolls() {
        let renderer = RecordingRenderer::default();
        let mut list = MessageList::new(renderer.clone());

        list.append("hello");
        list.append_entry("hi", MessageClass::User);

        assert_eq!(list.entries(), &[bot("hello"), user("hi")]);
        assert_eq!(*renderer.rendered.lock().unwrap(), vec![bot("hello"), user("hi")]);
        assert_eq!(renderer.scrolls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn blank_input_does_nothing() {
        let (mut client, sent) = client(Scripted::Body(json!({ "answer": "hi" })));

        for blank in ["", "   ", "\t\n "] {
            client.input_mut().set(blank);
            assert!(client.submit().is_none());
        }

        assert!(client.entries().is_empty());
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(client.state(), ClientState::Idle);
    }

    #[test]
    fn user_entry_precedes_any_network_activity() {
        let (mut client, sent) = client(Scripted::Body(json!({ "answer": "hi" })));
        client.input_mut().set("  when are exams?  ");

        let pending = client.submit().expect("non-empty input submits");

        assert_eq!(client.entries(), vec![user("when are exams?")]);
        assert_eq!(client.input().value(), "");
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(client.state(), ClientState::AwaitingResponse);

        drop(pending);
        assert_eq!(client.state(), ClientState::Idle);
    }

    #[tokio::test]
    async fn answer_is_appended_as_bot_entry() {
        let (mut client, sent) = client(Scripted::Body(json!({ "answer": "hi" })));
        client.input_mut().set("hello");

        let reply = client.submit().unwrap().await;

        assert_eq!(reply, Reply::Answer("hi".to_string()));
        assert_eq!(client.entries(), vec![user("hello"), bot("hi")]);
        assert_eq!(
            *sent.lock().unwrap(),
            vec![OutgoingMessage {
                role: "student".to_string(),
                message: "hello".to_string(),
            }]
        );
        assert_eq!(client.state(), ClientState::Idle);
    }

    #[tokio::test]
    async fn missing_answer_shows_unexpected_response() {
        let (mut client, _) = client(Scripted::Body(json!({})));
        client.input_mut().set("hello");

        let reply = client.submit().unwrap().await;

        assert_eq!(reply, Reply::MissingAnswer);
        assert_eq!(client.entries().last(), Some(&bot(UNEXPECTED_RESPONSE)));
    }

    #[tokio::test]
    async fn error_body_shows_unexpected_response() {
        let (mut client, _) = client(Scripted::Body(
            json!({ "error": "role and message are required" }),
        ));
        client.input_mut().set("hello");

        client.submit().unwrap().await;

        assert_eq!(client.entries().last(), Some(&bot(UNEXPECTED_RESPONSE)));
    }

    #[tokio::test]
    async fn transport_failure_shows_unreachable_and_keeps_user_entry() {
        let (mut client, _) = client(Scripted::Raw("<html>502</html>"));
        client.input_mut().set("hello");

        let reply = client.submit().unwrap().await;

        assert_eq!(reply, Reply::Unreachable);
        assert_eq!(
            client.entries(),
            vec![user("hello"), bot(SERVER_UNREACHABLE)]
        );
    }

    #[tokio::test]
    async fn null_body_shows_unreachable() {
        let (mut client, _) = client(Scripted::Body(Value::Null));
        client.input_mut().set("hello");

        let reply = client.submit().unwrap().await;

        assert_eq!(reply, Reply::Unreachable);
        assert_eq!(client.entries().last(), Some(&bot(SERVER_UNREACHABLE)));
    }

    #[tokio::test]
    async fn role_selection_is_sent() {
        let (mut client, sent) = client(Scripted::Body(json!({ "answer": "ok" })));
        client.set_role("parent");
        client.input_mut().set("fees");

        client.submit().unwrap().await;

        assert_eq!(sent.lock().unwrap()[0].role, "parent");
    }

    #[tokio::test]
    async fn enter_key_matches_send_click() {
        let (mut typed, typed_sent) = client(Scripted::Body(json!({ "answer": "hi" })));
        for c in "exam?x".chars() {
            assert!(typed.handle_key(Key::Char(c)).is_none());
        }
        typed.handle_key(Key::Backspace);
        typed.handle_key(Key::Enter).unwrap().await;

        let (mut clicked, clicked_sent) = client(Scripted::Body(json!({ "answer": "hi" })));
        clicked.input_mut().set("exam?");
        clicked.click_send().unwrap().await;

        assert_eq!(typed.entries(), clicked.entries());
        assert_eq!(*typed_sent.lock().unwrap(), *clicked_sent.lock().unwrap());
    }

    #[test]
    fn enter_on_empty_input_does_nothing() {
        let (mut client, sent) = client(Scripted::Body(json!({ "answer": "hi" })));
        assert!(client.handle_key(Key::Enter).is_none());
        client.handle_key(Key::Char(' '));
        assert!(client.handle_key(Key::Enter).is_none());

        assert!(client.entries().is_empty());
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlapping_submissions_append_in_settle_order() {
        let (open_first, first_gate) = oneshot::channel();
        let (open_second, second_gate) = oneshot::channel();
        let transport = GatedTransport {
            gates: Mutex::new(HashMap::from([
                ("first".to_string(), first_gate),
                ("second".to_string(), second_gate),
            ])),
        };
        let mut client = ChatClient::new(transport, "student", NullRenderer);

        client.input_mut().set("first");
        let first = tokio::spawn(client.submit().unwrap());
        client.input_mut().set("second");
        let second = tokio::spawn(client.submit().unwrap());
        assert_eq!(client.in_flight(), 2);

        open_second.send(json!({ "answer": "two" })).unwrap();
        assert_eq!(second.await.unwrap(), Reply::Answer("two".to_string()));
        assert_eq!(client.in_flight(), 1);

        open_first.send(json!({ "answer": "one" })).unwrap();
        assert_eq!(first.await.unwrap(), Reply::Answer("one".to_string()));

        assert_eq!(
            client.entries(),
            vec![user("first"), user("second"), bot("two"), bot("one")]
        );
        assert_eq!(client.state(), ClientState::Idle);
    }
}
