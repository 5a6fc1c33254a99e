use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ThreadError {
    #[error("Missing required identifier: {0}")]
    MissingIdentifier(&'static str),

    #[error("Thread not found: {0}")]
    NotFound(String),

    #[error("Sender {0} is not a participant of thread {1}")]
    NotParticipant(String, String),

    #[error("Store error: {0}")]
    Store(String),
}

/// Identity of a booking conversation.
///
/// All four identifiers are required up front so a half-loaded record can
/// never mint a thread id that later collides with the fully-loaded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadKey {
    pub booking_id: String,
    pub listing_id: String,
    pub guest_id: String,
    pub host_id: String,
}

impl ThreadKey {
    pub fn new(
        booking_id: impl Into<String>,
        listing_id: impl Into<String>,
        guest_id: impl Into<String>,
        host_id: impl Into<String>,
    ) -> Result<Self, ThreadError> {
        let key = Self {
            booking_id: booking_id.into(),
            listing_id: listing_id.into(),
            guest_id: guest_id.into(),
            host_id: host_id.into(),
        };
        if key.booking_id.is_empty() {
            return Err(ThreadError::MissingIdentifier("booking_id"));
        }
        if key.listing_id.is_empty() {
            return Err(ThreadError::MissingIdentifier("listing_id"));
        }
        if key.guest_id.is_empty() {
            return Err(ThreadError::MissingIdentifier("guest_id"));
        }
        if key.host_id.is_empty() {
            return Err(ThreadError::MissingIdentifier("host_id"));
        }
        Ok(key)
    }

    /// Deterministic document id: `b:<booking>::g:<guest>::h:<host>`.
    ///
    /// Each field carries its own tag so no combination of real identifier
    /// values can collide with a different triple. Recomputing from the same
    /// inputs always yields the same id, which is what makes creation
    /// idempotent.
    pub fn thread_id(&self) -> String {
        format!(
            "b:{}::g:{}::h:{}",
            self.booking_id, self.guest_id, self.host_id
        )
    }
}

/// Denormalized snapshot of the newest message, for thread list rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessage {
    pub text: String,
    pub sender_id: String,
    pub sent_at: DateTime<Utc>,
}

/// One message inside a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: String,
    pub sender_id: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Persistent conversation container between the two booking parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: String,
    pub booking_id: String,
    pub listing_id: String,
    pub participants: Vec<String>,
    pub title: String,
    pub last_message: Option<LastMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Reserved for client-side archive/pin features; empty on creation.
    #[serde(default)]
    pub archived_by: Vec<String>,
    #[serde(default)]
    pub pinned_by: Vec<String>,
}

impl ChatThread {
    pub fn is_participant(&self, party_id: &str) -> bool {
        self.participants.iter().any(|p| p == party_id)
    }
}

#[async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn get_thread(&self, id: &str) -> Result<Option<ChatThread>, BoxError>;

    /// Insert keyed by the thread's deterministic id. Returns `false` when a
    /// document with that id already exists (the existing one wins), which
    /// is what keeps concurrent first-opens from both parties down to a
    /// single thread.
    async fn create_if_absent(&self, thread: &ChatThread) -> Result<bool, BoxError>;

    async fn list_for_party(&self, party_id: &str) -> Result<Vec<ChatThread>, BoxError>;

    async fn append_message(&self, message: &Message) -> Result<(), BoxError>;

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, BoxError>;

    /// Refresh the denormalized snapshot. Returns `false` when the thread is
    /// unknown.
    async fn update_last_message(
        &self,
        thread_id: &str,
        last: &LastMessage,
        at: DateTime<Utc>,
    ) -> Result<bool, BoxError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadOutcome {
    pub thread_id: String,
    pub created: bool,
}

/// Open (or lazily create) the conversation for a booking.
///
/// Safe to call concurrently from both parties: the deterministic id is the
/// document key, so the second writer simply finds the thread in place.
pub async fn get_or_create_thread(
    repo: &dyn ThreadRepository,
    key: &ThreadKey,
    title: &str,
    now: DateTime<Utc>,
) -> Result<ThreadOutcome, ThreadError> {
    let thread = ChatThread {
        id: key.thread_id(),
        booking_id: key.booking_id.clone(),
        listing_id: key.listing_id.clone(),
        participants: vec![key.guest_id.clone(), key.host_id.clone()],
        title: title.to_string(),
        last_message: None,
        created_at: now,
        updated_at: now,
        archived_by: Vec::new(),
        pinned_by: Vec::new(),
    };

    let created = repo
        .create_if_absent(&thread)
        .await
        .map_err(|e| ThreadError::Store(e.to_string()))?;

    if created {
        tracing::info!(thread_id = %thread.id, "chat thread created");
    }

    Ok(ThreadOutcome {
        thread_id: thread.id,
        created,
    })
}

/// Append a message and refresh the thread's last-message snapshot.
pub async fn record_message(
    repo: &dyn ThreadRepository,
    thread_id: &str,
    sender_id: &str,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Message, ThreadError> {
    let thread = repo
        .get_thread(thread_id)
        .await
        .map_err(|e| ThreadError::Store(e.to_string()))?
        .ok_or_else(|| ThreadError::NotFound(thread_id.to_string()))?;

    if !thread.is_participant(sender_id) {
        return Err(ThreadError::NotParticipant(
            sender_id.to_string(),
            thread_id.to_string(),
        ));
    }

    let message = Message {
        id: Uuid::new_v4(),
        thread_id: thread_id.to_string(),
        sender_id: sender_id.to_string(),
        text: text.to_string(),
        sent_at: now,
    };

    repo.append_message(&message)
        .await
        .map_err(|e| ThreadError::Store(e.to_string()))?;

    let last = LastMessage {
        text: message.text.clone(),
        sender_id: message.sender_id.clone(),
        sent_at: message.sent_at,
    };
    repo.update_last_message(thread_id, &last, now)
        .await
        .map_err(|e| ThreadError::Store(e.to_string()))?;

    Ok(message)
}
