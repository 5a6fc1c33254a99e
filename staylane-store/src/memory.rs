//! In-memory repository implementations.
//!
//! The production document store is an external collaborator; these stores
//! implement the same traits over hash maps so the service runs self-
//! contained in development and tests. The thread store in particular keeps
//! the deterministic-id-as-document-key behavior that makes thread creation
//! idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use staylane_booking::cancel::{BookingRepository, StatusMirror, StatusRequestTag};
use staylane_booking::contact::{ContactDirectory, PartyProfile};
use staylane_booking::models::{Booking, BookingStatus};
use staylane_chat::thread::{ChatThread, LastMessage, Message, ThreadRepository};
use staylane_listing::models::{Listing, ListingRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Default)]
pub struct MemoryBookings {
    docs: RwLock<HashMap<String, Booking>>,
}

impl MemoryBookings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookings {
    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, BoxError> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn list_for_guest(&self, guest_id: &str) -> Result<Vec<Booking>, BoxError> {
        let docs = self.docs.read().await;
        let mut bookings: Vec<Booking> = docs
            .values()
            .filter(|b| b.guest_id == guest_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_for_host(&self, host_id: &str) -> Result<Vec<Booking>, BoxError> {
        let docs = self.docs.read().await;
        let mut bookings: Vec<Booking> = docs
            .values()
            .filter(|b| b.host_id == host_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), BoxError> {
        self.docs
            .write()
            .await
            .insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<(), BoxError> {
        let mut docs = self.docs.write().await;
        let booking = docs.get_mut(id).ok_or_else(|| format!("no booking {id}"))?;
        booking.status = status;
        Ok(())
    }

    async fn set_reveal_at(&self, id: &str, at: DateTime<Utc>) -> Result<(), BoxError> {
        let mut docs = self.docs.write().await;
        let booking = docs.get_mut(id).ok_or_else(|| format!("no booking {id}"))?;
        booking.reveal_host_at = Some(at);
        booking.reveal_guest_at = Some(at);
        Ok(())
    }
}

/// Counterparty-visible status mirror, stored as loose JSON documents the
/// way the real mirror collection holds them.
#[derive(Default)]
pub struct MemoryMirror {
    docs: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mirrored(&self, booking_id: &str) -> Option<serde_json::Value> {
        self.docs.read().await.get(booking_id).cloned()
    }
}

#[async_trait]
impl StatusMirror for MemoryMirror {
    async fn mirror_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        request: &StatusRequestTag,
    ) -> Result<(), BoxError> {
        let doc = serde_json::json!({
            "status": status,
            "request": request,
        });
        self.docs.write().await.insert(booking_id.to_string(), doc);
        Ok(())
    }
}

#[derive(Default)]
struct ThreadDocs {
    threads: HashMap<String, ChatThread>,
    messages: HashMap<String, Vec<Message>>,
}

#[derive(Default)]
pub struct MemoryThreads {
    docs: RwLock<ThreadDocs>,
}

impl MemoryThreads {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thread_count(&self) -> usize {
        self.docs.read().await.threads.len()
    }
}

#[async_trait]
impl ThreadRepository for MemoryThreads {
    async fn get_thread(&self, id: &str) -> Result<Option<ChatThread>, BoxError> {
        Ok(self.docs.read().await.threads.get(id).cloned())
    }

    async fn create_if_absent(&self, thread: &ChatThread) -> Result<bool, BoxError> {
        let mut docs = self.docs.write().await;
        if docs.threads.contains_key(&thread.id) {
            return Ok(false);
        }
        docs.threads.insert(thread.id.clone(), thread.clone());
        Ok(true)
    }

    async fn list_for_party(&self, party_id: &str) -> Result<Vec<ChatThread>, BoxError> {
        let docs = self.docs.read().await;
        let mut threads: Vec<ChatThread> = docs
            .threads
            .values()
            .filter(|t| t.is_participant(party_id))
            .cloned()
            .collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(threads)
    }

    async fn append_message(&self, message: &Message) -> Result<(), BoxError> {
        let mut docs = self.docs.write().await;
        docs.messages
            .entry(message.thread_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, BoxError> {
        Ok(self
            .docs
            .read()
            .await
            .messages
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_last_message(
        &self,
        thread_id: &str,
        last: &LastMessage,
        at: DateTime<Utc>,
    ) -> Result<bool, BoxError> {
        let mut docs = self.docs.write().await;
        match docs.threads.get_mut(thread_id) {
            Some(thread) => {
                thread.last_message = Some(last.clone());
                thread.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryListings {
    docs: RwLock<HashMap<String, Listing>>,
}

impl MemoryListings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListingRepository for MemoryListings {
    async fn get_listing(&self, id: &str) -> Result<Option<Listing>, BoxError> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, BoxError> {
        Ok(self.docs.read().await.values().cloned().collect())
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<(), BoxError> {
        self.docs
            .write()
            .await
            .insert(listing.id.clone(), listing.clone());
        Ok(())
    }
}

/// Identity-provider stand-in keyed by party id.
#[derive(Default)]
pub struct MemoryDirectory {
    profiles: RwLock<HashMap<String, PartyProfile>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, party_id: &str, profile: PartyProfile) {
        self.profiles
            .write()
            .await
            .insert(party_id.to_string(), profile);
    }
}

#[async_trait]
impl ContactDirectory for MemoryDirectory {
    async fn lookup(&self, party_id: &str) -> Result<Option<PartyProfile>, BoxError> {
        Ok(self.profiles.read().await.get(party_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use staylane_chat::thread::{get_or_create_thread, record_message, ThreadKey};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn get_or_create_thread_is_idempotent() {
        let repo = MemoryThreads::new();
        let key = ThreadKey::new("bk-1", "ls-1", "guest-1", "host-1").unwrap();

        let first = get_or_create_thread(&repo, &key, "Stay at the loft", now())
            .await
            .unwrap();
        let second = get_or_create_thread(&repo, &key, "Stay at the loft", now())
            .await
            .unwrap();

        assert_eq!(first.thread_id, second.thread_id);
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(repo.thread_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_first_opens_create_one_thread() {
        let repo = std::sync::Arc::new(MemoryThreads::new());
        let key = ThreadKey::new("bk-1", "ls-1", "guest-1", "host-1").unwrap();

        let (a, b) = tokio::join!(
            get_or_create_thread(repo.as_ref(), &key, "t", now()),
            get_or_create_thread(repo.as_ref(), &key, "t", now()),
        );
        assert_eq!(a.unwrap().thread_id, b.unwrap().thread_id);
        assert_eq!(repo.thread_count().await, 1);
    }

    #[tokio::test]
    async fn messages_refresh_the_last_message_snapshot() {
        let repo = MemoryThreads::new();
        let key = ThreadKey::new("bk-1", "ls-1", "guest-1", "host-1").unwrap();
        let outcome = get_or_create_thread(&repo, &key, "t", now()).await.unwrap();

        record_message(&repo, &outcome.thread_id, "guest-1", "hi!", now())
            .await
            .unwrap();
        let later = now() + chrono::Duration::minutes(5);
        record_message(&repo, &outcome.thread_id, "host-1", "welcome", later)
            .await
            .unwrap();

        let thread = repo.get_thread(&outcome.thread_id).await.unwrap().unwrap();
        let last = thread.last_message.unwrap();
        assert_eq!(last.text, "welcome");
        assert_eq!(last.sender_id, "host-1");
        assert_eq!(thread.updated_at, later);
        assert_eq!(
            repo.list_messages(&outcome.thread_id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn mirror_doc_carries_status_and_request_tag() {
        let mirror = MemoryMirror::new();
        mirror
            .mirror_status(
                "bk-1",
                BookingStatus::CancelRequest,
                &StatusRequestTag::cancel(now()),
            )
            .await
            .unwrap();

        let doc = mirror.mirrored("bk-1").await.unwrap();
        assert_eq!(doc["status"], "cancel_request");
        assert_eq!(doc["request"]["type"], "cancel");
        assert_eq!(doc["request"]["state"], "requested");
    }
}
