//! Repository traits the protocol core consumes.
//!
//! Contract notes that every implementation must honor:
//! - methods are linearizable per (collection, uid);
//! - `Events::upsert` / `Contacts::upsert` clear any tombstone for the
//!   same (collection, uid) and bump the parent collection's `ctag` and
//!   `updated_at`;
//! - `delete_*` record a tombstone and bump the parent the same way;
//! - "not found" is always [`StoreError::NotFound`], never a generic
//!   failure.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::model::{
    AddressBook, Calendar, CalendarAccess, Contact, DeletedResource, Event, ResourceKind, User,
};

/// Principal lookup.
#[async_trait]
pub trait Users: Send + Sync {
    async fn get(&self, id: i64) -> StoreResult<User>;
    async fn get_by_email(&self, email: &str) -> StoreResult<User>;
}

/// Fields settable at calendar creation.
#[derive(Debug, Clone)]
pub struct NewCalendar {
    pub owner_id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub timezone: Option<String>,
}

#[async_trait]
pub trait Calendars: Send + Sync {
    /// Calendars the user owns.
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<Calendar>>;

    /// Owned plus shared calendars, with access flags.
    async fn list_accessible(&self, user_id: i64) -> StoreResult<Vec<CalendarAccess>>;

    /// A single calendar if the user may see it at all.
    async fn get_accessible(&self, id: i64, user_id: i64) -> StoreResult<CalendarAccess>;

    async fn create(&self, calendar: NewCalendar) -> StoreResult<Calendar>;

    /// Updates the mutable fields; `None` leaves a field untouched.
    async fn update(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
        timezone: Option<String>,
    ) -> StoreResult<Calendar>;
}

/// Upsert payload for events. The store keys on (calendar, uid) and
/// (calendar, resource name); the caller has already enforced the
/// no-uid-conflict preconditions.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub calendar_id: i64,
    pub uid: String,
    pub resource_name: String,
    pub raw_ical: String,
    pub etag: String,
    pub dt_start: Option<DateTime<Utc>>,
    pub dt_end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub summary: Option<String>,
}

#[async_trait]
pub trait Events: Send + Sync {
    async fn get_by_uid(&self, calendar_id: i64, uid: &str) -> StoreResult<Event>;
    async fn get_by_resource_name(&self, calendar_id: i64, name: &str) -> StoreResult<Event>;
    async fn list_for_calendar(&self, calendar_id: i64) -> StoreResult<Vec<Event>>;

    /// Events modified strictly after `since`.
    async fn list_modified_since(
        &self,
        calendar_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>>;

    async fn upsert(&self, event: NewEvent) -> StoreResult<Event>;
    async fn delete_by_uid(&self, calendar_id: i64, uid: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait AddressBooks: Send + Sync {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<AddressBook>>;
    async fn get_owned(&self, id: i64, user_id: i64) -> StoreResult<AddressBook>;
    async fn create(&self, owner_id: i64, name: String) -> StoreResult<AddressBook>;

    /// Updates the mutable fields; `None` leaves a field untouched.
    async fn update(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> StoreResult<AddressBook>;
}

/// Upsert payload for contacts.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub addressbook_id: i64,
    pub uid: String,
    pub resource_name: String,
    pub raw_vcard: String,
    pub etag: String,
    pub display_name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait Contacts: Send + Sync {
    async fn get_by_uid(&self, addressbook_id: i64, uid: &str) -> StoreResult<Contact>;
    async fn get_by_resource_name(&self, addressbook_id: i64, name: &str)
    -> StoreResult<Contact>;
    async fn list_for_addressbook(&self, addressbook_id: i64) -> StoreResult<Vec<Contact>>;
    async fn list_modified_since(
        &self,
        addressbook_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Contact>>;

    /// Contacts with a birthday across every address book the user owns;
    /// feeds the virtual birthday calendar.
    async fn list_with_birthdays(&self, user_id: i64) -> StoreResult<Vec<Contact>>;

    async fn upsert(&self, contact: NewContact) -> StoreResult<Contact>;
    async fn delete_by_uid(&self, addressbook_id: i64, uid: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait DeletedResources: Send + Sync {
    /// Tombstones in a collection deleted strictly after `since`.
    async fn list_deleted_since(
        &self,
        kind: ResourceKind,
        collection_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DeletedResource>>;

    /// Drops tombstones older than the cutoff; returns how many went.
    async fn cleanup(&self, older_than: DateTime<Utc>) -> StoreResult<usize>;
}

/// The bundle of repositories handed to request handlers.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn Users>,
    pub calendars: Arc<dyn Calendars>,
    pub events: Arc<dyn Events>,
    pub addressbooks: Arc<dyn AddressBooks>,
    pub contacts: Arc<dyn Contacts>,
    pub deleted: Arc<dyn DeletedResources>,
}

impl Store {
    /// A store backed by a single in-memory instance; the instance is
    /// also returned for test seeding.
    #[must_use]
    pub fn in_memory() -> (Self, Arc<crate::memory::MemoryStore>) {
        let memory = Arc::new(crate::memory::MemoryStore::new());
        let store = Self {
            users: memory.clone(),
            calendars: memory.clone(),
            events: memory.clone(),
            addressbooks: memory.clone(),
            contacts: memory.clone(),
            deleted: memory.clone(),
        };
        (store, memory)
    }
}
