//! In-memory reference store.
//!
//! Backs the integration tests and single-process deployments. All state
//! sits behind one `RwLock`; critical sections are synchronous and never
//! span an await point, which gives the per-(collection, uid)
//! linearizability the repository contract requires.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::model::{
    AddressBook, Calendar, CalendarAccess, Contact, DeletedResource, Event, ResourceKind, User,
};
use crate::repo::{
    AddressBooks, Calendars, Contacts, DeletedResources, Events, NewCalendar, NewContact,
    NewEvent, Users,
};

/// A sharing edge from a calendar to a non-owner user.
#[derive(Debug, Clone)]
pub struct Share {
    pub calendar_id: i64,
    pub user_id: i64,
    pub editor: bool,
    pub read_free_busy_only: bool,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    calendars: Vec<Calendar>,
    shares: Vec<Share>,
    events: Vec<Event>,
    addressbooks: Vec<AddressBook>,
    contacts: Vec<Contact>,
    tombstones: Vec<DeletedResource>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn touch_calendar(&mut self, calendar_id: i64) {
        if let Some(calendar) = self.calendars.iter_mut().find(|c| c.id == calendar_id) {
            calendar.ctag += 1;
            calendar.updated_at = Utc::now();
        }
    }

    fn touch_addressbook(&mut self, addressbook_id: i64) {
        if let Some(book) = self.addressbooks.iter_mut().find(|b| b.id == addressbook_id) {
            book.ctag += 1;
            book.updated_at = Utc::now();
        }
    }

    fn access_for(&self, calendar: &Calendar, user_id: i64) -> Option<CalendarAccess> {
        if calendar.owner_id == user_id {
            return Some(CalendarAccess::owner(calendar.clone()));
        }
        self.shares
            .iter()
            .find(|s| s.calendar_id == calendar.id && s.user_id == user_id)
            .map(|share| CalendarAccess {
                calendar: calendar.clone(),
                editor: share.editor,
                shared: true,
                read_free_busy_only: share.read_free_busy_only,
            })
    }
}

/// The in-memory store. Cheap to construct per test.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seeds a user and returns it.
    pub fn add_user(&self, primary_email: &str) -> User {
        let mut inner = self.write();
        let user = User {
            id: inner.next_id(),
            primary_email: primary_email.to_string(),
        };
        inner.users.push(user.clone());
        user
    }

    /// Seeds a share edge.
    pub fn share_calendar(
        &self,
        calendar_id: i64,
        user_id: i64,
        editor: bool,
        read_free_busy_only: bool,
    ) {
        self.write().shares.push(Share {
            calendar_id,
            user_id,
            editor,
            read_free_busy_only,
        });
    }
}

#[async_trait]
impl Users for MemoryStore {
    async fn get(&self, id: i64) -> StoreResult<User> {
        self.read()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        self.read()
            .users
            .iter()
            .find(|u| u.primary_email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl Calendars for MemoryStore {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<Calendar>> {
        Ok(self
            .read()
            .calendars
            .iter()
            .filter(|c| c.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_accessible(&self, user_id: i64) -> StoreResult<Vec<CalendarAccess>> {
        let inner = self.read();
        Ok(inner
            .calendars
            .iter()
            .filter_map(|c| inner.access_for(c, user_id))
            .collect())
    }

    async fn get_accessible(&self, id: i64, user_id: i64) -> StoreResult<CalendarAccess> {
        let inner = self.read();
        let calendar = inner
            .calendars
            .iter()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        inner.access_for(calendar, user_id).ok_or(StoreError::NotFound)
    }

    async fn create(&self, calendar: NewCalendar) -> StoreResult<Calendar> {
        let mut inner = self.write();

        let duplicate = inner.calendars.iter().any(|c| {
            c.owner_id == calendar.owner_id
                && (c.name.eq_ignore_ascii_case(&calendar.name)
                    || match (&c.slug, &calendar.slug) {
                        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                        _ => false,
                    })
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "calendar {} already exists",
                calendar.name
            )));
        }

        let created = Calendar {
            id: inner.next_id(),
            owner_id: calendar.owner_id,
            name: calendar.name,
            slug: calendar.slug,
            description: calendar.description,
            timezone: calendar.timezone,
            ctag: 1,
            updated_at: Utc::now(),
        };
        inner.calendars.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
        timezone: Option<String>,
    ) -> StoreResult<Calendar> {
        let mut inner = self.write();
        let calendar = inner
            .calendars
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = name {
            calendar.name = name;
        }
        if let Some(description) = description {
            calendar.description = Some(description);
        }
        if let Some(timezone) = timezone {
            calendar.timezone = Some(timezone);
        }
        calendar.ctag += 1;
        calendar.updated_at = Utc::now();
        Ok(calendar.clone())
    }
}

#[async_trait]
impl Events for MemoryStore {
    async fn get_by_uid(&self, calendar_id: i64, uid: &str) -> StoreResult<Event> {
        self.read()
            .events
            .iter()
            .find(|e| e.calendar_id == calendar_id && e.uid == uid)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_resource_name(&self, calendar_id: i64, name: &str) -> StoreResult<Event> {
        self.read()
            .events
            .iter()
            .find(|e| e.calendar_id == calendar_id && e.resource_name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_for_calendar(&self, calendar_id: i64) -> StoreResult<Vec<Event>> {
        Ok(self
            .read()
            .events
            .iter()
            .filter(|e| e.calendar_id == calendar_id)
            .cloned()
            .collect())
    }

    async fn list_modified_since(
        &self,
        calendar_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        Ok(self
            .read()
            .events
            .iter()
            .filter(|e| e.calendar_id == calendar_id && e.last_modified > since)
            .cloned()
            .collect())
    }

    async fn upsert(&self, event: NewEvent) -> StoreResult<Event> {
        let mut inner = self.write();

        // Re-creation under the same UID supersedes any pending tombstone.
        inner.tombstones.retain(|t| {
            !(t.kind == ResourceKind::Event
                && t.collection_id == event.calendar_id
                && t.uid == event.uid)
        });

        let now = Utc::now();
        let stored = if let Some(existing) = inner
            .events
            .iter_mut()
            .find(|e| e.calendar_id == event.calendar_id && e.resource_name == event.resource_name)
        {
            existing.uid = event.uid;
            existing.raw_ical = event.raw_ical;
            existing.etag = event.etag;
            existing.dt_start = event.dt_start;
            existing.dt_end = event.dt_end;
            existing.all_day = event.all_day;
            existing.summary = event.summary;
            existing.last_modified = now;
            existing.clone()
        } else {
            let created = Event {
                id: inner.next_id(),
                calendar_id: event.calendar_id,
                uid: event.uid,
                resource_name: event.resource_name,
                raw_ical: event.raw_ical,
                etag: event.etag,
                dt_start: event.dt_start,
                dt_end: event.dt_end,
                all_day: event.all_day,
                summary: event.summary,
                last_modified: now,
            };
            inner.events.push(created.clone());
            created
        };

        inner.touch_calendar(stored.calendar_id);
        Ok(stored)
    }

    async fn delete_by_uid(&self, calendar_id: i64, uid: &str) -> StoreResult<()> {
        let mut inner = self.write();
        let Some(index) = inner
            .events
            .iter()
            .position(|e| e.calendar_id == calendar_id && e.uid == uid)
        else {
            return Err(StoreError::NotFound);
        };

        let removed = inner.events.swap_remove(index);
        inner.tombstones.push(DeletedResource {
            kind: ResourceKind::Event,
            collection_id: calendar_id,
            uid: removed.uid,
            resource_name: Some(removed.resource_name),
            deleted_at: Utc::now(),
        });
        inner.touch_calendar(calendar_id);
        Ok(())
    }
}

#[async_trait]
impl AddressBooks for MemoryStore {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<AddressBook>> {
        Ok(self
            .read()
            .addressbooks
            .iter()
            .filter(|b| b.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_owned(&self, id: i64, user_id: i64) -> StoreResult<AddressBook> {
        self.read()
            .addressbooks
            .iter()
            .find(|b| b.id == id && b.owner_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, owner_id: i64, name: String) -> StoreResult<AddressBook> {
        let mut inner = self.write();

        if inner
            .addressbooks
            .iter()
            .any(|b| b.owner_id == owner_id && b.name.eq_ignore_ascii_case(&name))
        {
            return Err(StoreError::Conflict(format!(
                "address book {name} already exists"
            )));
        }

        let created = AddressBook {
            id: inner.next_id(),
            owner_id,
            name,
            description: None,
            ctag: 1,
            updated_at: Utc::now(),
        };
        inner.addressbooks.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> StoreResult<AddressBook> {
        let mut inner = self.write();
        let book = inner
            .addressbooks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = name {
            book.name = name;
        }
        if let Some(description) = description {
            book.description = Some(description);
        }
        book.ctag += 1;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }
}

#[async_trait]
impl Contacts for MemoryStore {
    async fn get_by_uid(&self, addressbook_id: i64, uid: &str) -> StoreResult<Contact> {
        self.read()
            .contacts
            .iter()
            .find(|c| c.addressbook_id == addressbook_id && c.uid == uid)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_resource_name(
        &self,
        addressbook_id: i64,
        name: &str,
    ) -> StoreResult<Contact> {
        self.read()
            .contacts
            .iter()
            .find(|c| c.addressbook_id == addressbook_id && c.resource_name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_for_addressbook(&self, addressbook_id: i64) -> StoreResult<Vec<Contact>> {
        Ok(self
            .read()
            .contacts
            .iter()
            .filter(|c| c.addressbook_id == addressbook_id)
            .cloned()
            .collect())
    }

    async fn list_modified_since(
        &self,
        addressbook_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Contact>> {
        Ok(self
            .read()
            .contacts
            .iter()
            .filter(|c| c.addressbook_id == addressbook_id && c.last_modified > since)
            .cloned()
            .collect())
    }

    async fn list_with_birthdays(&self, user_id: i64) -> StoreResult<Vec<Contact>> {
        let inner = self.read();
        let owned: Vec<i64> = inner
            .addressbooks
            .iter()
            .filter(|b| b.owner_id == user_id)
            .map(|b| b.id)
            .collect();

        Ok(inner
            .contacts
            .iter()
            .filter(|c| owned.contains(&c.addressbook_id) && c.birthday.is_some())
            .cloned()
            .collect())
    }

    async fn upsert(&self, contact: NewContact) -> StoreResult<Contact> {
        let mut inner = self.write();

        inner.tombstones.retain(|t| {
            !(t.kind == ResourceKind::Contact
                && t.collection_id == contact.addressbook_id
                && t.uid == contact.uid)
        });

        let now = Utc::now();
        let stored = if let Some(existing) = inner.contacts.iter_mut().find(|c| {
            c.addressbook_id == contact.addressbook_id
                && c.resource_name == contact.resource_name
        }) {
            existing.uid = contact.uid;
            existing.raw_vcard = contact.raw_vcard;
            existing.etag = contact.etag;
            existing.display_name = contact.display_name;
            existing.birthday = contact.birthday;
            existing.last_modified = now;
            existing.clone()
        } else {
            let created = Contact {
                id: inner.next_id(),
                addressbook_id: contact.addressbook_id,
                uid: contact.uid,
                resource_name: contact.resource_name,
                raw_vcard: contact.raw_vcard,
                etag: contact.etag,
                display_name: contact.display_name,
                birthday: contact.birthday,
                last_modified: now,
            };
            inner.contacts.push(created.clone());
            created
        };

        inner.touch_addressbook(stored.addressbook_id);
        Ok(stored)
    }

    async fn delete_by_uid(&self, addressbook_id: i64, uid: &str) -> StoreResult<()> {
        let mut inner = self.write();
        let Some(index) = inner
            .contacts
            .iter()
            .position(|c| c.addressbook_id == addressbook_id && c.uid == uid)
        else {
            return Err(StoreError::NotFound);
        };

        let removed = inner.contacts.swap_remove(index);
        inner.tombstones.push(DeletedResource {
            kind: ResourceKind::Contact,
            collection_id: addressbook_id,
            uid: removed.uid,
            resource_name: Some(removed.resource_name),
            deleted_at: Utc::now(),
        });
        inner.touch_addressbook(addressbook_id);
        Ok(())
    }
}

#[async_trait]
impl DeletedResources for MemoryStore {
    async fn list_deleted_since(
        &self,
        kind: ResourceKind,
        collection_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DeletedResource>> {
        Ok(self
            .read()
            .tombstones
            .iter()
            .filter(|t| t.kind == kind && t.collection_id == collection_id && t.deleted_at > since)
            .cloned()
            .collect())
    }

    async fn cleanup(&self, older_than: DateTime<Utc>) -> StoreResult<usize> {
        let mut inner = self.write();
        let before = inner.tombstones.len();
        inner.tombstones.retain(|t| t.deleted_at >= older_than);
        Ok(before - inner.tombstones.len())
    }
}
