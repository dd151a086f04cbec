//! Persistent entity shapes.
//!
//! Ids are stable integers. `ctag` is a monotonically increasing integer
//! per collection; `updated_at` carries nanosecond resolution because it
//! feeds sync tokens.

use chrono::{DateTime, Utc};

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub primary_email: String,
}

/// A calendar collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub id: i64,
    pub owner_id: i64,
    /// Display name; never fully numeric so name-addressed paths cannot
    /// collide with id-addressed ones.
    pub name: String,
    /// Lowercase URL slug, unique per owner (case-insensitive).
    pub slug: Option<String>,
    pub description: Option<String>,
    /// Raw `calendar-timezone` payload (a VTIMEZONE-carrying VCALENDAR).
    pub timezone: Option<String>,
    pub ctag: i64,
    pub updated_at: DateTime<Utc>,
}

/// A calendar joined with the requesting user's access flags. Derived
/// from sharing state; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarAccess {
    pub calendar: Calendar,
    /// May create, modify, and delete child resources.
    pub editor: bool,
    /// Accessible through a share rather than ownership.
    pub shared: bool,
    /// Sees only free-busy time, not event data.
    pub read_free_busy_only: bool,
}

impl CalendarAccess {
    /// Owner-equivalent access: full control, not via a share.
    #[must_use]
    pub fn owner(calendar: Calendar) -> Self {
        Self {
            calendar,
            editor: true,
            shared: false,
            read_free_busy_only: false,
        }
    }
}

/// A calendar object resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub calendar_id: i64,
    /// iCalendar UID; unique within the calendar.
    pub uid: String,
    /// URL segment (extension stripped); also unique within the calendar.
    pub resource_name: String,
    pub raw_ical: String,
    /// Content-addressed hash of `raw_ical` (lowercase hex SHA-256).
    pub etag: String,
    pub dt_start: Option<DateTime<Utc>>,
    pub dt_end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub summary: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// An address-book collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBook {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub ctag: i64,
    pub updated_at: DateTime<Utc>,
}

/// A contact (vCard object resource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub addressbook_id: i64,
    pub uid: String,
    pub resource_name: String,
    pub raw_vcard: String,
    pub etag: String,
    pub display_name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
}

/// Which family of collection a tombstone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Event,
    Contact,
}

/// A deletion marker kept for incremental sync replies. Cleared when a
/// resource with the same (collection, uid) is re-created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedResource {
    pub kind: ResourceKind,
    pub collection_id: i64,
    pub uid: String,
    pub resource_name: Option<String>,
    pub deleted_at: DateTime<Utc>,
}
