//! Storage collaborators: the data model, the repository traits the
//! protocol core is written against, and an in-memory reference
//! implementation.
//!
//! Every repository method is async; dropping the request future is the
//! cancellation signal, so no separate context handle is threaded
//! through. Implementations must be linearizable per (collection, uid).

pub mod error;
pub mod memory;
pub mod model;
pub mod repo;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use model::{
    AddressBook, Calendar, CalendarAccess, Contact, DeletedResource, Event, ResourceKind, User,
};
pub use repo::{
    AddressBooks, Calendars, Contacts, DeletedResources, Events, NewCalendar, NewEvent,
    NewContact, Store, Users,
};
