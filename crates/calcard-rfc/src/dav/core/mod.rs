//! `WebDAV` XML types.
//!
//! This module defines the core types for `WebDAV` XML elements
//! used in `PROPFIND`, `PROPPATCH`, `REPORT`, and multistatus responses.

mod depth;
mod mkcalendar;
mod multistatus;
mod namespace;
mod precondition;
mod property;
mod propfind;
mod proppatch;
mod report;

pub use depth::Depth;
pub use mkcalendar::MkCalendarRequest;
pub use multistatus::{DavResponse, Multistatus, Propstat, status_line};
pub use namespace::{CALDAV_NS, CARDDAV_NS, CS_NS, DAV_NS, Namespace, QName};
pub use precondition::ErrorCondition;
pub use property::{DavProperty, PropValue, PropertyName};
pub use propfind::{PropfindRequest, PropfindType};
pub use proppatch::ProppatchRequest;
pub use report::{
    CalendarDataRequest, CalendarMultiget, CalendarQuery, CompFilter, CompSelection,
    ExpandProperty, ExpandPropertyItem, FreeBusyQuery, Multiget, ParamFilter, PropFilter,
    ReportRequest, ReportType, SyncCollection, TextMatch, TimeRange,
};
