//! REPORT request models (RFC 4791 §7, RFC 6352 §8, RFC 6578, RFC 3253).

use super::property::PropertyName;

/// A parsed REPORT request: the report variant plus the `<prop>` names it
/// carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub properties: Vec<PropertyName>,
}

/// Which report the body's root element named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportType {
    CalendarQuery(CalendarQuery),
    CalendarMultiget(Multiget),
    FreeBusyQuery(FreeBusyQuery),
    SyncCollection(SyncCollection),
    ExpandProperty(ExpandProperty),
    AddressbookQuery(CalendarQuery),
    AddressbookMultiget(Multiget),
}

/// `calendar-query` (RFC 4791 §7.8). The same shape serves
/// `addressbook-query`, whose filter grammar is a subset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalendarQuery {
    pub filter: Option<CompFilter>,
    pub calendar_data: Option<CalendarDataRequest>,
}

/// `calendar-multiget` / `addressbook-multiget`: explicit hrefs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Multiget {
    pub hrefs: Vec<String>,
    pub calendar_data: Option<CalendarDataRequest>,
}

pub type CalendarMultiget = Multiget;

/// `free-busy-query` (RFC 4791 §7.10).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FreeBusyQuery {
    pub time_range: Option<TimeRange>,
}

/// `sync-collection` (RFC 6578 §3.2).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncCollection {
    /// The client's token; empty element or absent means initial sync.
    pub sync_token: Option<String>,
}

/// `expand-property` (RFC 3253 §3.8).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpandProperty {
    pub items: Vec<ExpandPropertyItem>,
}

/// One `<property name="..."/>` in an expand-property report, with its
/// nested expansions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpandPropertyItem {
    pub name: String,
    pub namespace: Option<String>,
    pub children: Vec<ExpandPropertyItem>,
}

/// `comp-filter` node (RFC 4791 §9.7.1).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompFilter {
    pub name: String,
    pub is_not_defined: bool,
    pub time_range: Option<TimeRange>,
    pub text_match: Option<TextMatch>,
    pub prop_filters: Vec<PropFilter>,
    pub comp_filters: Vec<CompFilter>,
}

/// `prop-filter` node (RFC 4791 §9.7.2).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropFilter {
    pub name: String,
    pub is_not_defined: bool,
    pub text_match: Option<TextMatch>,
    pub param_filters: Vec<ParamFilter>,
}

/// `param-filter` node (RFC 4791 §9.7.3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamFilter {
    pub name: String,
    pub is_not_defined: bool,
    pub text_match: Option<TextMatch>,
}

/// `text-match` (RFC 4791 §9.7.5): case-insensitive ASCII substring, with
/// `negate-condition="yes"` flipping the result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextMatch {
    pub value: String,
    pub negate: bool,
}

/// `time-range` bounds, kept as the raw attribute strings; parse errors
/// degrade to "matches" at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// `<calendar-data>` request element: an optional component/property
/// sub-selection to project returned payloads through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalendarDataRequest {
    pub selection: Option<CompSelection>,
}

impl CalendarDataRequest {
    /// Full payloads, no projection.
    #[must_use]
    pub fn full() -> Self {
        Self { selection: None }
    }
}

/// A `<comp name="...">` selector. `props` of `None` means all properties;
/// an empty `comps` list means all child components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompSelection {
    pub name: String,
    pub props: Option<Vec<String>>,
    pub comps: Vec<CompSelection>,
}

impl CompSelection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: None,
            comps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_prop(mut self, prop: impl Into<String>) -> Self {
        self.props
            .get_or_insert_with(Vec::new)
            .push(prop.into().to_ascii_uppercase());
        self
    }

    #[must_use]
    pub fn with_comp(mut self, comp: Self) -> Self {
        self.comps.push(comp);
        self
    }
}
