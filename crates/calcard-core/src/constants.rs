/// Route component constants shared across crates
pub const DAV_ROUTE_COMPONENT: &str = "dav";
pub const DAV_ROUTE_PREFIX: &str = const_str::concat!("/", DAV_ROUTE_COMPONENT);

pub const PRINCIPALS_ROUTE_COMPONENT: &str = "principals";
pub const PRINCIPALS_ROUTE_PREFIX: &str =
    const_str::concat!(DAV_ROUTE_PREFIX, "/", PRINCIPALS_ROUTE_COMPONENT);

pub const CALENDARS_ROUTE_COMPONENT: &str = "calendars";
pub const CALENDARS_ROUTE_PREFIX: &str =
    const_str::concat!(DAV_ROUTE_PREFIX, "/", CALENDARS_ROUTE_COMPONENT);

pub const ADDRESSBOOKS_ROUTE_COMPONENT: &str = "addressbooks";
pub const ADDRESSBOOKS_ROUTE_PREFIX: &str =
    const_str::concat!(DAV_ROUTE_PREFIX, "/", ADDRESSBOOKS_ROUTE_COMPONENT);

/// Collection id of the synthesized read-only birthday calendar.
pub const BIRTHDAY_CALENDAR_ID: i64 = -1;

/// Display name of the birthday calendar as advertised in PROPFIND.
pub const BIRTHDAY_CALENDAR_NAME: &str = "Birthdays";

/// URN prefix of serialized sync tokens (`urn:<prefix>:<kind>:<id>:<nanos>`).
pub const SYNC_TOKEN_PREFIX: &str = "calcard-sync";

/// Host part of synthesized birthday event UIDs.
pub const BIRTHDAY_UID_DOMAIN: &str = "calcard";
