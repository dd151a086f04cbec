// DAV verb handlers plus the glue they share: request context
// extraction, capped body reads, and response writers.

pub mod method;
pub mod response;
pub mod util;
