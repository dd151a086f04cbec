// One module per verb, wired together by the router.

pub mod delete;
pub mod get_head;
pub mod mkcalendar;
pub mod mkcol;
pub mod options;
pub mod propfind;
pub mod proppatch;
pub mod put;
pub mod report;
