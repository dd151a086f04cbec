use thiserror::Error;

/// Umbrella error for the format crate.
#[derive(Error, Debug)]
pub enum RfcError {
    #[error(transparent)]
    Ical(#[from] crate::ical::IcalError),

    #[error(transparent)]
    Vcard(#[from] crate::vcard::VcardError),

    #[error(transparent)]
    DavParse(#[from] crate::dav::parse::ParseError),

    #[error("XML build error: {0}")]
    XmlBuild(String),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
