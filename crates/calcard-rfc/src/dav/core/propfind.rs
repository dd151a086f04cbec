//! PROPFIND request model (RFC 4918 §9.1).

use super::property::PropertyName;

/// What a PROPFIND asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropfindType {
    /// `<allprop/>`, optionally with `<include>` names.
    AllProp { include: Vec<PropertyName> },
    /// `<propname/>`: names only, empty values.
    PropName,
    /// `<prop>`: the named properties.
    Prop(Vec<PropertyName>),
}

/// A parsed PROPFIND request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropfindRequest {
    pub propfind_type: PropfindType,
}

impl PropfindRequest {
    /// An `allprop` request; also the interpretation of an empty or
    /// unparseable body.
    #[must_use]
    pub fn allprop() -> Self {
        Self {
            propfind_type: PropfindType::AllProp {
                include: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn allprop_with_include(include: Vec<PropertyName>) -> Self {
        Self {
            propfind_type: PropfindType::AllProp { include },
        }
    }

    #[must_use]
    pub fn propname() -> Self {
        Self {
            propfind_type: PropfindType::PropName,
        }
    }

    #[must_use]
    pub fn prop(properties: Vec<PropertyName>) -> Self {
        Self {
            propfind_type: PropfindType::Prop(properties),
        }
    }

    #[must_use]
    pub fn is_allprop(&self) -> bool {
        matches!(self.propfind_type, PropfindType::AllProp { .. })
    }

    #[must_use]
    pub fn is_propname(&self) -> bool {
        matches!(self.propfind_type, PropfindType::PropName)
    }

    /// The explicitly named properties, when this is a `<prop>` request.
    #[must_use]
    pub fn requested_properties(&self) -> Option<&[PropertyName]> {
        match &self.propfind_type {
            PropfindType::Prop(props) => Some(props),
            PropfindType::AllProp { .. } | PropfindType::PropName => None,
        }
    }
}
