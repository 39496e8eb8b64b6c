//! Attribute values carried by a frame entity.

use serde::{Deserialize, Serialize};

/// One attribute value, serialized as the bare JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    String(String),
    /// Ordered names, e.g. `source_list`.
    List(Vec<String>),
}

impl AttributeValue {
    #[must_use]
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_each_variant_as_bare_json() {
        let json = |value: &AttributeValue| serde_json::to_string(value).unwrap();
        assert_eq!(json(&AttributeValue::from("Favourites")), "\"Favourites\"");
        assert_eq!(json(&AttributeValue::Int(1800)), "1800");
        assert_eq!(json(&AttributeValue::Bool(false)), "false");
        assert_eq!(json(&AttributeValue::string_list(["A", "B"])), r#"["A","B"]"#);
    }

    #[test]
    fn should_read_back_a_source_list() {
        let value: AttributeValue = serde_json::from_str(r#"["Bauhaus","Dutch Masters"]"#).unwrap();
        assert_eq!(value, AttributeValue::string_list(["Bauhaus", "Dutch Masters"]));
    }

    #[test]
    fn should_only_borrow_text_values() {
        assert_eq!(AttributeValue::from("x").as_str(), Some("x"));
        assert_eq!(AttributeValue::Int(1).as_str(), None);
    }
}
