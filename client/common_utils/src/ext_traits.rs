//! Extension traits for working with weakly-typed backend envelopes.

use error_stack::ResultExt;
use serde_json::Value;

use crate::{errors::ParsingError, CustomResult};

/// Tolerant accessors over `serde_json::Value`. Backend and SDK responses in
/// this system do not share a stable envelope, so string extraction has to
/// accept strings, numbers, and nested wrappers alike.
pub trait ValueExt {
    /// A direct string field, with numeric values stringified. Empty strings
    /// count as absent.
    fn get_str(&self, key: &str) -> Option<String>;

    /// A string field reached through one level of nesting.
    fn get_nested_str(&self, outer: &str, key: &str) -> Option<String>;

    /// First non-empty string found under any of the given keys.
    fn first_str(&self, keys: &[&str]) -> Option<String>;

    /// Deserialize `self` into a concrete type, tagging failures with the
    /// type name for diagnostics.
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned;
}

impl ValueExt for Value {
    fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn get_nested_str(&self, outer: &str, key: &str) -> Option<String> {
        self.get(outer)?.get_str(key)
    }

    fn first_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get_str(key))
    }

    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(self).change_context(ParsingError::StructParseFailure(type_name))
    }
}

pub trait ByteSliceExt {
    fn parse_struct<T>(&self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned;
}

impl ByteSliceExt for [u8] {
    fn parse_struct<T>(&self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(self).change_context(ParsingError::StructParseFailure(type_name))
    }
}

pub trait OptionExt<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ParsingError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ParsingError> {
        self.ok_or_else(|| ParsingError::MissingRequiredField { field_name }.into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_str_stringifies_numbers() {
        let value = json!({ "amount": 99900, "currency": "INR", "empty": "" });
        assert_eq!(value.get_str("amount"), Some("99900".to_string()));
        assert_eq!(value.get_str("currency"), Some("INR".to_string()));
        assert_eq!(value.get_str("empty"), None);
        assert_eq!(value.get_str("missing"), None);
    }

    #[test]
    fn first_str_respects_key_order() {
        let value = json!({ "id": "ord_2", "order_id": "ord_1" });
        assert_eq!(
            value.first_str(&["order_id", "id"]),
            Some("ord_1".to_string())
        );
    }

    #[test]
    fn nested_str_reaches_one_level() {
        let value = json!({ "data": { "order_id": "ord_9" } });
        assert_eq!(
            value.get_nested_str("data", "order_id"),
            Some("ord_9".to_string())
        );
        assert_eq!(value.get_nested_str("missing", "order_id"), None);
    }
}
