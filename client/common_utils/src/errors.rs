/// Errors raised while pulling typed values out of loosely-shaped JSON envelopes.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParsingError {
    #[error("Failed to parse struct: {0}")]
    StructParseFailure(&'static str),
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
}
