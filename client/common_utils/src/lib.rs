pub mod consts;
pub mod errors;
pub mod ext_traits;
pub mod fp_utils;
pub mod types;

/// Type alias for `Result` carrying an `error_stack::Report` on the failure side.
pub type CustomResult<T, E> = error_stack::Result<T, E>;
