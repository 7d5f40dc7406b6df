//! Small helpers shared across the client crates.

use crate::consts::{ALPHABETS, ID_LENGTH, RECEIPT_PREFIX};

/// based on the condition provided into the `predicate`
pub fn when<E, F>(predicate: bool, f: F) -> Result<(), E>
where
    F: FnOnce() -> Result<(), E>,
{
    if predicate {
        f()
    } else {
        Ok(())
    }
}

#[inline]
pub fn generate_id_with_default_len(prefix: &str) -> String {
    let len: usize = ID_LENGTH;
    format!("{}_{}", prefix, nanoid::nanoid!(len, &ALPHABETS))
}

/// Receipt string attached to every created order, unique per attempt.
#[inline]
pub fn generate_receipt_id() -> String {
    generate_id_with_default_len(RECEIPT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_ids_are_prefixed_and_unique() {
        let first = generate_receipt_id();
        let second = generate_receipt_id();
        assert!(first.starts_with("rcpt_"));
        assert_ne!(first, second);
    }
}
