//! CLI command implementations

pub mod clean;
pub mod retrieve;
pub mod store;

pub use clean::execute as clean;
pub use retrieve::execute as retrieve;
pub use store::execute as store;

use crate::error::{PlzError, PlzResult};

/// Decode a hex cache key given on the command line
pub(crate) fn decode_key(key: &str) -> PlzResult<Vec<u8>> {
    if key.is_empty() {
        return Err(PlzError::InvalidKey("key is empty".to_string()));
    }
    hex::decode(key).map_err(|e| PlzError::InvalidKey(format!("{}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid_key() {
        assert_eq!(decode_key("00ff10").unwrap(), vec![0x00, 0xff, 0x10]);
    }

    #[test]
    fn decode_rejects_bad_keys() {
        assert!(matches!(decode_key(""), Err(PlzError::InvalidKey(_))));
        assert!(matches!(decode_key("xyz"), Err(PlzError::InvalidKey(_))));
        assert!(matches!(decode_key("abc"), Err(PlzError::InvalidKey(_))));
    }
}
