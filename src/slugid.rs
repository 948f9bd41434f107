use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use uuid::Uuid;

/// Generate a "nice" slug id: a v4 UUID encoded as 22 characters of
/// url-safe base64, with the leading bit cleared so the id never starts
/// with `-` or `_` and cannot be mistaken for a command line flag.
pub fn nice() -> String {
    let mut bytes = *Uuid::new_v4().as_bytes();
    bytes[0] &= 0x7f;
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_ids_are_22_chars_with_safe_prefix() {
        for _ in 0..256 {
            let id = nice();
            assert_eq!(id.len(), 22);
            let first = id.chars().next().unwrap();
            assert!(first.is_ascii_uppercase() || ('a'..='f').contains(&first), "{}", id);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn nice_ids_decode_to_v4_uuids() {
        let bytes = URL_SAFE_NO_PAD.decode(nice()).unwrap();
        let uuid = Uuid::from_slice(&bytes).unwrap();
        assert_eq!(uuid.get_version_num(), 4);
    }

    #[test]
    fn nice_ids_differ() {
        assert_ne!(nice(), nice());
    }
}
