use std::any::type_name;

use sha2::{Digest, Sha256};

/// Resolves a raw key into a key scoped to the value type `T`.
///
/// The scoped key is the type's name followed by `raw`. When `hashed` is set,
/// the lowercase hex SHA-256 digest of that string is used instead.
pub fn resolve_key<T: ?Sized>(raw: &str, hashed: bool) -> String {
    let scoped = format!("{}{}", type_name::<T>(), raw);
    if hashed { hash_key(&scoped) } else { scoped }
}

/// Lowercase hex SHA-256 digest of `text`
pub fn hash_key(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User;
    struct Order;

    #[test]
    fn test_plain_key_is_type_scoped() {
        let key = resolve_key::<User>("user:42", false);
        assert_eq!(key, format!("{}user:42", type_name::<User>()));
        assert!(key.ends_with("Useruser:42"));
    }

    #[test]
    fn test_same_suffix_different_types_do_not_collide() {
        assert_ne!(resolve_key::<User>("1", false), resolve_key::<Order>("1", false));
        assert_ne!(resolve_key::<User>("1", true), resolve_key::<Order>("1", true));
    }

    #[test]
    fn test_hashed_key_is_deterministic() {
        let a = resolve_key::<User>("user:42", true);
        let b = resolve_key::<User>("user:42", true);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, resolve_key::<User>("user:43", true));
    }

    #[test]
    fn test_hash_key_known_digest() {
        assert_eq!(
            hash_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
