//! Gateway checksums, bit-compatible with the gateway's own checksum library
//!
//! `checksum = base64(AES-128-CBC(key, IV, hex(SHA-256(payload + "|" + salt)) + salt))`
//! with a fresh four character salt per signature. Verification decrypts the checksum,
//! takes the salt from its last four characters and recomputes the hash. JSON bodies are
//! signed over their exact serialized text, so field order matters. Form posts are signed
//! over a canonical string: values of the fields sorted by key, joined with `|`, any
//! case-variant of `null` counting as empty.

use std::collections::BTreeMap;

use aes::Aes128;
use base64::Engine;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::utils::secure_eq;

type Encryptor = cbc::Encryptor<Aes128>;
type Decryptor = cbc::Decryptor<Aes128>;

/// Fixed initialisation vector of the gateway's scheme
const IV: &[u8; 16] = b"@@@@&&&&####$$$$";
pub const SALT_LEN: usize = 4;
/// Merchant keys are AES-128 keys
pub const MERCHANT_KEY_LEN: usize = 16;

/// Four base64 characters from three random bytes
fn random_salt() -> String {
    let bytes: [u8; 3] = rand::thread_rng().gen();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn salted_hash(payload: &str, salt: &str) -> String {
    let digest = Sha256::digest(format!("{}|{}", payload, salt).as_bytes());
    format!("{}{}", hex::encode(digest), salt)
}

fn check_key(key: &str) -> PaymentResult<()> {
    if key.is_empty() {
        return Err(PaymentError::NotConfigured {
            provider: "paytm".to_string(),
        });
    }
    if key.len() != MERCHANT_KEY_LEN {
        return Err(PaymentError::ChecksumError {
            message: format!("merchant key must be {} bytes", MERCHANT_KEY_LEN),
        });
    }
    Ok(())
}

pub(crate) fn checksum_with_salt(payload: &str, key: &str, salt: &str) -> PaymentResult<String> {
    check_key(key)?;
    let cipher = Encryptor::new_from_slices(key.as_bytes(), IV).map_err(|e| {
        PaymentError::ChecksumError {
            message: format!("invalid merchant key: {}", e),
        }
    })?;
    let encrypted = cipher.encrypt_padded_vec_mut::<Pkcs7>(salted_hash(payload, salt).as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(encrypted))
}

fn decrypt(checksum: &str, key: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(checksum)
        .ok()?;
    let cipher = Decryptor::new_from_slices(key.as_bytes(), IV).ok()?;
    let plain = cipher.decrypt_padded_vec_mut::<Pkcs7>(&bytes).ok()?;
    String::from_utf8(plain).ok()
}

/// Sign an exact payload string
pub fn generate_signature(payload: &str, key: &str) -> PaymentResult<String> {
    checksum_with_salt(payload, key, &random_salt())
}

/// True only when `checksum` was produced with `key` over exactly `payload`
pub fn verify_signature(payload: &str, key: &str, checksum: &str) -> bool {
    if check_key(key).is_err() {
        return false;
    }
    let Some(hash) = decrypt(checksum.trim(), key) else {
        return false;
    };
    if hash.len() <= SALT_LEN || !hash.is_char_boundary(hash.len() - SALT_LEN) {
        return false;
    }
    let salt = &hash[hash.len() - SALT_LEN..];
    secure_eq(salted_hash(payload, salt).as_bytes(), hash.as_bytes())
}

/// Canonical string for a posted field set
pub fn canonical_form(fields: &BTreeMap<String, String>) -> String {
    fields
        .values()
        .map(|v| {
            if v.eq_ignore_ascii_case("null") {
                ""
            } else {
                v.as_str()
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

pub fn generate_form_signature(fields: &BTreeMap<String, String>, key: &str) -> PaymentResult<String> {
    generate_signature(&canonical_form(fields), key)
}

pub fn verify_form_signature(fields: &BTreeMap<String, String>, key: &str, checksum: &str) -> bool {
    verify_signature(&canonical_form(fields), key, checksum)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "abcdEFGH12345678";

    // Known answers produced by the gateway's reference checksum library
    const BODY: &str = r#"{"mid":"MID","orderId":"ORDER_1"}"#;
    const BODY_CHECKSUM: &str = "PsNE0gc7i5Wq4ILNbfCTfS7jN5lF2NJepPFqc96boZ6R7OJ31KCJ8A+LRh7hevJ8NayUZ2XG4wqPd0SAVpbBW/8bbibeUg32sFQFjoDuwWc=";
    const FORM_CHECKSUM: &str = "E+Osi1ftBo7+BrOKeAlGBv4MZh5AOYNqzDGW0cscXn+Pc42+w6fO9VfuXXcIoQ/QoYOtp1sztlChOhUWjaYDZynT+ONdDjRQ6AgqRGidgtg=";

    fn fields() -> BTreeMap<String, String> {
        [
            ("ORDERID", "ORDER_1700000000000"),
            ("STATUS", "TXN_SUCCESS"),
            ("TXNID", "20240101111212800110168"),
            ("TXNAMOUNT", "500.00"),
            ("BANKTXNID", "NULL"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn matches_gateway_known_answers() {
        assert_eq!(checksum_with_salt(BODY, KEY, "Ab3d").unwrap(), BODY_CHECKSUM);
        assert!(verify_signature(BODY, KEY, BODY_CHECKSUM));

        assert_eq!(
            canonical_form(&fields()),
            "|ORDER_1700000000000|TXN_SUCCESS|500.00|20240101111212800110168"
        );
        assert_eq!(
            checksum_with_salt(&canonical_form(&fields()), KEY, "x9Q=").unwrap(),
            FORM_CHECKSUM
        );
        assert!(verify_form_signature(&fields(), KEY, FORM_CHECKSUM));
    }

    #[test]
    fn signature_verifies_for_same_payload() {
        let checksum = generate_signature(BODY, KEY).unwrap();
        assert!(verify_signature(BODY, KEY, &checksum));
    }

    #[test]
    fn salts_differ_between_signatures() {
        let a = generate_signature("x", KEY).unwrap();
        let b = generate_signature("x", KEY).unwrap();
        assert!(verify_signature("x", KEY, &a));
        assert!(verify_signature("x", KEY, &b));
        // 1 in 2^24 chance of a salt collision
        assert_ne!(a, b);
    }

    #[test]
    fn reordered_json_fails() {
        let checksum = generate_signature(r#"{"a":1,"b":2}"#, KEY).unwrap();
        assert!(!verify_signature(r#"{"b":2,"a":1}"#, KEY, &checksum));
    }

    #[test]
    fn tampered_form_field_fails() {
        let original = fields();
        let checksum = generate_form_signature(&original, KEY).unwrap();
        assert!(verify_form_signature(&original, KEY, &checksum));

        for key in original.keys() {
            let mut tampered = original.clone();
            tampered.insert(key.clone(), "tampered".to_string());
            assert!(
                !verify_form_signature(&tampered, KEY, &checksum),
                "tampering {} went unnoticed",
                key
            );
        }
    }

    #[test]
    fn wrong_key_and_garbage_fail() {
        assert!(!verify_form_signature(&fields(), "0therKey12345678", FORM_CHECKSUM));
        assert!(!verify_form_signature(&fields(), KEY, "abc"));
        assert!(!verify_form_signature(&fields(), KEY, ""));
        assert!(!verify_form_signature(&fields(), KEY, "not base64 at all!"));
    }

    #[test]
    fn null_counts_as_empty() {
        let mut with_null = fields();
        with_null.insert("BANKTXNID".to_string(), "null".to_string());
        let mut with_empty = fields();
        with_empty.insert("BANKTXNID".to_string(), String::new());
        assert_eq!(canonical_form(&with_null), canonical_form(&with_empty));
        assert_eq!(canonical_form(&fields()), canonical_form(&with_empty));
    }

    #[test]
    fn canonical_form_is_sorted_by_key() {
        let mut f = BTreeMap::new();
        f.insert("b".to_string(), "2".to_string());
        f.insert("a".to_string(), "1".to_string());
        assert_eq!(canonical_form(&f), "1|2");
    }

    #[test]
    fn empty_key_is_not_configured() {
        assert!(matches!(
            generate_signature("x", ""),
            Err(PaymentError::NotConfigured { .. })
        ));
        assert!(!verify_signature("x", "", "whatever"));
    }

    #[test]
    fn key_must_be_sixteen_bytes() {
        assert!(matches!(
            generate_signature("x", "short-key"),
            Err(PaymentError::ChecksumError { .. })
        ));
        assert!(!verify_signature(BODY, "abcdEFGH123456789", BODY_CHECKSUM));
    }
}
