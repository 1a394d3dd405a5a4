//! Password encryption with a key derived from the access key secret.
//!
//! The key is the lowercase hex MD5 digest of the secret (32 ASCII bytes, so
//! AES-256) and the IV is its first 16 bytes. Ciphertext is AES-CBC with PKCS#7
//! padding, base64 encoded with the standard alphabet.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use md5::{Digest, Md5};

use crate::{EdgeError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const IV_LEN: usize = 16;

fn derive_key(secret: &str) -> String {
    hex::encode(Md5::digest(secret.as_bytes()))
}

/// Encrypts `plaintext` for transmission to the edge API.
pub fn encrypt_by_access_key(secret: &str, plaintext: &str) -> Result<String> {
    let key = derive_key(secret);
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &key.as_bytes()[..IV_LEN])
        .map_err(|err| EdgeError::Crypto(format!("invalid key material: {err}")))?;
    let encrypted = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(BASE64_STANDARD.encode(encrypted))
}

/// Inverse of [`encrypt_by_access_key`].
pub fn decrypt_by_access_key(secret: &str, ciphertext: &str) -> Result<String> {
    let key = derive_key(secret);
    let encrypted = BASE64_STANDARD
        .decode(ciphertext.trim())
        .map_err(|err| EdgeError::Crypto(format!("invalid base64 ciphertext: {err}")))?;
    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), &key.as_bytes()[..IV_LEN])
        .map_err(|err| EdgeError::Crypto(format!("invalid key material: {err}")))?;
    let decrypted = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&encrypted)
        .map_err(|err| EdgeError::Crypto(format!("invalid padding: {err}")))?;
    String::from_utf8(decrypted)
        .map_err(|err| EdgeError::Crypto(format!("plaintext is not utf-8: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{decrypt_by_access_key, derive_key, encrypt_by_access_key};
    use crate::ErrorKind;

    #[test]
    fn key_is_hex_md5_of_secret() {
        assert_eq!(derive_key("sk-secret"), "c8181fd739455c9e2f0ecaca38685cbd");
    }

    #[test]
    fn encrypt_matches_known_vector() {
        let encrypted = encrypt_by_access_key("sk-secret", "P@ssw0rd!").unwrap();
        assert_eq!(encrypted, "iPWNVocQV+H79x62oEMqEQ==");
    }

    #[test]
    fn decrypt_restores_plaintext() {
        let encrypted = encrypt_by_access_key("another-secret", "root password").unwrap();
        assert_ne!(encrypted, "root password");
        assert_eq!(
            decrypt_by_access_key("another-secret", &encrypted).unwrap(),
            "root password"
        );
    }

    #[test]
    fn decrypt_rejects_garbage() {
        let err = decrypt_by_access_key("sk", "not base64!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unclassified);
    }
}
