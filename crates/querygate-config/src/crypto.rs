// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! At-rest encryption for credential settings.
//!
//! Secrets are sealed with AES-256-GCM under a per-installation key and
//! written as `enc:<base64(nonce || ciphertext || tag)>`. Every seal draws a
//! fresh 96-bit nonce from the system CSPRNG.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use querygate_core::QueryGateError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};

/// Prefix marking an encrypted setting value.
pub const ENCRYPTED_PREFIX: &str = "enc:";

const KEY_LEN: usize = 32;

fn cipher(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, QueryGateError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| QueryGateError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Generate a random 32-byte key.
pub fn generate_key() -> Result<[u8; KEY_LEN], QueryGateError> {
    let mut key = [0u8; KEY_LEN];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| QueryGateError::Internal("failed to generate random key".to_string()))?;
    Ok(key)
}

/// Encrypt a secret into its `enc:` representation.
pub fn seal_secret(key: &[u8; KEY_LEN], plaintext: &str) -> Result<String, QueryGateError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| QueryGateError::Internal("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.as_bytes().to_vec();
    cipher(key)?
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| QueryGateError::Internal("AES-256-GCM encryption failed".to_string()))?;

    let mut packed = Vec::with_capacity(NONCE_LEN + in_out.len());
    packed.extend_from_slice(&nonce_bytes);
    packed.extend_from_slice(&in_out);
    Ok(format!("{ENCRYPTED_PREFIX}{}", STANDARD.encode(packed)))
}

/// Decrypt an `enc:` value.
///
/// Fails on a wrong key, tampered data or malformed encoding. Values without
/// the prefix are rejected too; use [`reveal`] for tolerant decoding.
pub fn open_secret(key: &[u8; KEY_LEN], value: &str) -> Result<String, QueryGateError> {
    let encoded = value
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or_else(|| QueryGateError::Config("value is not encrypted".to_string()))?;
    let packed = STANDARD
        .decode(encoded)
        .map_err(|e| QueryGateError::Config(format!("invalid encrypted value: {e}")))?;
    if packed.len() < NONCE_LEN {
        return Err(QueryGateError::Config(
            "invalid encrypted value: too short".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = packed.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| QueryGateError::Config("invalid encrypted value: bad nonce".to_string()))?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = cipher(key)?
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| {
            QueryGateError::Config(
                "decryption failed -- wrong key or corrupted data".to_string(),
            )
        })?;

    String::from_utf8(plaintext.to_vec())
        .map_err(|_| QueryGateError::Config("decrypted value is not UTF-8".to_string()))
}

/// Decode a stored setting, tolerating plaintext.
///
/// Values that are not encrypted, or that fail to decrypt, are returned
/// unchanged.
pub fn reveal(key: &[u8; KEY_LEN], value: &str) -> String {
    if !value.starts_with(ENCRYPTED_PREFIX) {
        return value.to_string();
    }
    match open_secret(key, value) {
        Ok(plain) => plain,
        Err(e) => {
            tracing::warn!(error = %e, "could not decrypt stored secret, using it verbatim");
            value.to_string()
        }
    }
}

/// Default location of the installation key.
pub fn default_key_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("querygate")
        .join("settings.key")
}

/// Read the key at `path`, creating it (mode 0600 on unix) if absent.
pub fn load_or_create_key(path: &Path) -> Result<[u8; KEY_LEN], QueryGateError> {
    match std::fs::read(path) {
        Ok(bytes) => bytes.as_slice().try_into().map_err(|_| {
            QueryGateError::Config(format!(
                "key file {} has {} bytes, expected {KEY_LEN}",
                path.display(),
                bytes.len()
            ))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let key = generate_key()?;
            write_key(path, &key)?;
            tracing::info!(path = %path.display(), "created settings encryption key");
            Ok(key)
        }
        Err(e) => Err(QueryGateError::storage(e)),
    }
}

fn write_key(path: &Path, key: &[u8; KEY_LEN]) -> Result<(), QueryGateError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(QueryGateError::storage)?;
    }
    std::fs::write(path, key).map_err(QueryGateError::storage)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(QueryGateError::storage)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = generate_key().unwrap();
        let sealed = seal_secret(&key, "sk-live-abc123").unwrap();
        assert!(sealed.starts_with(ENCRYPTED_PREFIX));
        assert!(!sealed.contains("sk-live"));
        assert_eq!(open_secret(&key, &sealed).unwrap(), "sk-live-abc123");
    }

    #[test]
    fn sealing_twice_differs() {
        let key = generate_key().unwrap();
        assert_ne!(
            seal_secret(&key, "same").unwrap(),
            seal_secret(&key, "same").unwrap()
        );
    }

    #[test]
    fn wrong_key_fails_but_reveal_tolerates() {
        let k1 = generate_key().unwrap();
        let k2 = generate_key().unwrap();
        let sealed = seal_secret(&k1, "secret").unwrap();
        assert!(open_secret(&k2, &sealed).is_err());
        assert_eq!(reveal(&k2, &sealed), sealed);
    }

    #[test]
    fn reveal_passes_plaintext_through() {
        let key = generate_key().unwrap();
        assert_eq!(reveal(&key, "plain-key"), "plain-key");
    }

    #[test]
    fn garbage_after_prefix_is_rejected() {
        let key = generate_key().unwrap();
        assert!(open_secret(&key, "enc:!!!").is_err());
        assert!(open_secret(&key, "enc:AAAA").is_err());
    }

    #[test]
    fn key_file_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.key");
        let first = load_or_create_key(&path).unwrap();
        let second = load_or_create_key(&path).unwrap();
        assert_eq!(first, second);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn truncated_key_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.key");
        std::fs::write(&path, [1u8; 7]).unwrap();
        assert!(load_or_create_key(&path).is_err());
    }
}
