// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential issuance.
//!
//! Builds the signed credential string for a clinical JSON document:
//! stores the document blob, mints the QR code record, wraps a SMART
//! Health Link and signs the resulting payload into the compact
//! `HC1:` token.

use base64::engine::general_purpose::URL_SAFE as BASE64_URL;
use base64::Engine;
use chrono::Utc;
use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::storage::{
    AccessFlag, DocumentStore, FileStore, QrCodeRepository, StorageError, StoredQrCode,
};

use super::codec::{self, CodecError};
use super::cose::{self, EnvelopeError};
use super::payload::{
    CertificatePayload, HealthCertificate, SHLinkContent, SmartHealthLink, SHLINK_LABEL,
};

/// Error type for issuance.
#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("storage failure during issuance: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to serialize credential payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to sign credential: {0}")]
    Signing(#[from] EnvelopeError),
    #[error("failed to encode credential: {0}")]
    Encoding(#[from] CodecError),
}

/// Credential encoder bound to the deployment's configuration and key.
pub struct CredentialEncoder<'a> {
    config: &'a AppConfig,
    storage: &'a FileStore,
    signer: &'a SigningKey,
}

impl<'a> CredentialEncoder<'a> {
    /// Create a new CredentialEncoder.
    pub fn new(config: &'a AppConfig, storage: &'a FileStore, signer: &'a SigningKey) -> Self {
        Self {
            config,
            storage,
            signer,
        }
    }

    /// Issue a signed credential wrapping the given clinical JSON.
    ///
    /// `expires_on` is an epoch-millisecond timestamp. An empty passcode is
    /// treated as absent.
    pub fn issue(
        &self,
        json_content: &str,
        pass_code: Option<String>,
        expires_on: Option<i64>,
    ) -> Result<String, IssuanceError> {
        let pass_code = pass_code.filter(|p| !p.is_empty());

        let key = random_bytes();
        let id = Uuid::new_v4().to_string();
        let manifest_id = BASE64_URL.encode(random_bytes());
        let json_file = DocumentStore::file_name(&id);

        let (url, flag) = if pass_code.is_some() {
            (self.config.manifest_url(&manifest_id), AccessFlag::P)
        } else {
            (self.config.ips_json_url(&manifest_id), AccessFlag::U)
        };

        let link = SHLinkContent {
            url,
            flag,
            label: SHLINK_LABEL.to_string(),
            exp: expires_on,
            key: BASE64_URL.encode(key),
        };

        // Blob first, record second: a record must never point at a blob
        // that was not written.
        let documents = DocumentStore::new(self.storage);
        documents.put(&json_file, json_content.as_bytes())?;

        let record = StoredQrCode {
            id: id.clone(),
            manifest_id,
            json_file: json_file.clone(),
            key: link.key.clone(),
            flag,
            pass_code,
            expires_on,
            created_at: Utc::now(),
        };

        if let Err(e) = QrCodeRepository::new(self.storage).create(&record) {
            // Compensating cleanup so no orphan blob survives a failed issuance.
            if let Err(cleanup) = documents.delete(&json_file) {
                tracing::warn!(%id, error = %cleanup, "orphan document cleanup failed");
            }
            return Err(e.into());
        }

        let payload = CertificatePayload {
            iss: self.config.country_code.clone(),
            iat: Utc::now().timestamp_millis(),
            exp: CertificatePayload::effective_expiry(expires_on),
            health_certificate: HealthCertificate {
                health_links: vec![SmartHealthLink {
                    sh_link: link.to_uri()?,
                }],
            },
        };

        let payload_json = serde_json::to_vec(&payload)?;
        let envelope = cose::sign_envelope(&payload_json, self.signer, &self.config.dsc_key_id)?;
        let compressed = codec::compress(&envelope)?;
        let encoded = codec::text_encode(&compressed);

        tracing::info!(id = %record.id, flag = ?flag, "issued credential");
        Ok(codec::attach_prefix(&encoded))
    }
}

fn random_bytes() -> [u8; 32] {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hcert::codec::{decompress, strip_prefix, text_decode};
    use crate::hcert::cose::{extract_key_id, parse_envelope, payload_bytes};
    use crate::hcert::payload::NO_EXPIRY_SECONDS;
    use crate::storage::StoragePaths;
    use std::env;
    use std::fs;

    fn test_config() -> AppConfig {
        AppConfig {
            base_url: "https://gateway.example".to_string(),
            country_code: "XA".to_string(),
            dsc_key_path: "/tmp/unused.pem".to_string(),
            dsc_key_id: "dsc-001".to_string(),
            trust_network_url: "https://tng.example.int".to_string(),
            manifest_ttl_minutes: 5,
        }
    }

    fn test_storage() -> FileStore {
        let dir = env::temp_dir().join(format!("test-encoder-{}", Uuid::new_v4()));
        let mut storage = FileStore::new(StoragePaths::new(&dir));
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &FileStore) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    fn decode_payload(credential: &str) -> CertificatePayload {
        let encoded = strip_prefix(credential).unwrap();
        let compressed = text_decode(encoded).unwrap();
        let envelope_bytes = decompress(&compressed).unwrap();
        let envelope = parse_envelope(&envelope_bytes).unwrap();
        serde_json::from_slice(&payload_bytes(&envelope).unwrap()).unwrap()
    }

    #[test]
    fn unprotected_issuance_builds_direct_link() {
        let config = test_config();
        let storage = test_storage();
        let signer = SigningKey::random(&mut OsRng);
        let encoder = CredentialEncoder::new(&config, &storage, &signer);

        let credential = encoder
            .issue("{\"resourceType\":\"Bundle\"}", None, None)
            .unwrap();
        assert!(credential.starts_with("HC1:"));

        let payload = decode_payload(&credential);
        assert_eq!(payload.iss, "XA");
        assert_eq!(payload.exp, NO_EXPIRY_SECONDS);

        let link =
            SHLinkContent::from_uri(&payload.health_certificate.health_links[0].sh_link).unwrap();
        assert_eq!(link.flag, AccessFlag::U);
        assert_eq!(link.label, SHLINK_LABEL);
        assert!(link.url.starts_with("https://gateway.example/v2/ips-json/"));

        // The record backs the manifest id embedded in the link URL.
        let manifest_id = link.url.rsplit('/').next().unwrap();
        let record = QrCodeRepository::new(&storage)
            .find_by_manifest_id(manifest_id)
            .unwrap();
        assert_eq!(record.flag, AccessFlag::U);
        assert!(record.pass_code.is_none());

        let stored = DocumentStore::new(&storage).get(&record.json_file).unwrap();
        assert_eq!(stored, b"{\"resourceType\":\"Bundle\"}");

        cleanup(&storage);
    }

    #[test]
    fn protected_issuance_targets_manifest_endpoint() {
        let config = test_config();
        let storage = test_storage();
        let signer = SigningKey::random(&mut OsRng);
        let encoder = CredentialEncoder::new(&config, &storage, &signer);

        let credential = encoder
            .issue("{}", Some("secret123".to_string()), None)
            .unwrap();

        let payload = decode_payload(&credential);
        let link =
            SHLinkContent::from_uri(&payload.health_certificate.health_links[0].sh_link).unwrap();
        assert_eq!(link.flag, AccessFlag::P);
        assert!(link.url.starts_with("https://gateway.example/v2/manifests/"));

        let manifest_id = link.url.rsplit('/').next().unwrap();
        let record = QrCodeRepository::new(&storage)
            .find_by_manifest_id(manifest_id)
            .unwrap();
        assert_eq!(record.pass_code.as_deref(), Some("secret123"));

        cleanup(&storage);
    }

    #[test]
    fn empty_passcode_is_treated_as_unprotected() {
        let config = test_config();
        let storage = test_storage();
        let signer = SigningKey::random(&mut OsRng);
        let encoder = CredentialEncoder::new(&config, &storage, &signer);

        let credential = encoder.issue("{}", Some(String::new()), None).unwrap();
        let payload = decode_payload(&credential);
        let link =
            SHLinkContent::from_uri(&payload.health_certificate.health_links[0].sh_link).unwrap();
        assert_eq!(link.flag, AccessFlag::U);

        cleanup(&storage);
    }

    #[test]
    fn supplied_expiry_lands_in_both_layers() {
        let config = test_config();
        let storage = test_storage();
        let signer = SigningKey::random(&mut OsRng);
        let encoder = CredentialEncoder::new(&config, &storage, &signer);

        let expires_on = 1_745_589_915_953;
        let credential = encoder.issue("{}", None, Some(expires_on)).unwrap();

        let payload = decode_payload(&credential);
        assert_eq!(payload.exp, expires_on / 1000);

        let link =
            SHLinkContent::from_uri(&payload.health_certificate.health_links[0].sh_link).unwrap();
        assert_eq!(link.exp, Some(expires_on));

        cleanup(&storage);
    }

    #[test]
    fn envelope_carries_configured_key_id() {
        let config = test_config();
        let storage = test_storage();
        let signer = SigningKey::random(&mut OsRng);
        let encoder = CredentialEncoder::new(&config, &storage, &signer);

        let credential = encoder.issue("{}", None, None).unwrap();
        let encoded = strip_prefix(&credential).unwrap();
        let envelope_bytes = decompress(&text_decode(encoded).unwrap()).unwrap();
        let envelope = parse_envelope(&envelope_bytes).unwrap();
        assert_eq!(extract_key_id(&envelope).unwrap(), "dsc-001");

        cleanup(&storage);
    }
}
