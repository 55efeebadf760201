// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and the configuration
//! loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `BASE_URL` | Public base URL embedded in generated links | `http://localhost:8080` |
//! | `COUNTRY_CODE` | Issuer country code (`iss` claim) | Required for production |
//! | `DSC_PRIVATE_KEY_PATH` | Path to the PEM document-signer key | Required for production |
//! | `DSC_KEY_ID` | Key id placed in the COSE protected header | Required for production |
//! | `TRUST_NETWORK_URL` | Trust network base URL | Required for production |
//! | `MANIFEST_TTL_MINUTES` | TTL of single-use retrieval identities | `5` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;

/// Environment variable name for the persistent data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the public base URL.
pub const BASE_URL_ENV: &str = "BASE_URL";

/// Environment variable name for the issuer country code.
pub const COUNTRY_CODE_ENV: &str = "COUNTRY_CODE";

/// Environment variable name for the document-signer private key path.
pub const DSC_PRIVATE_KEY_PATH_ENV: &str = "DSC_PRIVATE_KEY_PATH";

/// Environment variable name for the signing key id.
pub const DSC_KEY_ID_ENV: &str = "DSC_KEY_ID";

/// Environment variable name for the trust network base URL.
pub const TRUST_NETWORK_URL_ENV: &str = "TRUST_NETWORK_URL";

/// Environment variable name for the retrieval identity TTL (minutes).
pub const MANIFEST_TTL_MINUTES_ENV: &str = "MANIFEST_TTL_MINUTES";

/// Runtime configuration values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Public base URL embedded in generated retrieval links
    pub base_url: String,
    /// Issuer country code, used as the credential `iss` claim
    pub country_code: String,
    /// Path to the PEM-encoded document-signer private key
    pub dsc_key_path: String,
    /// Key id placed in the COSE protected header
    pub dsc_key_id: String,
    /// Trust network base URL for certificate resolution
    pub trust_network_url: String,
    /// TTL of single-use retrieval identities, in minutes
    pub manifest_ttl_minutes: i64,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(BASE_URL_ENV)
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            country_code: env::var(COUNTRY_CODE_ENV).unwrap_or_else(|_| "XA".to_string()),
            dsc_key_path: env::var(DSC_PRIVATE_KEY_PATH_ENV)
                .unwrap_or_else(|_| "/etc/hcert-gateway/dsc.pem".to_string()),
            dsc_key_id: env::var(DSC_KEY_ID_ENV).unwrap_or_else(|_| "dsc-001".to_string()),
            trust_network_url: env::var(TRUST_NETWORK_URL_ENV)
                .unwrap_or_else(|_| "https://tng.example.int".to_string()),
            manifest_ttl_minutes: env::var(MANIFEST_TTL_MINUTES_ENV)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }

    /// Manifest endpoint URL for a manifest identifier.
    pub fn manifest_url(&self, manifest_id: &str) -> String {
        format!("{}/v2/manifests/{manifest_id}", self.base_url)
    }

    /// Direct JSON endpoint URL for a manifest or retrieval identifier.
    pub fn ips_json_url(&self, id: &str) -> String {
        format!("{}/v2/ips-json/{id}", self.base_url)
    }
}
