//! AWS Signature Version 4 for S3-compatible object stores.
//!
//! Only what a single-object PUT/GET needs: header-based auth, no query
//! string parameters, payload hashed up front.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{PersistenceError, PersistenceResult};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// A request ready to be signed. Header names must be lowercase.
pub struct SigningRequest<'a> {
    pub method: &'a str,
    /// Already URI-encoded absolute path
    pub canonical_uri: &'a str,
    pub headers: Vec<(String, String)>,
    pub payload_sha256: String,
}

pub struct Signer<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
}

impl Signer<'_> {
    /// Value for the `Authorization` header.
    pub fn authorization(
        &self,
        request: &SigningRequest<'_>,
        at: DateTime<Utc>,
    ) -> PersistenceResult<String> {
        let amz_date = amz_date(at);
        let date = &amz_date[..8];
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);

        let (canonical, signed_headers) = canonical_request(request);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            sha256_hex(canonical.as_bytes())
        );

        let key = signing_key(
            &self.credentials.secret_access_key,
            date,
            self.region,
            self.service,
        )?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.credentials.access_key_id, scope, signed_headers, signature
        ))
    }
}

/// `YYYYMMDD'T'HHMMSS'Z'`
pub fn amz_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Returns the canonical request and the signed-headers list.
pub fn canonical_request(request: &SigningRequest<'_>) -> (String, String) {
    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        request.method, request.canonical_uri, canonical_headers, signed_headers, request.payload_sha256
    );
    (canonical, signed_headers)
}

pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> PersistenceResult<Vec<u8>> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> PersistenceResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| PersistenceError::Signing(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Percent-encode one path segment per the SigV4 rules (RFC 3986 unreserved
/// characters pass through).
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
