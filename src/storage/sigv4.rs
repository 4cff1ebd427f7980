//! AWS Signature Version 4 for S3-compatible object stores.
//!
//! Supports query-string presigning and `Authorization` header signing.
//! Only the `s3` service is signed.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const SERVICE: &str = "s3";

#[derive(Debug, Error)]
#[error("could not initialise HMAC with the signing key")]
pub struct SigningError;

/// The request line being signed. `path` is the raw object path starting
/// with `/`; it is URI-encoded here.
#[derive(Debug, Clone, Copy)]
pub struct SignTarget<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct Signer<'a> {
    access_key_id: &'a str,
    secret_access_key: &'a str,
    region: &'a str,
}

impl<'a> Signer<'a> {
    pub fn new(access_key_id: &'a str, secret_access_key: &'a str, region: &'a str) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            region,
        }
    }

    /// Builds the full presigned query string (including `X-Amz-Signature`).
    ///
    /// `extra_query` is signed as part of the query, `headers` are signed as
    /// headers the client must send verbatim. `host` is always signed.
    pub fn presigned_query(
        &self,
        target: SignTarget<'_>,
        extra_query: &[(&str, &str)],
        headers: &[(&str, &str)],
        expires_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<String, SigningError> {
        let headers = with_host(target.host, headers);
        let credential = format!("{}/{}", self.access_key_id, self.scope(now));
        let expires = expires_seconds.to_string();
        let amz_date = amz_date(now);
        let signed_headers = signed_header_names(&headers);

        let mut query: Vec<(&str, &str)> = vec![
            ("X-Amz-Algorithm", ALGORITHM),
            ("X-Amz-Credential", &credential),
            ("X-Amz-Date", &amz_date),
            ("X-Amz-Expires", &expires),
            ("X-Amz-SignedHeaders", &signed_headers),
        ];
        query.extend_from_slice(extra_query);
        let canonical_query = canonical_query_string(&query);

        let canonical_request = canonical_request(
            target,
            &canonical_query,
            &headers,
            &signed_headers,
            UNSIGNED_PAYLOAD,
        );
        let signature = self.sign(now, &canonical_request)?;

        Ok(format!("{}&X-Amz-Signature={}", canonical_query, signature))
    }

    /// Value of the `Authorization` header for a header-signed request.
    ///
    /// `headers` must contain every header to sign except `host`, including
    /// `x-amz-date` and `x-amz-content-sha256`.
    pub fn authorization(
        &self,
        target: SignTarget<'_>,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<String, SigningError> {
        let headers = with_host(target.host, headers);
        let signed_headers = signed_header_names(&headers);
        let canonical_request = canonical_request(
            target,
            &canonical_query_string(query),
            &headers,
            &signed_headers,
            payload_hash,
        );
        let signature = self.sign(now, &canonical_request)?;

        Ok(format!(
            "{} Credential={}/{},SignedHeaders={},Signature={}",
            ALGORITHM,
            self.access_key_id,
            self.scope(now),
            signed_headers,
            signature
        ))
    }

    fn scope(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            date_stamp(now),
            self.region,
            SERVICE
        )
    }

    fn sign(&self, now: DateTime<Utc>, canonical_request: &str) -> Result<String, SigningError> {
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date(now),
            self.scope(now),
            hex_sha256(canonical_request.as_bytes())
        );

        let secret = format!("AWS4{}", self.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), &date_stamp(now))?;
        let k_region = hmac_sha256(&k_date, self.region)?;
        let k_service = hmac_sha256(&k_region, SERVICE)?;
        let k_signing = hmac_sha256(&k_service, "aws4_request")?;

        Ok(hex::encode(hmac_sha256(&k_signing, &string_to_sign)?))
    }
}

/// `YYYYMMDDTHHMMSSZ`
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

fn date_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

pub fn hex_sha256(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError)?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// RFC 3986 encoding as SigV4 expects: unreserved characters pass through,
/// everything else is `%XX` with uppercase hex. `/` is kept when
/// `encode_slash` is false.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

fn with_host(host: &str, headers: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut all: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(name, _)| name != "host")
        .collect();
    all.push(("host".to_string(), host.to_string()));
    all.sort_by(|a, b| a.0.cmp(&b.0));
    all
}

fn signed_header_names(headers: &[(String, String)]) -> String {
    headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

fn canonical_query_string(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (uri_encode(key, true), uri_encode(value, true)))
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_request(
    target: SignTarget<'_>,
    canonical_query: &str,
    headers: &[(String, String)],
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        target.method,
        uri_encode(target.path, false),
        canonical_query,
        canonical_headers,
        signed_headers,
        payload_hash
    )
}
