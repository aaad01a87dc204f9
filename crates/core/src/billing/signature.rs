use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

const TIMESTAMP_KEY: &str = "t";
const SIGNATURE_SCHEME: &str = "v1";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing")]
    MissingHeader,
    #[error("signature header is malformed")]
    MalformedHeader,
    #[error("signature header carries no `v1` signatures")]
    NoSignatures,
    #[error("no signature matches the payload")]
    Mismatch,
    #[error("timestamp {timestamp} is outside the tolerance window (now {now})")]
    StaleTimestamp { timestamp: i64, now: i64 },
    #[error("signing secret is unusable")]
    InvalidSecret,
    #[error("payload is not a webhook event: {0}")]
    InvalidPayload(String),
}

impl SignatureError {
    /// Short label for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::MalformedHeader => "malformed_header",
            Self::NoSignatures => "no_signatures",
            Self::Mismatch => "signature_mismatch",
            Self::StaleTimestamp { .. } => "stale_timestamp",
            Self::InvalidSecret => "invalid_secret",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WebhookEventData {
    #[serde(default)]
    pub object: Value,
}

/// Checks `stripe-signature` headers against the endpoint signing secret.
#[derive(Clone, Debug)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance_secs: u64,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString, tolerance_secs: u64) -> Self {
        Self { secret, tolerance_secs }
    }

    pub fn verify(
        &self,
        payload: &[u8],
        header: Option<&str>,
    ) -> Result<WebhookEvent, SignatureError> {
        self.verify_at(payload, header, Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: i64,
    ) -> Result<WebhookEvent, SignatureError> {
        let header = header.map(str::trim).filter(|value| !value.is_empty());
        let header = header.ok_or(SignatureError::MissingHeader)?;
        let (timestamp, signatures) = parse_header(header)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|expected| mac.clone().verify_slice(&expected).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            return Err(SignatureError::Mismatch);
        }

        if now.abs_diff(timestamp) > self.tolerance_secs {
            return Err(SignatureError::StaleTimestamp { timestamp, now });
        }

        serde_json::from_slice::<WebhookEvent>(payload)
            .map_err(|error| SignatureError::InvalidPayload(error.to_string()))
    }
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            TIMESTAMP_KEY => {
                timestamp =
                    Some(value.trim().parse::<i64>().map_err(|_| SignatureError::MalformedHeader)?);
            }
            SIGNATURE_SCHEME => signatures.push(value.trim()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::NoSignatures);
    }
    Ok((timestamp, signatures))
}

/// Computes the hex `v1` signature Stripe would send for `payload` at `timestamp`.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
