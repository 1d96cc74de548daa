//! OpenSSH certificate issuance for the offline backend.
//!
//! Implements the `ssh-ed25519-cert-v01@openssh.com` wire format: the
//! certificate blob is assembled field by field (RFC 4251 string/uint
//! encoding), signed with the CA's Ed25519 key, and returned as a single
//! authorized-keys style line.

use crate::api::{SignSshRequest, SshCertType};
use crate::errors::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{Ed25519KeyPair, KeyPair as _};

const ED25519_KEY_TYPE: &str = "ssh-ed25519";
const ED25519_CERT_TYPE: &str = "ssh-ed25519-cert-v01@openssh.com";

const SSH_CERT_TYPE_USER: u32 = 1;
const SSH_CERT_TYPE_HOST: u32 = 2;

/// Default validity for user certificates (16 hours)
const DEFAULT_USER_TTL_SECS: u64 = 16 * 3600;

/// Default validity for host certificates (30 days)
const DEFAULT_HOST_TTL_SECS: u64 = 30 * 24 * 3600;

/// Backdate to tolerate clock skew between signer and verifier
const CLOCK_SKEW_SECS: u64 = 60;

/// Extensions OpenSSH grants user certificates by default
const USER_EXTENSIONS: [&str; 5] = [
    "permit-X11-forwarding",
    "permit-agent-forwarding",
    "permit-port-forwarding",
    "permit-pty",
    "permit-user-rc",
];

/// Sign an OpenSSH certificate for the subject key in `request` using the
/// CA's Ed25519 signing key. Returns the certificate as an authorized-keys
/// style line (`type base64 key-id`).
pub(crate) fn sign_certificate(ca_key: &Ed25519KeyPair, request: &SignSshRequest) -> Result<String> {
    let subject_key = parse_ed25519_public_key(&request.public_key)?;

    let rng = SystemRandom::new();
    let mut nonce = [0u8; 32];
    rng.fill(&mut nonce)
        .map_err(|_| Error::issuance("failed to generate certificate nonce"))?;
    let mut serial_bytes = [0u8; 8];
    rng.fill(&mut serial_bytes)
        .map_err(|_| Error::issuance("failed to generate certificate serial"))?;
    let serial = u64::from_be_bytes(serial_bytes);

    let (cert_type, default_ttl) = match request.cert_type {
        SshCertType::User => (SSH_CERT_TYPE_USER, DEFAULT_USER_TTL_SECS),
        SshCertType::Host => (SSH_CERT_TYPE_HOST, DEFAULT_HOST_TTL_SECS),
    };

    let now = Utc::now();
    let valid_after = request
        .valid_after
        .map(to_unix_secs)
        .unwrap_or_else(|| to_unix_secs(now).saturating_sub(CLOCK_SKEW_SECS));
    let valid_before = request
        .valid_before
        .map(to_unix_secs)
        .unwrap_or_else(|| to_unix_secs(now) + default_ttl);

    if valid_before <= valid_after {
        return Err(Error::issuance("requested validity window is empty"));
    }

    let mut blob = Vec::new();
    put_string(&mut blob, ED25519_CERT_TYPE.as_bytes());
    put_string(&mut blob, &nonce);
    put_string(&mut blob, &subject_key);
    put_u64(&mut blob, serial);
    put_u32(&mut blob, cert_type);
    put_string(&mut blob, request.key_id.as_bytes());
    put_string(&mut blob, &encode_principals(&request.principals));
    put_u64(&mut blob, valid_after);
    put_u64(&mut blob, valid_before);
    // critical options: none
    put_string(&mut blob, &[]);
    let extensions = match request.cert_type {
        SshCertType::User => encode_extensions(&USER_EXTENSIONS),
        SshCertType::Host => Vec::new(),
    };
    put_string(&mut blob, &extensions);
    // reserved
    put_string(&mut blob, &[]);
    put_string(&mut blob, &encode_public_key_blob(ca_key.public_key().as_ref()));

    let signature = ca_key.sign(&blob);
    let mut sig_blob = Vec::new();
    put_string(&mut sig_blob, ED25519_KEY_TYPE.as_bytes());
    put_string(&mut sig_blob, signature.as_ref());
    put_string(&mut blob, &sig_blob);

    Ok(format!("{} {} {}", ED25519_CERT_TYPE, BASE64.encode(&blob), request.key_id))
}

/// Render an Ed25519 CA signing key as an authorized-keys line so it can be
/// published alongside explicitly configured CA public keys.
pub(crate) fn public_key_line(key: &Ed25519KeyPair, comment: &str) -> String {
    let blob = encode_public_key_blob(key.public_key().as_ref());
    format!("{} {} {}", ED25519_KEY_TYPE, BASE64.encode(&blob), comment)
}

/// Parse an `ssh-ed25519 AAAA... comment` line into the raw 32-byte key
fn parse_ed25519_public_key(line: &str) -> Result<Vec<u8>> {
    let mut parts = line.split_whitespace();
    let algorithm = parts
        .next()
        .ok_or_else(|| Error::issuance("empty SSH public key"))?;
    if algorithm != ED25519_KEY_TYPE {
        return Err(Error::issuance(format!(
            "unsupported SSH key type '{}', expected {}",
            algorithm, ED25519_KEY_TYPE
        )));
    }

    let encoded = parts
        .next()
        .ok_or_else(|| Error::issuance("SSH public key is missing its base64 body"))?;
    let blob = BASE64
        .decode(encoded)
        .map_err(|e| Error::issuance(format!("invalid SSH public key encoding: {}", e)))?;

    let mut reader = &blob[..];
    let inner_type = take_string(&mut reader)
        .ok_or_else(|| Error::issuance("truncated SSH public key blob"))?;
    if inner_type != ED25519_KEY_TYPE.as_bytes() {
        return Err(Error::issuance("SSH public key blob does not match its declared type"));
    }

    let key = take_string(&mut reader)
        .ok_or_else(|| Error::issuance("truncated SSH public key blob"))?;
    if key.len() != 32 {
        return Err(Error::issuance(format!(
            "unexpected Ed25519 public key length: {}",
            key.len()
        )));
    }

    Ok(key)
}

fn encode_public_key_blob(raw: &[u8]) -> Vec<u8> {
    let mut blob = Vec::new();
    put_string(&mut blob, ED25519_KEY_TYPE.as_bytes());
    put_string(&mut blob, raw);
    blob
}

fn encode_principals(principals: &[String]) -> Vec<u8> {
    let mut blob = Vec::new();
    for principal in principals {
        put_string(&mut blob, principal.as_bytes());
    }
    blob
}

fn encode_extensions(names: &[&str]) -> Vec<u8> {
    let mut blob = Vec::new();
    for name in names {
        put_string(&mut blob, name.as_bytes());
        // extension data: empty string
        put_string(&mut blob, &[]);
    }
    blob
}

fn to_unix_secs(dt: DateTime<Utc>) -> u64 {
    dt.timestamp().max(0) as u64
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn put_string(buf: &mut Vec<u8>, value: &[u8]) {
    put_u32(buf, value.len() as u32);
    buf.extend_from_slice(value);
}

fn take_string<'a>(reader: &mut &'a [u8]) -> Option<Vec<u8>> {
    let len = take_u32(reader)? as usize;
    if reader.len() < len {
        return None;
    }
    let (value, rest) = reader.split_at(len);
    *reader = rest;
    Some(value.to_vec())
}

fn take_u32(reader: &mut &[u8]) -> Option<u32> {
    if reader.len() < 4 {
        return None;
    }
    let (bytes, rest) = reader.split_at(4);
    *reader = rest;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}
