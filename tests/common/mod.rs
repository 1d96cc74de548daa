//! Common test utilities for all integration tests.
//!
//! Builds throwaway CAs on disk: a root certificate, an intermediate with its
//! signing key, an Ed25519 SSH CA key, and the JSON configuration the offline
//! backend loads.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use certplane::{OfflineConfig, SshSection};
use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose, SanType,
};
use ring::rand::SystemRandom;
use ring::signature::Ed25519KeyPair;
use std::path::PathBuf;
use tempfile::TempDir;

/// A complete offline CA laid out in a temporary directory
pub struct TestCa {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub root_path: PathBuf,
}

/// Build an offline CA with an SSH section
pub fn build_offline_ca() -> TestCa {
    build_offline_ca_with(true)
}

/// Build an offline CA, optionally without SSH material
pub fn build_offline_ca_with(ssh: bool) -> TestCa {
    let dir = TempDir::new().expect("create temp dir");

    let root_key = KeyPair::generate().expect("generate root key");
    let mut root_params = CertificateParams::default();
    root_params.distinguished_name.push(DnType::CommonName, "Certplane Test Root CA");
    root_params.is_ca = IsCa::Ca(BasicConstraints::Constrained(1));
    root_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    let root_cert = root_params.self_signed(&root_key).expect("self-sign root");

    let issuer_key = KeyPair::generate().expect("generate issuer key");
    let mut issuer_params = CertificateParams::default();
    issuer_params.distinguished_name.push(DnType::CommonName, "Certplane Test Issuing CA");
    issuer_params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
    issuer_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    let issuer_cert =
        issuer_params.signed_by(&issuer_key, &root_cert, &root_key).expect("sign intermediate");

    let root_path = dir.path().join("root_ca.crt");
    std::fs::write(&root_path, root_cert.pem()).expect("write root");
    std::fs::write(dir.path().join("intermediate_ca.crt"), issuer_cert.pem())
        .expect("write intermediate");
    std::fs::write(dir.path().join("intermediate_ca.key"), issuer_key.serialize_pem())
        .expect("write intermediate key");

    let ssh_section = ssh.then(|| {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).expect("generate ssh ca key");
        std::fs::write(dir.path().join("ssh_ca.key"), pem_wrap("PRIVATE KEY", pkcs8.as_ref()))
            .expect("write ssh ca key");
        SshSection { ca_key: Some(PathBuf::from("ssh_ca.key")), ..SshSection::default() }
    });

    let config = OfflineConfig {
        root: PathBuf::from("root_ca.crt"),
        crt: PathBuf::from("intermediate_ca.crt"),
        key: PathBuf::from("intermediate_ca.key"),
        ssh: ssh_section,
        revocation_path: None,
    };

    let config_path = dir.path().join("ca.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config).expect("encode config"))
        .expect("write config");

    TestCa { dir, config_path, root_path }
}

/// Generate a CSR for the given common name; returns the CSR PEM and the
/// subject key pair
pub fn leaf_csr(common_name: &str) -> (String, KeyPair) {
    let key = KeyPair::generate().expect("generate leaf key");
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.subject_alt_names.push(SanType::DnsName(
        common_name.to_string().try_into().expect("valid dns name"),
    ));

    let csr = params.serialize_request(&key).expect("serialize csr");
    (csr.pem().expect("encode csr"), key)
}

/// A subject SSH public key in authorized-keys format
pub fn subject_ssh_key_line(comment: &str) -> String {
    let rng = SystemRandom::new();
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).expect("generate subject key");
    let key = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).expect("parse subject key");

    use ring::signature::KeyPair as _;
    let raw = key.public_key().as_ref();

    let mut blob = Vec::new();
    let algo = b"ssh-ed25519";
    blob.extend_from_slice(&(algo.len() as u32).to_be_bytes());
    blob.extend_from_slice(algo);
    blob.extend_from_slice(&(raw.len() as u32).to_be_bytes());
    blob.extend_from_slice(raw);

    format!("ssh-ed25519 {} {}", BASE64.encode(&blob), comment)
}

/// Wrap DER bytes in a PEM envelope
pub fn pem_wrap(tag: &str, der: &[u8]) -> String {
    let encoded = BASE64.encode(der);
    let body = encoded
        .as_bytes()
        .chunks(64)
        .map(|chunk| std::str::from_utf8(chunk).expect("ascii"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("-----BEGIN {}-----\n{}\n-----END {}-----\n", tag, body, tag)
}
