//! End-to-end lifecycle operations against an offline CA built in a temp
//! directory: sign, renew from a transport identity, revoke, and the SSH
//! distribution surface.

mod common;

use certplane::api::{RevokeRequest, SignRequest, SignSshRequest, SshCertType, SshConfigRequest};
use certplane::{CaClient, Error, OfflineCaClient, Transport, TransportConfig};
use rustls::pki_types::{pem::PemObject, CertificateDer};
use x509_parser::prelude::*;

fn sign_request(csr: String) -> SignRequest {
    SignRequest { csr, token: None, not_before: None, not_after: None }
}

fn leaf_der(pem: &str) -> Vec<u8> {
    CertificateDer::pem_slice_iter(pem.as_bytes()).next().unwrap().unwrap().to_vec()
}

#[tokio::test]
async fn sign_then_renew_preserves_subject() {
    let ca = common::build_offline_ca();
    let client = OfflineCaClient::load(&ca.config_path).unwrap();

    let (csr, leaf_key) = common::leaf_csr("svc.internal.example.com");
    let issued = client.sign(&sign_request(csr)).await.unwrap();

    // renew using the issued certificate and its key as the transport identity
    let bundle = format!("{}\n{}", issued.certificate, leaf_key.serialize_pem());
    let transport = Transport::new(TransportConfig {
        identity_pem: Some(bundle.into_bytes()),
        ..TransportConfig::default()
    })
    .unwrap();

    let renewed = client.renew(&transport).await.unwrap();
    assert_ne!(renewed.certificate, issued.certificate);
    assert_eq!(renewed.certificate_chain.len(), 2);

    let der = leaf_der(&renewed.certificate);
    let (_, cert) = X509Certificate::from_der(&der).unwrap();
    let cn = cert.subject().iter_common_name().next().unwrap().as_str().unwrap();
    assert_eq!(cn, "svc.internal.example.com");

    let mut dns_names = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                if let GeneralName::DNSName(dns) = name {
                    dns_names.push(dns.to_string());
                }
            }
        }
    }
    assert_eq!(dns_names, vec!["svc.internal.example.com".to_string()]);
}

#[tokio::test]
async fn revoked_certificate_is_not_renewable() {
    let ca = common::build_offline_ca();
    let client = OfflineCaClient::load(&ca.config_path).unwrap();

    let (csr, leaf_key) = common::leaf_csr("doomed.internal");
    let issued = client.sign(&sign_request(csr)).await.unwrap();

    let der = leaf_der(&issued.certificate);
    let (_, cert) = X509Certificate::from_der(&der).unwrap();
    let serial = format!("{:x}", cert.serial);

    let transport = Transport::new(TransportConfig::default()).unwrap();
    let revoke = RevokeRequest {
        serial: serial.clone(),
        reason: Some("superseded".to_string()),
        reason_code: Some(4),
        token: None,
    };
    client.revoke(&revoke, &transport).await.unwrap();

    let bundle = format!("{}\n{}", issued.certificate, leaf_key.serialize_pem());
    let identity_transport = Transport::new(TransportConfig {
        identity_pem: Some(bundle.into_bytes()),
        ..TransportConfig::default()
    })
    .unwrap();

    let err = client.renew(&identity_transport).await.unwrap_err();
    assert!(matches!(err, Error::Renewal { .. }));
    assert!(err.to_string().contains("revoked"));
}

#[tokio::test]
async fn concurrent_revocations_serialize_without_corruption() {
    let ca = common::build_offline_ca();
    let client = std::sync::Arc::new(OfflineCaClient::load(&ca.config_path).unwrap());
    let transport = Transport::new(TransportConfig::default()).unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        let transport = transport.clone();
        handles.push(tokio::spawn(async move {
            let request = RevokeRequest {
                serial: format!("{:02x}", i),
                reason: None,
                reason_code: None,
                token: None,
            };
            client.revoke(&request, &transport).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let raw = std::fs::read_to_string(ca.dir.path().join("revoked_serials.json")).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn ssh_certificate_issuance_round_trip() {
    let ca = common::build_offline_ca();
    let client = OfflineCaClient::load(&ca.config_path).unwrap();

    let request = SignSshRequest {
        public_key: common::subject_ssh_key_line("alice@laptop"),
        cert_type: SshCertType::User,
        key_id: "alice".to_string(),
        principals: vec!["alice".to_string()],
        valid_after: None,
        valid_before: None,
        token: None,
    };

    let response = client.sign_ssh(&request).await.unwrap();
    assert!(response.certificate.starts_with("ssh-ed25519-cert-v01@openssh.com "));
    assert!(response.certificate.ends_with(" alice"));

    // the CA key that signed it is the one published for distribution
    let keys = client.ssh_keys().await.unwrap();
    assert_eq!(keys.user_keys.len(), 1);
    assert!(keys.user_keys[0].starts_with("ssh-ed25519 "));
}

#[tokio::test]
async fn ssh_config_serves_configured_snippets() {
    let ca = common::build_offline_ca();

    // add snippet files and point the config at them
    std::fs::write(ca.dir.path().join("sshd_config.tpl"), "TrustedUserCAKeys /etc/ssh/ca.pub\n")
        .unwrap();
    let mut config: certplane::OfflineConfig =
        serde_json::from_str(&std::fs::read_to_string(&ca.config_path).unwrap()).unwrap();
    if let Some(ssh) = config.ssh.as_mut() {
        ssh.host_configs.push("sshd_config.tpl".into());
    }
    std::fs::write(&ca.config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let client = OfflineCaClient::load(&ca.config_path).unwrap();

    let host = client
        .ssh_config(&SshConfigRequest { cert_type: SshCertType::Host })
        .await
        .unwrap();
    assert_eq!(host.snippets.len(), 1);
    assert_eq!(host.snippets[0].name, "sshd_config.tpl");
    assert!(host.snippets[0].content.contains("TrustedUserCAKeys"));

    let user = client
        .ssh_config(&SshConfigRequest { cert_type: SshCertType::User })
        .await
        .unwrap();
    assert!(user.snippets.is_empty());
}
