//! Throwaway identities for crypto tests.

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

/// Self-signed RSA certificate with the given CN and OU.
pub(crate) fn test_identity(common_name: &str, team_id: &str) -> (PKey<Private>, X509) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name_builder = X509NameBuilder::new().unwrap();
    name_builder.append_entry_by_text("CN", common_name).unwrap();
    name_builder.append_entry_by_text("OU", team_id).unwrap();
    let name = name_builder.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap();
    builder.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (key, builder.build())
}

pub(crate) fn test_pkcs12(key: &PKey<Private>, cert: &X509, password: &str) -> Vec<u8> {
    let mut builder = Pkcs12::builder();
    builder.name("pass-signing").pkey(key).cert(cert);
    builder.build2(password).unwrap().to_der().unwrap()
}

/// Like [`test_pkcs12`] but with an explicit MAC digest.
pub(crate) fn test_pkcs12_with_mac(
    key: &PKey<Private>,
    cert: &X509,
    password: &str,
    mac: MessageDigest,
) -> Vec<u8> {
    let mut builder = Pkcs12::builder();
    builder.name("pass-signing").pkey(key).cert(cert).mac_md(mac);
    builder.build2(password).unwrap().to_der().unwrap()
}
