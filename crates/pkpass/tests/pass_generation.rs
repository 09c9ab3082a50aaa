//! End-to-end tests for the pass pipeline: generate, then open the produced
//! `.pkpass` and check what a wallet would check.
//!
//! Signing identities are minted on the fly with OpenSSL, so no external
//! certificate files are needed.

use base64::Engine;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use pkpass::bundle::{sha1_hex, REQUIRED_ASSETS};
use pkpass::crypto::is_placeholder_signature;
use pkpass::{
    AccountSnapshot, Error, GeneratedPass, Manifest, PassGenerator, PassOverrides, PassStore,
    PassTemplate, SignatureKind, SigningIdentity,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use tempfile::TempDir;
use zip::ZipArchive;

const TEAM_ID: &str = "ABCDE12345";
const PASS_TYPE_ID: &str = "pass.ABCDE12345.coffee";

fn make_identity(common_name: &str, ou: &str) -> (PKey<Private>, X509) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    name.append_entry_by_text("OU", ou).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&BigNum::from_u32(7).unwrap().to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (key, builder.build())
}

struct Fixture {
    _temp: TempDir,
    generator: PassGenerator,
    leaf: X509,
    intermediate: X509,
}

fn fixture(passphrase: &str) -> Fixture {
    let temp = TempDir::new().unwrap();
    let (key, leaf) = make_identity("Pass Type ID: pass.ABCDE12345.coffee", TEAM_ID);
    let (_, intermediate) = make_identity("Test Wallet Intermediate", "G4");

    let mut p12 = Pkcs12::builder();
    p12.name("pass").pkey(&key).cert(&leaf);
    let p12 = p12.build2("correct horse").unwrap().to_der().unwrap();

    let identity = SigningIdentity::production(p12, passphrase, intermediate.to_pem().unwrap());
    let generator = PassGenerator::new(
        PassTemplate::new(PASS_TYPE_ID, TEAM_ID),
        identity,
        PassStore::new(temp.path()),
    );
    Fixture {
        _temp: temp,
        generator,
        leaf,
        intermediate,
    }
}

fn unsigned_generator(temp: &TempDir) -> PassGenerator {
    PassGenerator::new(
        PassTemplate::new(PASS_TYPE_ID, TEAM_ID),
        SigningIdentity::DevelopmentPlaceholder,
        PassStore::new(temp.path()),
    )
}

/// Decodes the base64 payload and returns every entry by name.
fn unpack(pass: &GeneratedPass) -> BTreeMap<String, Vec<u8>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&pass.pass_base64)
        .unwrap();
    let mut archive = ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        entries.insert(file.name().to_string(), data);
    }
    entries
}

fn pass_json(entries: &BTreeMap<String, Vec<u8>>) -> serde_json::Value {
    serde_json::from_slice(&entries["pass.json"]).unwrap()
}

#[test]
fn test_archive_contains_exactly_the_bundle_files() {
    let temp = TempDir::new().unwrap();
    let account = AccountSnapshot::new(42, "alice", 75.50).unwrap();
    let pass = unsigned_generator(&temp).generate(&account, None).unwrap();

    let entries = unpack(&pass);
    let mut expected: Vec<&str> = vec!["manifest.json", "pass.json", "signature"];
    expected.extend(REQUIRED_ASSETS);
    expected.sort();
    let names: Vec<&str> = entries.keys().map(String::as_str).collect();
    assert_eq!(names, expected);
    assert!(names.iter().all(|n| !n.contains('/')));
}

#[test]
fn test_manifest_matches_archived_bytes() {
    let temp = TempDir::new().unwrap();
    let account = AccountSnapshot::new(9, "erin", 12.0).unwrap();
    let pass = unsigned_generator(&temp).generate(&account, None).unwrap();

    let entries = unpack(&pass);
    let manifest: Manifest = serde_json::from_slice(&entries["manifest.json"]).unwrap();
    assert_eq!(manifest, pass.manifest);
    assert_eq!(manifest.len(), entries.len() - 2);
    for name in manifest.files() {
        assert_eq!(manifest.get(name).unwrap(), sha1_hex(&entries[name]), "{name}");
    }
}

#[test]
fn test_alice_scenario() {
    let temp = TempDir::new().unwrap();
    let account = AccountSnapshot::new(42, "alice", 75.50).unwrap();
    let pass = unsigned_generator(&temp).generate(&account, None).unwrap();

    let json = pass_json(&unpack(&pass));
    let card = &json["storeCard"];
    assert_eq!(card["primaryFields"][0]["value"], "$75.50");
    assert_eq!(card["auxiliaryFields"][0]["value"], "Premium");
    assert_eq!(json["userInfo"]["userId"], 42);
    assert_eq!(json["userInfo"]["username"], "alice");
    assert!(json["serialNumber"].as_str().unwrap().starts_with("COFFEE-42-"));
    assert_eq!(json["barcodes"][0]["message"], json["serialNumber"]);
}

#[test]
fn test_zero_balance_scenario() {
    let temp = TempDir::new().unwrap();
    let account = AccountSnapshot::new(5, "zed", 0.0).unwrap();
    let pass = unsigned_generator(&temp).generate(&account, None).unwrap();

    let json = pass_json(&unpack(&pass));
    assert_eq!(json["storeCard"]["primaryFields"][0]["value"], "$0.00");
    assert_eq!(json["storeCard"]["auxiliaryFields"][0]["value"], "Standard");
}

#[test]
fn test_regeneration_changes_serial() {
    let temp = TempDir::new().unwrap();
    let generator = unsigned_generator(&temp);
    let account = AccountSnapshot::new(42, "alice", 75.50).unwrap();

    let first = generator.generate(&account, None).unwrap();
    let second = generator.generate(&account, None).unwrap();

    assert_ne!(first.serial_number, second.serial_number);
    assert_ne!(first.pass_id, second.pass_id);
    assert!(first.path.is_file());
    assert!(second.path.is_file());
}

#[test]
fn test_signed_pass_verifies() {
    let fx = fixture("correct horse");
    let account = AccountSnapshot::new(42, "alice", 75.50).unwrap();
    let pass = fx.generator.generate(&account, None).unwrap();
    assert_eq!(pass.signature, SignatureKind::Signed);

    let entries = unpack(&pass);
    let pkcs7 = Pkcs7::from_der(&entries["signature"]).unwrap();
    let mut certs = Stack::new().unwrap();
    certs.push(fx.leaf.clone()).unwrap();
    certs.push(fx.intermediate.clone()).unwrap();
    let store = X509StoreBuilder::new().unwrap().build();

    pkcs7
        .verify(
            &certs,
            &store,
            Some(entries["manifest.json"].as_slice()),
            None,
            Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
        )
        .unwrap();
}

#[test]
fn test_wrong_passphrase_still_produces_pass() {
    let fx = fixture("battery staple");
    let account = AccountSnapshot::new(42, "alice", 75.50).unwrap();
    let pass = fx.generator.generate(&account, None).unwrap();

    assert!(matches!(pass.signature, SignatureKind::Placeholder { .. }));
    let entries = unpack(&pass);
    assert!(is_placeholder_signature(&entries["signature"]));
    assert!(entries["signature"]
        .windows(40)
        .any(|w| w == sha1_hex(&entries["manifest.json"]).as_bytes()));
}

#[test]
fn test_invalid_override_is_rejected() {
    let temp = TempDir::new().unwrap();
    let account = AccountSnapshot::new(1, "bob", 3.0).unwrap();
    let overrides: PassOverrides =
        serde_json::from_str(r##"{"foregroundColor":"white","labelColor":"#ABCDEF"}"##).unwrap();

    let err = unsigned_generator(&temp)
        .generate(&account, Some(&overrides))
        .unwrap_err();
    match err {
        Error::Validation(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "foregroundColor");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_stored_pass_round_trips_through_store() {
    let temp = TempDir::new().unwrap();
    let generator = unsigned_generator(&temp);
    let account = AccountSnapshot::new(77, "gus", 1.25).unwrap();
    let pass = generator.generate(&account, None).unwrap();

    let stored = generator.store().open(&pass.pass_id).unwrap();
    let mut on_disk = Vec::new();
    File::open(&pass.path).unwrap().read_to_end(&mut on_disk).unwrap();
    assert_eq!(stored, on_disk);
}
