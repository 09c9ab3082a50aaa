//! PKCS#12 identity extraction.
//!
//! Exported signing identities carry their private key in one of two bag
//! types: `pkcs8ShroudedKeyBag` (encrypted, the Keychain default) or a plain
//! `keyBag`. Some exports also use PBES2 encryption that only OpenSSL
//! decodes. [`STRATEGIES`] lists one extractor per case and
//! [`extract_identity`] returns the first one that succeeds.

use crate::{Error, Result};
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;

/// PKCS#12 `keyBag` (unencrypted PrivateKeyInfo).
const KEY_BAG_OID: &str = "1.2.840.113549.1.12.10.1.1";

/// Private key plus every certificate found alongside it.
pub struct ExtractedIdentity {
    pub private_key: PKey<Private>,
    pub certificates: Vec<X509>,
    /// Name of the strategy that produced this identity.
    pub strategy: &'static str,
}

pub type ExtractionStrategy = fn(&[u8], &str) -> Result<ExtractedIdentity>;

/// Extractors in the order they are tried.
pub const STRATEGIES: &[(&str, ExtractionStrategy)] = &[
    ("pkcs8ShroudedKeyBag", shrouded_key_bag),
    ("keyBag", plain_key_bag),
    ("openssl", openssl_native),
];

/// Runs [`STRATEGIES`] in order and returns the first success.
///
/// # Errors
///
/// Returns [`Error::Certificate`] listing why each strategy failed.
pub fn extract_identity(data: &[u8], password: &str) -> Result<ExtractedIdentity> {
    let mut failures = Vec::with_capacity(STRATEGIES.len());
    for (name, strategy) in STRATEGIES {
        match strategy(data, password) {
            Ok(identity) => {
                tracing::debug!(strategy = name, "extracted private key from PKCS#12");
                return Ok(identity);
            }
            Err(e) => failures.push(format!("{name}: {e}")),
        }
    }
    Err(Error::Certificate(format!(
        "No usable private key in PKCS#12 ({})",
        failures.join("; ")
    )))
}

fn parse_pfx(data: &[u8], password: &str) -> Result<p12::PFX> {
    let pfx = p12::PFX::parse(data)
        .map_err(|e| Error::Certificate(format!("Failed to parse PKCS#12: {:?}", e)))?;
    // The bag decoder only verifies SHA-1 MACs. Anything else goes to OpenSSL.
    if let Some(mac_data) = &pfx.mac_data {
        if mac_data.mac.digest_algorithm != p12::AlgorithmIdentifier::Sha1 {
            return Err(Error::Certificate(format!(
                "unsupported PKCS#12 MAC digest {:?}",
                mac_data.mac.digest_algorithm
            )));
        }
    }
    if !pfx.verify_mac(password) {
        return Err(Error::InvalidPassword);
    }
    Ok(pfx)
}

fn pfx_certificates(pfx: &p12::PFX, password: &str) -> Result<Vec<X509>> {
    let ders = pfx
        .cert_x509_bags(password)
        .map_err(|e| Error::Certificate(format!("Failed to extract certs from PKCS#12: {:?}", e)))?;
    ders.iter()
        .map(|der| {
            X509::from_der(der)
                .map_err(|e| Error::Certificate(format!("Failed to parse certificate DER: {}", e)))
        })
        .collect()
}

fn shrouded_key_bag(data: &[u8], password: &str) -> Result<ExtractedIdentity> {
    let pfx = parse_pfx(data, password)?;
    let keys = pfx
        .key_bags(password)
        .map_err(|e| Error::Certificate(format!("Failed to extract keys from PKCS#12: {:?}", e)))?;
    let key_der = keys
        .first()
        .ok_or_else(|| Error::Certificate("No pkcs8ShroudedKeyBag in PKCS#12".into()))?;

    Ok(ExtractedIdentity {
        private_key: parse_private_key_info(key_der)?,
        certificates: pfx_certificates(&pfx, password)?,
        strategy: "pkcs8ShroudedKeyBag",
    })
}

fn plain_key_bag(data: &[u8], password: &str) -> Result<ExtractedIdentity> {
    let pfx = parse_pfx(data, password)?;
    let bags = pfx
        .bags(password)
        .map_err(|e| Error::Certificate(format!("Failed to read PKCS#12 bags: {:?}", e)))?;
    let key_der = bags
        .iter()
        .find_map(|bag| match &bag.bag {
            p12::SafeBagKind::OtherBagKind(other) if other.bag_id.to_string() == KEY_BAG_OID => {
                Some(other.bag_value.clone())
            }
            _ => None,
        })
        .ok_or_else(|| Error::Certificate("No keyBag in PKCS#12".into()))?;

    Ok(ExtractedIdentity {
        private_key: parse_private_key_info(&key_der)?,
        certificates: pfx_certificates(&pfx, password)?,
        strategy: "keyBag",
    })
}

fn openssl_native(data: &[u8], password: &str) -> Result<ExtractedIdentity> {
    let parsed = Pkcs12::from_der(data)
        .map_err(|e| Error::Certificate(format!("Invalid PKCS#12: {}", e)))?
        .parse2(password)
        .map_err(|e| Error::Certificate(format!("Failed to parse PKCS#12: {}", e)))?;

    let private_key = parsed
        .pkey
        .ok_or_else(|| Error::Certificate("No private key in PKCS#12".into()))?;

    let mut certificates: Vec<X509> = parsed.cert.into_iter().collect();
    if let Some(ca) = parsed.ca {
        certificates.extend(ca);
    }

    Ok(ExtractedIdentity {
        private_key,
        certificates,
        strategy: "openssl",
    })
}

/// Parses a PrivateKeyInfo, tolerating the explicit `[0]` wrapper a bag
/// value may still carry.
fn parse_private_key_info(der: &[u8]) -> Result<PKey<Private>> {
    if let Ok(key) = PKey::private_key_from_pkcs8(der) {
        return Ok(key);
    }
    if let Some(inner) = strip_context_tag(der) {
        if let Ok(key) = PKey::private_key_from_pkcs8(inner) {
            return Ok(key);
        }
    }
    PKey::private_key_from_der(der)
        .map_err(|e| Error::Certificate(format!("Failed to parse private key: {}", e)))
}

/// Content of a DER `[0]` constructed element.
fn strip_context_tag(der: &[u8]) -> Option<&[u8]> {
    let (&tag, rest) = der.split_first()?;
    if tag != 0xa0 {
        return None;
    }
    let (&first, rest) = rest.split_first()?;
    let (len, rest) = if first & 0x80 == 0 {
        (first as usize, rest)
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 || rest.len() < count {
            return None;
        }
        let len = rest[..count].iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
        (len, &rest[count..])
    };
    rest.get(..len)
}
