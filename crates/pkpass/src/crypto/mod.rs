pub mod identity;
pub mod pkcs12;
pub mod signer;
#[cfg(test)]
pub(crate) mod test_support;

pub use identity::{IdentitySummary, SigningCredentials, SigningIdentity};
pub use signer::{is_placeholder_signature, Signature, SignatureKind, Signer, PLACEHOLDER_MARKER};
