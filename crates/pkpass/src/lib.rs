pub mod bundle;
pub mod config;
pub mod crypto;
pub mod delivery;
pub mod error;
pub mod generator;
pub mod pass;
pub mod readiness;
pub mod store;

pub use bundle::{create_pkpass, CompressionLevel, Manifest, ManifestBuilder};
pub use config::WalletConfig;
pub use crypto::{Signature, SignatureKind, Signer, SigningCredentials, SigningIdentity};
pub use delivery::{encode_pass, PKPASS_MIME_TYPE};
pub use error::Error;
pub use generator::{ErrorKind, GeneratedPass, GenerationResult, PassGenerator};
pub use pass::{AccountSnapshot, PassDescriptor, PassOverrides, PassTemplate, Violation};
pub use readiness::ReadinessReport;
pub use store::{PassStamp, PassStore};

pub type Result<T> = std::result::Result<T, Error>;
