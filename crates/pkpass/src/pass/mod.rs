//! Pass content: the `pass.json` descriptor, its builder and its validator.
//!
//! The descriptor is built fresh for every (re)generation request from an
//! [`AccountSnapshot`] and a [`PassTemplate`], then checked by [`validate`]
//! before anything touches the filesystem.
//!
//! # Examples
//!
//! ```
//! use pkpass::pass::{validate, AccountSnapshot, PassTemplate};
//! use pkpass::PassStamp;
//!
//! let template = PassTemplate::new("pass.ABCDE12345.coffee", "ABCDE12345");
//! let account = AccountSnapshot::new(42, "alice", 75.50)?;
//! let pass = template.build(&account, PassStamp::from_millis(1_700_000_000_000));
//!
//! assert_eq!(pass.store_card.primary_fields[0].value, "$75.50");
//! assert!(validate(&pass).is_valid());
//! # Ok::<(), pkpass::Error>(())
//! ```

pub mod builder;
pub mod descriptor;
pub mod validate;

pub use builder::{
    format_balance, membership_tier, AccountSnapshot, PassOverrides, PassTemplate,
    PREMIUM_THRESHOLD,
};
pub use descriptor::{
    Barcode, PassDescriptor, PassField, PassStructure, TextAlignment, UserInfo,
};
pub use validate::{validate, ValidationReport, Violation};
