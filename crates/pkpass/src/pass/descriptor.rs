//! The `pass.json` document of a store-card pass.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Wallet pass format version. The only version readers accept.
pub const FORMAT_VERSION: u8 = 1;

/// Logical content of a wallet pass, serialized verbatim as `pass.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDescriptor {
    pub format_version: u8,
    /// `pass.<TEAM_ID>.<suffix>`.
    pub pass_type_identifier: String,
    /// Unique per (user, generation). Regeneration issues a new serial.
    pub serial_number: String,
    pub team_identifier: String,
    pub organization_name: String,
    pub description: String,
    pub logo_text: String,
    pub foreground_color: String,
    pub background_color: String,
    pub label_color: String,
    pub store_card: PassStructure,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub barcodes: Vec<Barcode>,
    /// Reader bookkeeping. Covered by the manifest like the rest of the file.
    pub user_info: UserInfo,
}

impl PassDescriptor {
    /// Serializes to the exact bytes written as `pass.json`.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Every field of the store card, front then back.
    pub fn fields(&self) -> impl Iterator<Item = &PassField> {
        self.store_card.all_fields()
    }
}

/// Field groups of a store card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassStructure {
    #[serde(default)]
    pub primary_fields: Vec<PassField>,
    #[serde(default)]
    pub secondary_fields: Vec<PassField>,
    #[serde(default)]
    pub auxiliary_fields: Vec<PassField>,
    #[serde(default)]
    pub back_fields: Vec<PassField>,
}

impl PassStructure {
    pub fn all_fields(&self) -> impl Iterator<Item = &PassField> {
        self.primary_fields
            .iter()
            .chain(&self.secondary_fields)
            .chain(&self.auxiliary_fields)
            .chain(&self.back_fields)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassField {
    pub key: String,
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_alignment: Option<TextAlignment>,
}

impl PassField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: value.into(),
            text_alignment: None,
        }
    }

    #[must_use]
    pub fn aligned(mut self, alignment: TextAlignment) -> Self {
        self.text_alignment = Some(alignment);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlignment {
    #[serde(rename = "PKTextAlignmentLeft")]
    Left,
    #[serde(rename = "PKTextAlignmentCenter")]
    Center,
    #[serde(rename = "PKTextAlignmentRight")]
    Right,
    #[serde(rename = "PKTextAlignmentNatural")]
    Natural,
}

/// Scannable code shown on the front of the pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: String,
    pub message: String,
    pub message_encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Barcode {
    /// QR code in the encoding wallet readers expect.
    pub fn qr(message: impl Into<String>) -> Self {
        Self {
            format: "PKBarcodeFormatQR".into(),
            message: message.into(),
            message_encoding: "iso-8859-1".into(),
            alt_text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: u64,
    pub username: String,
    pub balance: f64,
}
