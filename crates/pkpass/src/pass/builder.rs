//! Pass data builder: account state in, [`PassDescriptor`] out.

use super::descriptor::{
    Barcode, PassDescriptor, PassField, PassStructure, TextAlignment, UserInfo, FORMAT_VERSION,
};
use crate::store::PassStamp;
use crate::{Error, Result};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;

/// Balance at or above which a cardholder is shown as "Premium".
pub const PREMIUM_THRESHOLD: f64 = 69.0;

/// The account state a pass is rendered from.
///
/// Construction rejects balances that cannot be formatted as currency, so a
/// snapshot always holds a finite, non-negative amount.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    user_id: u64,
    username: String,
    balance: f64,
}

impl AccountSnapshot {
    /// # Errors
    ///
    /// Returns [`Error::InvalidBalance`] for NaN, infinite or negative balances.
    pub fn new(user_id: u64, username: impl Into<String>, balance: f64) -> Result<Self> {
        if !balance.is_finite() {
            return Err(Error::InvalidBalance(format!("{balance} is not a finite amount")));
        }
        if balance < 0.0 {
            return Err(Error::InvalidBalance(format!("{balance} is negative")));
        }
        Ok(Self {
            user_id,
            username: username.into(),
            balance: if balance == 0.0 { 0.0 } else { balance },
        })
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }
}

/// `"$" + balance` with two decimals.
///
/// Rounds on the exact binary value with half-cent ties going away from
/// zero, and never prints a negative zero.
pub fn format_balance(balance: f64) -> String {
    let balance = if balance == 0.0 { 0.0 } else { balance };
    // Exact half-cent ties are the odd multiples of 1/8.
    let eighths = balance * 8.0;
    if eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0 {
        let cents = (balance.abs() * 100.0).ceil().copysign(balance);
        return format!("${:.2}", cents / 100.0);
    }
    format!("${balance:.2}")
}

pub fn membership_tier(balance: f64) -> &'static str {
    if balance >= PREMIUM_THRESHOLD {
        "Premium"
    } else {
        "Standard"
    }
}

/// Deployment constants shared by every pass this service issues.
#[derive(Debug, Clone)]
pub struct PassTemplate {
    pub pass_type_identifier: String,
    pub team_identifier: String,
    pub organization_name: String,
    pub description: String,
    pub logo_text: String,
    pub foreground_color: String,
    pub background_color: String,
    pub label_color: String,
    /// Leading segment of every serial number.
    pub serial_prefix: String,
    pub support_contact: String,
}

impl PassTemplate {
    pub fn new(pass_type_identifier: impl Into<String>, team_identifier: impl Into<String>) -> Self {
        Self {
            pass_type_identifier: pass_type_identifier.into(),
            team_identifier: team_identifier.into(),
            organization_name: "Coffee Rewards".into(),
            description: "Coffee credit balance".into(),
            logo_text: "Coffee Credits".into(),
            foreground_color: "#FFFFFF".into(),
            background_color: "#3B2314".into(),
            label_color: "#E8D5B7".into(),
            serial_prefix: "COFFEE".into(),
            support_contact: "support@example.com".into(),
        }
    }

    /// Serial for `user_id` issued at `stamp`.
    pub fn serial_number(&self, user_id: u64, stamp: PassStamp) -> String {
        format!("{}-{}-{}", self.serial_prefix, user_id, stamp.millis())
    }

    /// Builds the descriptor for `account`.
    ///
    /// `stamp` fixes both the serial number and the "last updated" date, so
    /// two builds with distinct stamps never share a serial.
    pub fn build(&self, account: &AccountSnapshot, stamp: PassStamp) -> PassDescriptor {
        let serial_number = self.serial_number(account.user_id, stamp);
        let updated = DateTime::<Utc>::from_timestamp_millis(stamp.millis() as i64)
            .unwrap_or_else(Utc::now)
            .with_timezone(&Local)
            .format("%b %-d, %Y")
            .to_string();

        let store_card = PassStructure {
            primary_fields: vec![PassField::new(
                "balance",
                "BALANCE",
                format_balance(account.balance),
            )
            .aligned(TextAlignment::Center)],
            secondary_fields: vec![
                PassField::new("account", "ACCOUNT", account.username.as_str()),
                PassField::new("updated", "LAST UPDATED", updated),
            ],
            auxiliary_fields: vec![PassField::new(
                "tier",
                "MEMBERSHIP",
                membership_tier(account.balance),
            )],
            back_fields: vec![
                PassField::new(
                    "about",
                    "ABOUT",
                    "Credits on this card can be spent on any drink or food item in the app.",
                ),
                PassField::new(
                    "usage",
                    "HOW TO USE",
                    "Show the code on the front of this pass at the counter, or order ahead in the app.",
                ),
                PassField::new(
                    "premium",
                    "PREMIUM MEMBERSHIP",
                    format!(
                        "Keep a balance of {} or more to stay a Premium member.",
                        format_balance(PREMIUM_THRESHOLD)
                    ),
                ),
                PassField::new("support", "SUPPORT", self.support_contact.as_str()),
            ],
        };

        PassDescriptor {
            format_version: FORMAT_VERSION,
            pass_type_identifier: self.pass_type_identifier.clone(),
            serial_number: serial_number.clone(),
            team_identifier: self.team_identifier.clone(),
            organization_name: self.organization_name.clone(),
            description: self.description.clone(),
            logo_text: self.logo_text.clone(),
            foreground_color: self.foreground_color.clone(),
            background_color: self.background_color.clone(),
            label_color: self.label_color.clone(),
            store_card,
            barcodes: vec![Barcode::qr(serial_number)],
            user_info: UserInfo {
                user_id: account.user_id,
                username: account.username.clone(),
                balance: account.balance,
            },
        }
    }
}

/// Caller-supplied display overrides (the `passData` request object).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassOverrides {
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub logo_text: Option<String>,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
    pub label_color: Option<String>,
}

impl PassOverrides {
    /// Overwrites display metadata. Validation runs afterwards.
    pub fn apply(&self, pass: &mut PassDescriptor) {
        let targets = [
            (&self.organization_name, &mut pass.organization_name),
            (&self.description, &mut pass.description),
            (&self.logo_text, &mut pass.logo_text),
            (&self.foreground_color, &mut pass.foreground_color),
            (&self.background_color, &mut pass.background_color),
            (&self.label_color, &mut pass.label_color),
        ];
        for (value, target) in targets {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }
    }
}
