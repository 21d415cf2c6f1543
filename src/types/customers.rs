//! Customer records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Customer profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID
    pub id: String,
    /// External reference
    pub reference: Option<String>,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Company name
    pub company_name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Date of birth, `YYYY-MM-DD`
    pub dob: Option<String>,
    /// `M` or `F`
    pub gender: Option<String>,
    /// Address line 1
    pub address1: Option<String>,
    /// Address line 2
    pub address2: Option<String>,
    /// City
    pub city: Option<String>,
    /// ISO alpha-2 country code
    pub country: Option<String>,
    /// Postal code
    pub postal: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Customer group ID
    pub customer_group: Option<String>,
    /// Consent to email marketing
    pub marketing_consent_email: Option<bool>,
    /// Consent to text marketing
    pub marketing_consent_text: Option<bool>,
    /// Consent to phone marketing
    pub marketing_consent_phone: Option<bool>,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customer {
    /// First and last name joined by a space
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether an email or phone number is on file
    pub fn has_contact_info(&self) -> bool {
        self.email.as_deref().is_some_and(|s| !s.is_empty())
            || self.phone.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Whether any marketing consent was given
    pub fn has_any_marketing_consent(&self) -> bool {
        [
            self.marketing_consent_email,
            self.marketing_consent_text,
            self.marketing_consent_phone,
        ]
        .into_iter()
        .any(|c| c == Some(true))
    }
}

/// Customer group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerGroup {
    /// Customer group ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}
