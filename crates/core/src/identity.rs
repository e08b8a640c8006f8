//! Identity - the raw PII submitted for screening
//!
//! An `Identity` is only held long enough to query the data sources.
//! Everywhere else the system refers to the person by [`Fingerprint`]
//! or by a masked display name.
//!
//! [`Fingerprint`]: crate::Fingerprint

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name, date of birth and last four SSN digits of a screened person.
///
/// `Debug` is redacted so the raw values never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Full name as submitted
    pub name: String,
    /// Date of birth (YYYY-MM-DD)
    pub dob: String,
    /// Last four digits of the SSN
    pub ssn_last4: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        dob: impl Into<String>,
        ssn_last4: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dob: dob.into(),
            ssn_last4: ssn_last4.into(),
        }
    }

    /// Fingerprint input: the three fields concatenated without separators
    pub fn digest_input(&self) -> String {
        format!("{}{}{}", self.name, self.dob, self.ssn_last4)
    }

    /// Masked display form of the name
    pub fn masked_name(&self) -> String {
        mask_name(&self.name)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.masked_name())
            .field("dob", &"****-**-**")
            .field("ssn_last4", &"****")
            .finish()
    }
}

/// Mask a full name down to initials.
///
/// `"Jane Q Public"` becomes `"J*** P***"`, a single word keeps only its
/// first initial.
pub fn mask_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let initial = |s: &str| s.chars().next().map(String::from).unwrap_or_default();

    match parts.as_slice() {
        [] => "***".to_string(),
        [only] => format!("{}***", initial(only)),
        [first, .., last] => format!("{}*** {}***", initial(first), initial(last)),
    }
}
