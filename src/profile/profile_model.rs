use serde::{Deserialize, Serialize};

use crate::profile::store::ProfileError;

// ============================================================================
// User profile, stored under the `userProfile` key
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub ssn: String,
    pub dob: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub voice_enabled: bool,
    pub large_text: bool,
    pub high_contrast: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            voice_enabled: true,
            large_text: false,
            high_contrast: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub personal_info: PersonalInfo,
    pub preferences: Preferences,
}

/// Named personal-information attribute a form field can be filled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileAttribute {
    FirstName,
    LastName,
    Ssn,
    Dob,
    Address,
    City,
    State,
    Zip,
    Phone,
    Email,
}

impl ProfileAttribute {
    pub const ALL: [ProfileAttribute; 10] = [
        ProfileAttribute::FirstName,
        ProfileAttribute::LastName,
        ProfileAttribute::Ssn,
        ProfileAttribute::Dob,
        ProfileAttribute::Address,
        ProfileAttribute::City,
        ProfileAttribute::State,
        ProfileAttribute::Zip,
        ProfileAttribute::Phone,
        ProfileAttribute::Email,
    ];

    /// Storage key, as it appears in the serialized profile.
    pub fn key(&self) -> &'static str {
        match self {
            ProfileAttribute::FirstName => "firstName",
            ProfileAttribute::LastName => "lastName",
            ProfileAttribute::Ssn => "ssn",
            ProfileAttribute::Dob => "dob",
            ProfileAttribute::Address => "address",
            ProfileAttribute::City => "city",
            ProfileAttribute::State => "state",
            ProfileAttribute::Zip => "zip",
            ProfileAttribute::Phone => "phone",
            ProfileAttribute::Email => "email",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

impl PersonalInfo {
    pub fn get(&self, attr: ProfileAttribute) -> &str {
        match attr {
            ProfileAttribute::FirstName => &self.first_name,
            ProfileAttribute::LastName => &self.last_name,
            ProfileAttribute::Ssn => &self.ssn,
            ProfileAttribute::Dob => &self.dob,
            ProfileAttribute::Address => &self.address,
            ProfileAttribute::City => &self.city,
            ProfileAttribute::State => &self.state,
            ProfileAttribute::Zip => &self.zip,
            ProfileAttribute::Phone => &self.phone,
            ProfileAttribute::Email => &self.email,
        }
    }

    pub fn set(&mut self, attr: ProfileAttribute, value: impl Into<String>) {
        let slot = match attr {
            ProfileAttribute::FirstName => &mut self.first_name,
            ProfileAttribute::LastName => &mut self.last_name,
            ProfileAttribute::Ssn => &mut self.ssn,
            ProfileAttribute::Dob => &mut self.dob,
            ProfileAttribute::Address => &mut self.address,
            ProfileAttribute::City => &mut self.city,
            ProfileAttribute::State => &mut self.state,
            ProfileAttribute::Zip => &mut self.zip,
            ProfileAttribute::Phone => &mut self.phone,
            ProfileAttribute::Email => &mut self.email,
        };
        *slot = value.into();
    }
}

impl Profile {
    /// Apply one user edit by storage key. Accepts personal-info keys and the
    /// three preference flags (`voiceEnabled`, `largeText`, `highContrast`).
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ProfileError> {
        if let Some(attr) = ProfileAttribute::from_key(key) {
            self.personal_info.set(attr, value);
            return Ok(());
        }

        let flag = match key {
            "voiceEnabled" => &mut self.preferences.voice_enabled,
            "largeText" => &mut self.preferences.large_text,
            "highContrast" => &mut self.preferences.high_contrast,
            _ => return Err(ProfileError::UnknownField(key.to_string())),
        };

        *flag = match value.to_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => true,
            "false" | "off" | "no" | "0" => false,
            _ => {
                return Err(ProfileError::InvalidValue {
                    field: key.to_string(),
                    value: value.to_string(),
                });
            }
        };
        Ok(())
    }
}
