use crate::form::form_model::{SOURCE_USER_PROFILE, Suggestion};
use crate::profile::profile_model::{Profile, ProfileAttribute};

pub const PROFILE_CONFIDENCE: f32 = 0.9;

/// Substring keys checked against a field's folded name, in match order.
pub const FIELD_MAPPINGS: [(&str, ProfileAttribute); 12] = [
    ("firstname", ProfileAttribute::FirstName),
    ("lastname", ProfileAttribute::LastName),
    ("ssn", ProfileAttribute::Ssn),
    ("social", ProfileAttribute::Ssn),
    ("dob", ProfileAttribute::Dob),
    ("dateofbirth", ProfileAttribute::Dob),
    ("address", ProfileAttribute::Address),
    ("city", ProfileAttribute::City),
    ("state", ProfileAttribute::State),
    ("zip", ProfileAttribute::Zip),
    ("phone", ProfileAttribute::Phone),
    ("email", ProfileAttribute::Email),
];

/// Lower-case and drop separators, so `first_name_input` and `First-Name`
/// both fold to a string containing `firstname`.
pub fn fold_field_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Propose fill values for a field identified by `name` (or `id` when the
/// name is empty).
///
/// Every mapping key found in the folded name whose profile attribute is
/// non-empty contributes one suggestion. Several keys can match the same
/// field; they are all kept in mapping order and the first one wins at
/// autofill time.
pub fn field_suggestions(name: &str, id: &str, profile: &Profile) -> Vec<Suggestion> {
    let raw = if name.is_empty() { id } else { name };
    let folded = fold_field_name(raw);
    if folded.is_empty() {
        return Vec::new();
    }

    FIELD_MAPPINGS
        .iter()
        .filter(|(key, _)| folded.contains(key))
        .filter_map(|(_, attr)| {
            let value = profile.personal_info.get(*attr);
            if value.is_empty() {
                None
            } else {
                Some(Suggestion {
                    value: value.to_string(),
                    confidence: PROFILE_CONFIDENCE,
                    source: SOURCE_USER_PROFILE.to_string(),
                })
            }
        })
        .collect()
}
