//! Group name validation
//!
//! Names follow the service rule: an ASCII letter followed by ASCII letters,
//! digits or dashes, at most 128 characters. Validation happens before any
//! request is sent so a typo never costs a round trip.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;

/// Maximum group name length accepted by the service
pub const MAX_GROUP_NAME_LEN: usize = 128;

static GROUP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("group name regex is valid"));

/// Validate a group name.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` keyed `group_name` when the name is
/// empty, too long, or contains characters the service does not allow.
///
/// ```rust
/// use stackctl_utils::group_name::validate_group_name;
///
/// assert!(validate_group_name("TerracottaSample-1").is_ok());
/// assert!(validate_group_name("1-starts-with-digit").is_err());
/// ```
pub fn validate_group_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: "group_name".to_string(),
        value: format!("'{name}' {reason}"),
    };

    if name.is_empty() {
        return Err(invalid("is empty"));
    }
    if name.len() > MAX_GROUP_NAME_LEN {
        return Err(invalid(&format!(
            "is longer than {MAX_GROUP_NAME_LEN} characters"
        )));
    }
    if !GROUP_NAME_RE.is_match(name) {
        return Err(invalid(
            "must start with a letter and contain only letters, digits and '-'",
        ));
    }
    Ok(())
}
