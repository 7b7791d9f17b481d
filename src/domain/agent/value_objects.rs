use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::ValidationError;

/// Matricule value object: an agent's service number
///
/// # Invariants
/// - Surrounding whitespace is trimmed
/// - Must not be empty
/// - Is immutable after construction
///
/// Uniqueness across agents is a roster-level rule checked by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Matricule(String);

impl Matricule {
    /// Creates a new Matricule value object
    ///
    /// # Example
    /// ```
    /// use roster_api::domain::agent::value_objects::Matricule;
    ///
    /// let matricule = Matricule::new(" M-100 ").expect("valid matricule");
    /// assert_eq!(matricule.as_str(), "M-100");
    /// ```
    pub fn new(matricule: impl AsRef<str>) -> Result<Self, ValidationError> {
        let matricule = matricule.as_ref().trim();
        if matricule.is_empty() {
            return Err(ValidationError::MissingField("matricule"));
        }
        Ok(Matricule(matricule.to_string()))
    }

    /// Returns the matricule as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Matricule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder portrait assigned on creation, derived from a generated seed
pub fn placeholder_photo_url(seed: &str) -> String {
    format!("https://picsum.photos/seed/{}/400/400", seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_matricule() {
        assert!(Matricule::new("N7-001").is_ok());
    }

    #[test]
    fn matricule_is_trimmed() {
        assert_eq!(Matricule::new("  CL-006\t").unwrap().as_str(), "CL-006");
    }

    #[test]
    fn empty_matricule_fails() {
        assert_eq!(
            Matricule::new("").unwrap_err(),
            ValidationError::MissingField("matricule")
        );
    }

    #[test]
    fn blank_matricule_fails() {
        assert!(Matricule::new("   ").is_err());
    }

    #[test]
    fn matricule_display() {
        let matricule = Matricule::new("M-100").unwrap();
        assert_eq!(format!("{}", matricule), "M-100");
    }

    #[test]
    fn photo_url_is_deterministic() {
        assert_eq!(
            placeholder_photo_url("abc"),
            "https://picsum.photos/seed/abc/400/400"
        );
        assert_eq!(placeholder_photo_url("abc"), placeholder_photo_url("abc"));
    }
}
