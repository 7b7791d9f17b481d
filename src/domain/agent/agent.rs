use uuid::Uuid;

use super::value_objects::Matricule;
use crate::domain::errors::ValidationError;

/// Raw agent fields as received from a caller
#[derive(Debug, Clone, Default)]
pub struct AgentDraft {
    pub first_name: String,
    pub last_name: String,
    pub grade: Option<String>,
    pub matricule: String,
    pub contact: String,
    pub address: String,
}

/// The editable part of an agent, validated
///
/// # Invariants
/// - First name, last name and matricule are not blank
/// - A blank grade is treated as absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    first_name: String,
    last_name: String,
    grade: Option<String>,
    matricule: Matricule,
    contact: String,
    address: String,
}

impl AgentProfile {
    /// Validates a draft
    ///
    /// # Example
    /// ```
    /// use roster_api::domain::agent::{AgentDraft, AgentProfile};
    ///
    /// let profile = AgentProfile::new(AgentDraft {
    ///     first_name: "Jean".to_string(),
    ///     last_name: "Koffi".to_string(),
    ///     matricule: "M-100".to_string(),
    ///     ..Default::default()
    /// })
    /// .expect("valid profile");
    ///
    /// assert_eq!(profile.full_name(), "Jean Koffi");
    /// ```
    pub fn new(draft: AgentDraft) -> Result<Self, ValidationError> {
        let first_name = required(draft.first_name, "first_name")?;
        let last_name = required(draft.last_name, "last_name")?;
        let matricule = Matricule::new(&draft.matricule)?;
        let grade = draft
            .grade
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        Ok(Self {
            first_name,
            last_name,
            grade,
            matricule,
            contact: draft.contact.trim().to_string(),
            address: draft.address.trim().to_string(),
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn grade(&self) -> Option<&str> {
        self.grade.as_deref()
    }

    pub fn matricule(&self) -> &Matricule {
        &self.matricule
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn required(value: String, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Agent aggregate root
///
/// A tracked individual that can be assigned to missions. Availability is
/// not part of the aggregate: it is derived from active missions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    id: Uuid,
    profile: AgentProfile,
    photo_url: String,
}

impl Agent {
    /// Reconstructs an Agent from stored data
    ///
    /// Only to be used by store adapters.
    pub fn from_persistence(id: Uuid, profile: AgentProfile, photo_url: String) -> Self {
        Self {
            id,
            profile,
            photo_url,
        }
    }

    /// Replaces every editable field. Id and photo are kept.
    pub fn update_profile(&mut self, profile: AgentProfile) {
        self.profile = profile;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn photo_url(&self) -> &str {
        &self.photo_url
    }

    /// Sort key used for roster listings: "last first", lowercased
    pub fn sort_key(&self) -> String {
        format!("{} {}", self.profile.last_name, self.profile.first_name).to_lowercase()
    }

    /// Case-insensitive match over names, matricule and contact
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            self.profile.first_name.as_str(),
            self.profile.last_name.as_str(),
            self.profile.matricule.as_str(),
            self.profile.contact.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}
