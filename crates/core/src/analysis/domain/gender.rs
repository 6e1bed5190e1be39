use serde::{Deserialize, Serialize};

/// Categorical gender reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Maps the analyzer's binary code: `1` is male, anything else female.
    pub fn from_code(code: i32) -> Self {
        if code == 1 {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        })
    }
}
