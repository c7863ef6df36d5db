use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of tracked skill categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    #[serde(alias = "Forca")]
    Strength,
    #[serde(alias = "Aerobico")]
    Cardio,
    #[serde(alias = "Inteligencia")]
    Intelligence,
    #[serde(alias = "Companheirismo")]
    Camaraderie,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Skill::Strength,
        Skill::Cardio,
        Skill::Intelligence,
        Skill::Camaraderie,
    ];

    /// Stable document key for this skill.
    pub fn key(self) -> &'static str {
        match self {
            Skill::Strength => "Strength",
            Skill::Cardio => "Cardio",
            Skill::Intelligence => "Intelligence",
            Skill::Camaraderie => "Camaraderie",
        }
    }

    /// Parse a skill name case-insensitively. Legacy Portuguese keys are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "strength" | "forca" => Some(Skill::Strength),
            "cardio" | "aerobico" => Some(Skill::Cardio),
            "intelligence" | "inteligencia" => Some(Skill::Intelligence),
            "camaraderie" | "companheirismo" => Some(Skill::Camaraderie),
            _ => None,
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
