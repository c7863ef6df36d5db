use std::collections::BTreeMap;

use anyhow::Context as _;
use tracing::debug;

use questlog_progression::{Skill, SkillRecord};

use crate::store::{Document, Fields};

/// Field used by documents written before skills were stored as top-level fields.
const LEGACY_SKILLS_FIELD: &str = "skills";

/// Every skill record owned by one user. All four skills are always present.
///
/// Stored flat: one top-level field per skill key plus the store's `version`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProgressDocument {
    pub version: u64,
    pub skills: BTreeMap<Skill, SkillRecord>,
}

impl UserProgressDocument {
    /// Fresh document with every skill at level 1 and no points.
    pub fn seeded() -> Self {
        Self {
            version: 0,
            skills: Skill::ALL
                .into_iter()
                .map(|skill| (skill, SkillRecord::new()))
                .collect(),
        }
    }

    pub fn record(&self, skill: Skill) -> SkillRecord {
        self.skills.get(&skill).copied().unwrap_or_default()
    }

    pub fn set_record(&mut self, skill: Skill, record: SkillRecord) {
        self.skills.insert(skill, record);
    }

    /// Store fields: one JSON record per skill key.
    pub fn to_fields(&self) -> anyhow::Result<Fields> {
        Skill::ALL
            .into_iter()
            .map(|skill| skill_field(skill, self.record(skill)))
            .collect()
    }

    /// Decode a stored document, normalizing every record and seeding missing skills.
    pub fn from_document(document: &Document) -> anyhow::Result<Self> {
        let legacy = document
            .fields
            .get(LEGACY_SKILLS_FIELD)
            .and_then(serde_json::Value::as_object);

        let mut skills = BTreeMap::new();
        for skill in Skill::ALL {
            let raw = document.fields.get(skill.key()).or_else(|| {
                legacy.and_then(|entries| {
                    entries
                        .iter()
                        .find(|(name, _)| Skill::parse(name) == Some(skill))
                        .map(|(_, value)| value)
                })
            });

            let record = match raw {
                Some(value) => serde_json::from_value::<SkillRecord>(value.clone())
                    .with_context(|| format!("invalid `{skill}` record"))?
                    .normalized(),
                None => {
                    debug!(skill = %skill, "skill missing from stored document; seeding");
                    SkillRecord::new()
                }
            };
            debug_assert!(record.is_normalized(), "{skill}: {record:?}");
            skills.insert(skill, record);
        }

        Ok(Self {
            version: document.version,
            skills,
        })
    }
}

impl Default for UserProgressDocument {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Single-field update carrying one skill record.
pub fn skill_field(skill: Skill, record: SkillRecord) -> anyhow::Result<(String, serde_json::Value)> {
    let value = serde_json::to_value(record)
        .with_context(|| format!("failed to serialize `{skill}` record"))?;
    Ok((skill.key().to_owned(), value))
}
