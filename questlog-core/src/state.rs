use std::collections::BTreeMap;

use questlog_database::UserProgressDocument;
use questlog_progression::{Skill, SkillRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// Matches the last document seen from the store.
    Confirmed,
    /// Optimistic value whose merge has not resolved yet.
    Pending { write_id: u64, previous: SkillRecord },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedRecord {
    pub record: SkillRecord,
    pub sync: SyncStatus,
}

/// Ticket for one optimistic update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingWrite {
    pub skill: Skill,
    pub write_id: u64,
    pub record: SkillRecord,
}

/// In-memory copy of the user's progress.
///
/// Remote snapshots replace confirmed records wholesale but are ignored when
/// older than the newest version already seen. Pending records keep their
/// optimistic value until their own write succeeds or fails.
#[derive(Clone, Debug)]
pub struct ProgressState {
    version: u64,
    loaded: bool,
    next_write_id: u64,
    skills: BTreeMap<Skill, TrackedRecord>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::from_document(&UserProgressDocument::seeded())
    }
}

impl ProgressState {
    fn from_document(document: &UserProgressDocument) -> Self {
        Self {
            version: document.version,
            loaded: false,
            next_write_id: 1,
            skills: Skill::ALL
                .into_iter()
                .map(|skill| {
                    let tracked = TrackedRecord {
                        record: document.record(skill),
                        sync: SyncStatus::Confirmed,
                    };
                    (skill, tracked)
                })
                .collect(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether any snapshot from the store has been adopted.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn tracked(&self, skill: Skill) -> TrackedRecord {
        self.skills.get(&skill).copied().unwrap_or(TrackedRecord {
            record: SkillRecord::new(),
            sync: SyncStatus::Confirmed,
        })
    }

    pub fn record(&self, skill: Skill) -> SkillRecord {
        self.tracked(skill).record
    }

    pub fn is_pending(&self, skill: Skill) -> bool {
        matches!(self.tracked(skill).sync, SyncStatus::Pending { .. })
    }

    /// Local view as a document, pending values included.
    pub fn snapshot(&self) -> UserProgressDocument {
        UserProgressDocument {
            version: self.version,
            skills: self
                .skills
                .iter()
                .map(|(skill, tracked)| (*skill, tracked.record))
                .collect(),
        }
    }

    /// Adopt a remote document. Returns `false` when it was stale and ignored.
    pub fn apply_snapshot(&mut self, document: &UserProgressDocument) -> bool {
        if self.loaded && document.version < self.version {
            return false;
        }

        for skill in Skill::ALL {
            let remote = document.record(skill);
            let tracked = self.skills.entry(skill).or_insert(TrackedRecord {
                record: remote,
                sync: SyncStatus::Confirmed,
            });
            match tracked.sync {
                SyncStatus::Confirmed => tracked.record = remote,
                SyncStatus::Pending { write_id, .. } => {
                    tracked.sync = SyncStatus::Pending {
                        write_id,
                        previous: remote,
                    };
                }
            }
        }

        self.version = document.version;
        self.loaded = true;
        true
    }

    /// The store reported the document gone. A recreated document restarts its
    /// version count, so no later snapshot may be treated as stale against the old one.
    pub fn document_removed(&mut self) {
        self.version = 0;
    }

    /// Store `record` optimistically and hand back the ticket for its merge.
    pub fn begin_write(&mut self, skill: Skill, record: SkillRecord) -> PendingWrite {
        let write_id = self.next_write_id;
        self.next_write_id += 1;

        let current = self.tracked(skill);
        let previous = match current.sync {
            SyncStatus::Pending { previous, .. } => previous,
            SyncStatus::Confirmed => current.record,
        };
        self.skills.insert(
            skill,
            TrackedRecord {
                record,
                sync: SyncStatus::Pending { write_id, previous },
            },
        );

        PendingWrite {
            skill,
            write_id,
            record,
        }
    }

    /// Mark `write` as stored at `version`.
    pub fn confirm_write(&mut self, write: &PendingWrite, version: u64) {
        if let Some(tracked) = self.skills.get_mut(&write.skill) {
            match tracked.sync {
                SyncStatus::Pending { write_id, .. } if write_id == write.write_id => {
                    tracked.sync = SyncStatus::Confirmed;
                }
                // A newer optimistic write is outstanding; ours is now its fallback.
                SyncStatus::Pending { write_id, .. } => {
                    tracked.sync = SyncStatus::Pending {
                        write_id,
                        previous: write.record,
                    };
                }
                SyncStatus::Confirmed => {}
            }
        }

        self.version = self.version.max(version);
    }

    /// Undo `write` after its merge failed. Returns `true` when the record was reverted;
    /// a newer write on the same skill is left alone.
    pub fn fail_write(&mut self, write: &PendingWrite) -> bool {
        let Some(tracked) = self.skills.get_mut(&write.skill) else {
            return false;
        };

        match tracked.sync {
            SyncStatus::Pending { write_id, previous } if write_id == write.write_id => {
                tracked.record = previous;
                tracked.sync = SyncStatus::Confirmed;
                true
            }
            _ => false,
        }
    }
}
