//! Session resolution on top of a [`RegistryStore`].

use bids_model::{SessionLabel, SubjectId};
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::store::{RegistryRow, RegistryStore};

/// Outcome of resolving a `(subject, source scan)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResolution {
    pub subject: SubjectId,
    pub source_scan_id: String,
    pub session: SessionLabel,
    /// `true` when the pair was not registered and a new session was allocated.
    pub created: bool,
}

impl SessionResolution {
    pub fn row(&self) -> RegistryRow {
        RegistryRow::new(
            self.subject.clone(),
            self.session,
            self.source_scan_id.clone(),
        )
    }
}

/// Subject/session registry.
#[derive(Debug)]
pub struct Registry<S> {
    store: S,
}

impl<S: RegistryStore> Registry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves the session for a source scan without touching the table.
    ///
    /// An already registered pair returns its session unchanged with
    /// `created == false`; otherwise the next gap-free index for the subject
    /// is allocated with `created == true`.
    pub fn resolve_session(
        &self,
        subject: &SubjectId,
        source_scan_id: &str,
    ) -> Result<SessionResolution, RegistryError> {
        let rows = self.store.load()?;
        resolve_in(&rows, subject, source_scan_id, &self.store.location())
    }

    /// Appends the row for a freshly allocated session.
    ///
    /// Call only once the session directory exists: a registry row is the
    /// promise that the directory is there. Re-resolves under the store lock
    /// and refuses to commit if another writer allocated the index meanwhile.
    pub fn commit(&self, resolution: &SessionResolution) -> Result<(), RegistryError> {
        if !resolution.created {
            return Ok(());
        }
        let _guard = self.store.lock()?;
        let mut rows = self.store.load()?;
        let current = resolve_in(
            &rows,
            &resolution.subject,
            &resolution.source_scan_id,
            &self.store.location(),
        )?;
        if !current.created {
            if current.session == resolution.session {
                debug!(
                    subject = %resolution.subject,
                    session = %resolution.session,
                    "session already registered"
                );
                return Ok(());
            }
            return Err(RegistryError::Conflict {
                subject: resolution.subject.label(),
                expected: resolution.session.to_string(),
                found: current.session.to_string(),
            });
        }
        if current.session != resolution.session {
            return Err(RegistryError::Conflict {
                subject: resolution.subject.label(),
                expected: resolution.session.to_string(),
                found: current.session.to_string(),
            });
        }
        rows.push(resolution.row());
        self.store.replace(&rows)?;
        info!(
            subject = %resolution.subject,
            session = %resolution.session,
            source_scan_id = %resolution.source_scan_id,
            "registry updated"
        );
        Ok(())
    }

    /// Resolves and immediately commits the session.
    pub fn resolve_or_create_session(
        &self,
        subject: &SubjectId,
        source_scan_id: &str,
    ) -> Result<SessionResolution, RegistryError> {
        let resolution = self.resolve_session(subject, source_scan_id)?;
        self.commit(&resolution)?;
        Ok(resolution)
    }

    /// All sessions registered for a subject, ordered by index.
    pub fn sessions_for(&self, subject: &SubjectId) -> Result<Vec<RegistryRow>, RegistryError> {
        let mut rows: Vec<RegistryRow> = self
            .store
            .load()?
            .into_iter()
            .filter(|row| &row.subject == subject)
            .collect();
        rows.sort_by_key(|row| row.session);
        Ok(rows)
    }
}

fn resolve_in(
    rows: &[RegistryRow],
    subject: &SubjectId,
    source_scan_id: &str,
    location: &str,
) -> Result<SessionResolution, RegistryError> {
    let source_scan_id = source_scan_id.trim();
    let scan_rows: Vec<&RegistryRow> = rows
        .iter()
        .filter(|row| row.source_scan_id == source_scan_id)
        .collect();
    if let Some(owner) = scan_rows.iter().find(|row| &row.subject != subject) {
        return Err(RegistryError::ScanClaimed {
            scan_id: source_scan_id.to_string(),
            owner: owner.subject.label(),
        });
    }
    if scan_rows.len() > 1 {
        return Err(RegistryError::corrupt(
            location,
            format!("source scan {source_scan_id} is registered more than once for {subject}"),
        ));
    }

    let mut indexes: Vec<u32> = rows
        .iter()
        .filter(|row| &row.subject == subject)
        .map(|row| row.session.index())
        .collect();
    indexes.sort_unstable();
    let gap_free = indexes
        .iter()
        .enumerate()
        .all(|(pos, index)| usize::try_from(*index).is_ok_and(|index| index == pos + 1));
    if !gap_free {
        let listed: Vec<String> = indexes.iter().map(u32::to_string).collect();
        return Err(RegistryError::corrupt(
            location,
            format!(
                "session indexes for {subject} are not 1..n: [{}]",
                listed.join(", ")
            ),
        ));
    }

    if let Some(row) = scan_rows.first() {
        return Ok(SessionResolution {
            subject: subject.clone(),
            source_scan_id: source_scan_id.to_string(),
            session: row.session,
            created: false,
        });
    }

    let count = u32::try_from(indexes.len()).unwrap_or(u32::MAX);
    let session = SessionLabel::from_index(count.saturating_add(1)).map_err(|_| {
        RegistryError::SessionLimit {
            subject: subject.label(),
            last: format!("ses-{count:03}"),
        }
    })?;
    Ok(SessionResolution {
        subject: subject.clone(),
        source_scan_id: source_scan_id.to_string(),
        session,
        created: true,
    })
}
