//! Editing a cluster's checkpoint set.
//!
//! Checkpoints move only while edit mode is on, are removed only by an
//! explicit delete, and are never merged. Saving replaces the cluster's full
//! set in the store.

use crate::error::PlannerError;
use crate::model::{Checkpoint, CheckpointId, CheckpointSource, ClusterId, Position};
use crate::traits::CheckpointStore;

pub struct CheckpointEditor<S> {
    store: S,
    cluster_id: ClusterId,
    checkpoints: Vec<Checkpoint>,
    edit_mode: bool,
    next_temporary: u32,
    dirty: bool,
}

impl<S: CheckpointStore> CheckpointEditor<S> {
    pub fn load(store: S, cluster_id: ClusterId) -> Result<Self, PlannerError> {
        let checkpoints = store.list(cluster_id)?;
        tracing::debug!(cluster_id, count = checkpoints.len(), "loaded checkpoints");
        Ok(Self {
            store,
            cluster_id,
            checkpoints,
            edit_mode: false,
            next_temporary: 1,
            dirty: false,
        })
    }

    pub fn cluster_id(&self) -> ClusterId {
        self.cluster_id
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn is_editing(&self) -> bool {
        self.edit_mode
    }

    /// Unsaved local changes exist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn enter_edit_mode(&mut self) {
        self.edit_mode = true;
    }

    pub fn exit_edit_mode(&mut self) {
        self.edit_mode = false;
    }

    /// Ask the external generator for checkpoints and take its persisted set.
    /// Unsaved local edits are discarded.
    pub fn generate(&mut self) -> Result<usize, PlannerError> {
        let generated = self.store.generate(self.cluster_id)?;
        tracing::info!(cluster_id = self.cluster_id, count = generated.len(), "checkpoints generated");
        self.checkpoints = generated;
        self.dirty = false;
        Ok(self.checkpoints.len())
    }

    /// Place a manual checkpoint serving this cluster. It keeps a temporary
    /// id until saved.
    pub fn add_manual(&mut self, position: Position) -> CheckpointId {
        let id = CheckpointId::Temporary(format!("temp-{}", self.next_temporary));
        self.next_temporary += 1;
        self.checkpoints.push(Checkpoint {
            id: id.clone(),
            position,
            serves_clusters: [self.cluster_id].into_iter().collect(),
            confidence: 1.0,
            source: CheckpointSource::Manual,
        });
        self.dirty = true;
        id
    }

    pub fn reposition(&mut self, id: &CheckpointId, position: Position) -> Result<(), PlannerError> {
        if !self.edit_mode {
            return Err(PlannerError::EditModeRequired);
        }
        let checkpoint = self
            .checkpoints
            .iter_mut()
            .find(|cp| &cp.id == id)
            .ok_or_else(|| PlannerError::UnknownCheckpoint(id.clone()))?;
        checkpoint.position = position;
        self.dirty = true;
        Ok(())
    }

    /// Remove a checkpoint. Persisted checkpoints are deleted from the store
    /// immediately; temporary ones only locally.
    pub fn delete(&mut self, id: &CheckpointId) -> Result<(), PlannerError> {
        let index = self
            .checkpoints
            .iter()
            .position(|cp| &cp.id == id)
            .ok_or_else(|| PlannerError::UnknownCheckpoint(id.clone()))?;

        if let CheckpointId::Stored(stored) = id {
            self.store.delete(*stored)?;
            tracing::info!(cluster_id = self.cluster_id, checkpoint_id = stored, "checkpoint deleted");
        }
        self.checkpoints.remove(index);
        Ok(())
    }

    /// Replace the stored set with the local one, reload it, and leave edit
    /// mode. A failed save keeps the local edits.
    pub fn save(&mut self) -> Result<&[Checkpoint], PlannerError> {
        self.store.save(self.cluster_id, &self.checkpoints)?;
        let reloaded = self.store.list(self.cluster_id)?;
        tracing::info!(cluster_id = self.cluster_id, count = reloaded.len(), "checkpoint set saved");
        self.checkpoints = reloaded;
        self.edit_mode = false;
        self.dirty = false;
        Ok(&self.checkpoints)
    }
}
