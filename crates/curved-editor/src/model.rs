//! Property model collaborator.
//!
//! The property model owns the authoritative value of every property. The
//! editor never writes to it directly: it asks the model to *build* a
//! `PropertyCommand` (old and new values), wraps that in an operation, and
//! lets the history apply it.

use curved_core::{PropertyId, PropertyValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("unknown property {0}")]
    UnknownProperty(PropertyId),
    #[error("property {0} is locked")]
    Locked(PropertyId),
    #[error("{ids} ids but {values} values")]
    LengthMismatch { ids: usize, values: usize },
}

/// A single property transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub id: PropertyId,
    pub old: PropertyValue,
    pub new: PropertyValue,
}

/// A reversible set of property transitions, applied as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCommand {
    pub changes: Vec<PropertyChange>,
    /// Commit even when a property is locked.
    pub force: bool,
}

impl PropertyCommand {
    pub fn ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.changes.iter().map(|c| c.id)
    }

    /// Write the new values. Every property is checked before the first
    /// write, so a rejected command leaves the model untouched.
    pub fn apply(&self, model: &mut dyn PropertyModel) -> Result<(), ModelError> {
        for change in &self.changes {
            model.check_commit(change.id, self.force)?;
        }
        for change in &self.changes {
            model.commit_value(change.id, change.new.clone(), self.force)?;
        }
        Ok(())
    }

    /// Write the old values back, in reverse order.
    pub fn revert(&self, model: &mut dyn PropertyModel) -> Result<(), ModelError> {
        for change in &self.changes {
            model.check_commit(change.id, self.force)?;
        }
        for change in self.changes.iter().rev() {
            model.commit_value(change.id, change.old.clone(), self.force)?;
        }
        Ok(())
    }

    /// Fold a later command into this one: the earliest old value and the
    /// latest new value of each property survive.
    pub fn merge(&mut self, later: PropertyCommand) {
        for change in later.changes {
            match self.changes.iter_mut().find(|c| c.id == change.id) {
                Some(existing) => existing.new = change.new,
                None => self.changes.push(change),
            }
        }
        self.force |= later.force;
    }
}

/// The external property model.
pub trait PropertyModel {
    /// Every property id, in display order.
    fn property_ids(&self) -> Vec<PropertyId>;

    fn property_value(&self, id: PropertyId) -> Option<PropertyValue>;

    /// Fails when `id` cannot be written (unknown, or locked without `force`).
    fn check_commit(&self, id: PropertyId, force: bool) -> Result<(), ModelError>;

    /// Store `value` for `id`.
    fn commit_value(
        &mut self,
        id: PropertyId,
        value: PropertyValue,
        force: bool,
    ) -> Result<(), ModelError>;

    /// Build a command setting one property.
    fn set_property_value(
        &self,
        id: PropertyId,
        value: PropertyValue,
        force: bool,
    ) -> Result<PropertyCommand, ModelError> {
        self.set_properties(&[id], vec![value], force)
    }

    /// Build a command setting several properties at once.
    fn set_properties(
        &self,
        ids: &[PropertyId],
        values: Vec<PropertyValue>,
        force: bool,
    ) -> Result<PropertyCommand, ModelError> {
        if ids.len() != values.len() {
            return Err(ModelError::LengthMismatch {
                ids: ids.len(),
                values: values.len(),
            });
        }
        let changes = ids
            .iter()
            .zip(values)
            .map(|(&id, new)| {
                let old = self
                    .property_value(id)
                    .ok_or(ModelError::UnknownProperty(id))?;
                Ok(PropertyChange { id, old, new })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        Ok(PropertyCommand { changes, force })
    }
}

// ─── In-memory sheet ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub id: PropertyId,
    pub value: PropertyValue,
    #[serde(default)]
    pub locked: bool,
}

/// Ordered in-memory property model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySheet {
    entries: Vec<SheetEntry>,
}

impl PropertySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a sheet from a JSON array of entries.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Builder-style insert.
    pub fn with(mut self, id: &str, value: impl Into<PropertyValue>) -> Self {
        self.insert(id.into(), value.into());
        self
    }

    /// Insert or replace a property, keeping its position when replacing.
    pub fn insert(&mut self, id: PropertyId, value: PropertyValue) {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.value = value,
            None => self.entries.push(SheetEntry {
                id,
                value,
                locked: false,
            }),
        }
    }

    pub fn set_locked(&mut self, id: PropertyId, locked: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.locked = locked;
        }
    }

    pub fn get(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.entry(id).map(|e| &e.value)
    }

    fn entry(&self, id: PropertyId) -> Option<&SheetEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

impl PropertyModel for PropertySheet {
    fn property_ids(&self) -> Vec<PropertyId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    fn property_value(&self, id: PropertyId) -> Option<PropertyValue> {
        self.get(id).cloned()
    }

    fn check_commit(&self, id: PropertyId, force: bool) -> Result<(), ModelError> {
        let entry = self.entry(id).ok_or(ModelError::UnknownProperty(id))?;
        if entry.locked && !force {
            return Err(ModelError::Locked(id));
        }
        Ok(())
    }

    fn commit_value(
        &mut self,
        id: PropertyId,
        value: PropertyValue,
        force: bool,
    ) -> Result<(), ModelError> {
        self.check_commit(id, force)?;
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.value = value;
        }
        Ok(())
    }
}
