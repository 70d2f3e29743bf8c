//! Reversible curve operations.
//!
//! Every curve edit becomes a `CurveOperation`: the property command built by
//! the model, the selection before/after (for edits that change it), and a
//! merge phase for drag gestures. A drag emits one `Open`, any number of
//! `Intermediate`, and at most one `Close` operation, which the history folds
//! into a single undo step. `MergeTracker` enforces that order per session.

use crate::error::EditorError;
use crate::model::{PropertyCommand, PropertyModel};
use crate::selection::Selection;
use curved_core::{Curve, PropertyId, PropertyValue};
use std::fmt;

/// Position of an operation inside a mergeable group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePhase {
    /// Starts a new undo step.
    Open,
    /// Updates the open step without adding a new one.
    Intermediate,
    /// Finalizes the open step.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    SetCurve,
    SetCurves,
    InsertPoint,
    RemovePoints,
    MovePoints,
    SetTangent,
}

impl OperationKind {
    /// Human-readable label for undo menus.
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::SetCurve => "Set Curve",
            OperationKind::SetCurves => "Set Curves",
            OperationKind::InsertPoint => "Insert Point",
            OperationKind::RemovePoints => "Remove Points",
            OperationKind::MovePoints => "Move Points",
            OperationKind::SetTangent => "Set Tangent",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveOperation {
    pub kind: OperationKind,
    pub command: PropertyCommand,
    pub selection_before: Option<Selection>,
    pub selection_after: Option<Selection>,
    /// `None` for standalone operations.
    pub phase: Option<MergePhase>,
}

impl CurveOperation {
    fn new(kind: OperationKind, command: PropertyCommand) -> Self {
        Self {
            kind,
            command,
            selection_before: None,
            selection_after: None,
            phase: None,
        }
    }

    pub fn set_curve(command: PropertyCommand) -> Self {
        Self::new(OperationKind::SetCurve, command)
    }

    pub fn set_curves(command: PropertyCommand) -> Self {
        Self::new(OperationKind::SetCurves, command)
    }

    pub fn insert_point(command: PropertyCommand, before: Selection, after: Selection) -> Self {
        Self {
            selection_before: Some(before),
            selection_after: Some(after),
            ..Self::new(OperationKind::InsertPoint, command)
        }
    }

    pub fn remove_points(command: PropertyCommand, before: Selection, after: Selection) -> Self {
        Self {
            selection_before: Some(before),
            selection_after: Some(after),
            ..Self::new(OperationKind::RemovePoints, command)
        }
    }

    pub fn move_points(command: PropertyCommand, phase: MergePhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::new(OperationKind::MovePoints, command)
        }
    }

    pub fn set_tangent(command: PropertyCommand, phase: MergePhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::new(OperationKind::SetTangent, command)
        }
    }
}

// ─── Command builders ────────────────────────────────────────────────────

/// Value of `id` with its curve replaced by `curve`.
fn spread_with_curve(
    model: &dyn PropertyModel,
    id: PropertyId,
    curve: Curve,
) -> Result<PropertyValue, EditorError> {
    let value = model
        .property_value(id)
        .ok_or(EditorError::MissingProperty(id))?;
    let spread = value.as_spread().ok_or(EditorError::NotACurve(id))?;
    Ok(PropertyValue::Spread(spread.with_curve(curve)))
}

/// Build a command replacing the curve of one property.
pub fn set_curve(
    model: &dyn PropertyModel,
    id: PropertyId,
    curve: Curve,
    force: bool,
) -> Result<PropertyCommand, EditorError> {
    let value = spread_with_curve(model, id, curve)?;
    Ok(model.set_property_value(id, value, force)?)
}

/// Build one command replacing the curves of several properties.
pub fn set_curves(
    model: &dyn PropertyModel,
    curves: Vec<(PropertyId, Curve)>,
    force: bool,
) -> Result<PropertyCommand, EditorError> {
    let mut ids = Vec::with_capacity(curves.len());
    let mut values = Vec::with_capacity(curves.len());
    for (id, curve) in curves {
        values.push(spread_with_curve(model, id, curve)?);
        ids.push(id);
    }
    Ok(model.set_properties(&ids, values, force)?)
}

// ─── Merge tracking ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum GroupState {
    #[default]
    Idle,
    Open,
    Closed,
}

/// Hands out merge phases for one drag session, in the only legal order:
/// `Open`, then `Intermediate`*, then at most one `Close`.
#[derive(Debug, Clone, Default)]
pub struct MergeTracker {
    state: GroupState,
}

impl MergeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase for the next in-progress update.
    pub fn advance(&mut self) -> Result<MergePhase, EditorError> {
        match self.state {
            GroupState::Idle => {
                self.state = GroupState::Open;
                Ok(MergePhase::Open)
            }
            GroupState::Open => Ok(MergePhase::Intermediate),
            GroupState::Closed => Err(EditorError::IllegalState("merge group already closed")),
        }
    }

    /// `Some(Close)` when a group is open; `None` when nothing was opened.
    pub fn close(&mut self) -> Result<Option<MergePhase>, EditorError> {
        match self.state {
            GroupState::Idle => Ok(None),
            GroupState::Open => {
                self.state = GroupState::Closed;
                Ok(Some(MergePhase::Close))
            }
            GroupState::Closed => Err(EditorError::IllegalState("merge group already closed")),
        }
    }
}
