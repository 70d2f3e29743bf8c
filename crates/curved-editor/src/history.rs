//! Undo/Redo history for curve operations.
//!
//! The presenter only needs `History::execute`; `UndoStack` is the in-memory
//! implementation used by embedders without their own history and by the
//! tests.
//!
//! Drag gestures arrive as a mergeable group: the `Open` operation pushes a
//! new entry, `Intermediate` and `Close` operations fold into it, so undo
//! reverts the whole gesture in a single step.

use crate::model::{ModelError, PropertyCommand, PropertyModel};
use crate::operations::{CurveOperation, MergePhase, OperationKind};
use crate::selection::Selection;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("{kind} has no open group to merge into")]
    NoOpenGroup { kind: OperationKind },
    #[error("cannot merge {incoming} into open {open} group")]
    MergeMismatch {
        open: OperationKind,
        incoming: OperationKind,
    },
}

/// Result of an undo or redo.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub label: &'static str,
    /// Selection to restore, when the operation carried one.
    pub selection: Option<Selection>,
}

/// The external operation history.
pub trait History {
    /// Apply `operation` to `model` and record it. An error means the
    /// operation was not applied.
    fn execute(
        &mut self,
        operation: CurveOperation,
        model: &mut dyn PropertyModel,
    ) -> Result<(), HistoryError>;

    /// Revert the latest step. `Ok(None)` when there is nothing to undo.
    fn undo(&mut self, model: &mut dyn PropertyModel) -> Result<Option<Step>, HistoryError>;

    /// Re-apply the latest undone step. `Ok(None)` when there is nothing to redo.
    fn redo(&mut self, model: &mut dyn PropertyModel) -> Result<Option<Step>, HistoryError>;
}

#[derive(Debug, Clone)]
struct Entry {
    kind: OperationKind,
    command: PropertyCommand,
    selection_before: Option<Selection>,
    selection_after: Option<Selection>,
    /// Still accepting `Intermediate`/`Close` merges.
    open: bool,
}

/// Manages undo/redo stacks with merge grouping for drag gestures.
pub struct UndoStack {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    /// Maximum undo depth.
    max_depth: usize,
}

impl UndoStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of recorded undo steps.
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&'static str> {
        self.undo_stack.last().map(|e| e.kind.label())
    }

    /// Whether a drag group is still open.
    pub fn has_open_group(&self) -> bool {
        self.undo_stack.last().is_some_and(|e| e.open)
    }

    fn push(&mut self, entry: Entry) {
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }
}

impl History for UndoStack {
    fn execute(
        &mut self,
        operation: CurveOperation,
        model: &mut dyn PropertyModel,
    ) -> Result<(), HistoryError> {
        let CurveOperation {
            kind,
            command,
            selection_before,
            selection_after,
            phase,
        } = operation;

        match phase {
            None | Some(MergePhase::Open) => {
                command.apply(model)?;
                self.push(Entry {
                    kind,
                    command,
                    selection_before,
                    selection_after,
                    open: phase.is_some(),
                });
            }
            Some(phase @ (MergePhase::Intermediate | MergePhase::Close)) => {
                let top = match self.undo_stack.last_mut() {
                    Some(top) if top.open => top,
                    _ => return Err(HistoryError::NoOpenGroup { kind }),
                };
                if top.kind != kind {
                    return Err(HistoryError::MergeMismatch {
                        open: top.kind,
                        incoming: kind,
                    });
                }
                command.apply(model)?;
                top.command.merge(command);
                if selection_after.is_some() {
                    top.selection_after = selection_after;
                }
                if phase == MergePhase::Close {
                    top.open = false;
                }
            }
        }
        Ok(())
    }

    fn undo(&mut self, model: &mut dyn PropertyModel) -> Result<Option<Step>, HistoryError> {
        let Some(mut entry) = self.undo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = entry.command.revert(model) {
            self.undo_stack.push(entry);
            return Err(err.into());
        }
        entry.open = false;
        let step = Step {
            label: entry.kind.label(),
            selection: entry.selection_before.clone(),
        };
        self.redo_stack.push(entry);
        Ok(Some(step))
    }

    fn redo(&mut self, model: &mut dyn PropertyModel) -> Result<Option<Step>, HistoryError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = entry.command.apply(model) {
            self.redo_stack.push(entry);
            return Err(err.into());
        }
        let step = Step {
            label: entry.kind.label(),
            selection: entry.selection_after.clone(),
        };
        self.undo_stack.push(entry);
        Ok(Some(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertySheet;
    use crate::operations::set_curve;
    use curved_core::{Curve, PropertyId, ValueSpread};
    use pretty_assertions::assert_eq;

    fn sheet() -> PropertySheet {
        PropertySheet::new().with(
            "size",
            ValueSpread::animated(1.0, 0.0, Curve::constant(0.0)),
        )
    }

    fn size() -> PropertyId {
        PropertyId::intern("size")
    }

    fn curve_of(sheet: &PropertySheet) -> Curve {
        sheet.get(size()).unwrap().animated_curve().unwrap().clone()
    }

    fn set_op(sheet: &PropertySheet, y: f64) -> CurveOperation {
        CurveOperation::set_curve(set_curve(sheet, size(), Curve::constant(y), true).unwrap())
    }

    fn move_op(sheet: &PropertySheet, y: f64, phase: MergePhase) -> CurveOperation {
        CurveOperation::move_points(
            set_curve(sheet, size(), Curve::constant(y), true).unwrap(),
            phase,
        )
    }

    #[test]
    fn undo_redo_single_operation() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(100);

        let op = set_op(&sheet, 0.5);
        stack.execute(op, &mut sheet).unwrap();
        assert_eq!(curve_of(&sheet), Curve::constant(0.5));

        let step = stack.undo(&mut sheet).unwrap().unwrap();
        assert_eq!(step.label, "Set Curve");
        assert_eq!(curve_of(&sheet), Curve::constant(0.0));

        stack.redo(&mut sheet).unwrap();
        assert_eq!(curve_of(&sheet), Curve::constant(0.5));
    }

    #[test]
    fn merged_drag_is_one_step() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(100);

        let op = move_op(&sheet, 0.1, MergePhase::Open);
        stack.execute(op, &mut sheet).unwrap();
        for y in [0.2, 0.3, 0.4] {
            let op = move_op(&sheet, y, MergePhase::Intermediate);
            stack.execute(op, &mut sheet).unwrap();
        }
        assert!(stack.has_open_group());
        let op = move_op(&sheet, 0.4, MergePhase::Close);
        stack.execute(op, &mut sheet).unwrap();
        assert!(!stack.has_open_group());

        assert_eq!(stack.depth(), 1);
        stack.undo(&mut sheet).unwrap();
        assert_eq!(curve_of(&sheet), Curve::constant(0.0));
        assert!(!stack.can_undo());

        stack.redo(&mut sheet).unwrap();
        assert_eq!(curve_of(&sheet), Curve::constant(0.4));
    }

    #[test]
    fn intermediate_without_open_is_rejected() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(100);
        let op = move_op(&sheet, 0.2, MergePhase::Intermediate);
        assert_eq!(
            stack.execute(op, &mut sheet),
            Err(HistoryError::NoOpenGroup {
                kind: OperationKind::MovePoints
            })
        );
        // nothing applied
        assert_eq!(curve_of(&sheet), Curve::constant(0.0));
    }

    #[test]
    fn mismatched_merge_is_rejected() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(100);
        let op = move_op(&sheet, 0.2, MergePhase::Open);
        stack.execute(op, &mut sheet).unwrap();
        let tangent = CurveOperation::set_tangent(
            set_curve(&sheet, size(), Curve::constant(0.3), true).unwrap(),
            MergePhase::Intermediate,
        );
        assert!(matches!(
            stack.execute(tangent, &mut sheet),
            Err(HistoryError::MergeMismatch { .. })
        ));
    }

    #[test]
    fn redo_clears_on_new_action() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(100);
        let op = set_op(&sheet, 0.5);
        stack.execute(op, &mut sheet).unwrap();
        stack.undo(&mut sheet).unwrap();
        assert!(stack.can_redo());

        let op = set_op(&sheet, 0.7);
        stack.execute(op, &mut sheet).unwrap();
        assert!(!stack.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            let op = set_op(&sheet, i as f64);
            stack.execute(op, &mut sheet).unwrap();
        }
        let mut undo_count = 0;
        while stack.undo(&mut sheet).unwrap().is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
    }

    #[test]
    fn failed_apply_records_nothing() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(10);
        let cmd = set_curve(&sheet, size(), Curve::constant(0.9), false).unwrap();
        sheet.set_locked(size(), true);
        let result = stack.execute(CurveOperation::set_curve(cmd), &mut sheet);
        assert_eq!(result, Err(HistoryError::Model(ModelError::Locked(size()))));
        assert!(!stack.can_undo());
    }

    #[test]
    fn undo_on_empty_stack_is_none() {
        let mut sheet = sheet();
        let mut stack = UndoStack::new(10);
        assert_eq!(stack.undo(&mut sheet).unwrap(), None);
        assert_eq!(stack.redo(&mut sheet).unwrap(), None);
    }
}
