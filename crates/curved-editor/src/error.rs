use crate::history::HistoryError;
use crate::model::ModelError;
use crate::operations::OperationKind;
use curved_core::{CurveError, PropertyId};
use thiserror::Error;

/// Errors surfaced by the curve presenter.
///
/// `IllegalState` marks a broken caller contract (for example a tangent drag
/// without a single selected point). `Commit` means the history rejected an
/// operation; the user action is lost and the curves are unchanged from the
/// history's point of view.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("curve index {index} is out of bounds (curves: {count})")]
    CurveIndex { index: usize, count: usize },
    #[error("property {0} is missing from the model")]
    MissingProperty(PropertyId),
    #[error("property {0} does not hold a curve")]
    NotACurve(PropertyId),
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to execute {kind} operation")]
    Commit {
        kind: OperationKind,
        #[source]
        source: HistoryError,
    },
    #[error("history navigation failed")]
    History(#[from] HistoryError),
}
