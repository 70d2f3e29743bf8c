pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod operations;
pub mod presenter;
pub mod selection;
pub mod view;

pub use config::{EditorConfig, ScreenTolerances};
pub use error::EditorError;
pub use history::{History, HistoryError, Step, UndoStack};
pub use model::{ModelError, PropertyChange, PropertyCommand, PropertyModel, PropertySheet};
pub use operations::{CurveOperation, MergePhase, MergeTracker, OperationKind};
pub use presenter::{CurvePresenter, DragMode, DragSession};
pub use selection::{PointsByCurve, Selection, SelectionPath};
pub use view::{CurveView, RecordingView, ViewEvent};
