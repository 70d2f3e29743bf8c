//! View collaborator: fire-and-forget notifications to whatever renders the
//! curves.

use crate::selection::Selection;
use curved_core::{Point, PropertyId};

pub trait CurveView {
    fn set_selection(&mut self, selection: &Selection);

    /// The editable curve set changed.
    fn set_input(&mut self, input: &[PropertyId]);

    /// Rubber-band box in curve space; a zero-area box hides it.
    fn set_selection_box(&mut self, min: Point, max: Point);

    fn refresh(&mut self);
}

/// A notification received by a `RecordingView`.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Selection(Selection),
    Input(Vec<PropertyId>),
    SelectionBox(Point, Point),
    Refresh,
}

/// Headless view that records every notification.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn selection_events(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ViewEvent::Selection(_)))
            .count()
    }

    /// The most recent selection box, if any was reported.
    pub fn last_selection_box(&self) -> Option<(Point, Point)> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::SelectionBox(min, max) => Some((*min, *max)),
            _ => None,
        })
    }
}

impl CurveView for RecordingView {
    fn set_selection(&mut self, selection: &Selection) {
        self.events.push(ViewEvent::Selection(selection.clone()));
    }

    fn set_input(&mut self, input: &[PropertyId]) {
        self.events.push(ViewEvent::Input(input.to_vec()));
    }

    fn set_selection_box(&mut self, min: Point, max: Point) {
        self.events.push(ViewEvent::SelectionBox(min, max));
    }

    fn refresh(&mut self) {
        self.events.push(ViewEvent::Refresh);
    }
}
