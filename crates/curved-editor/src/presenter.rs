//! Curve editor presenter: pointer and command events → curve operations.
//!
//! The presenter owns the selection and the current drag session. Curves
//! themselves live in the property model; during a gesture the presenter
//! reads them, produces new curve values, and submits those through the
//! history. Nothing is mutated in place.
//!
//! ## Drag modes
//!
//! | Press lands on…                          | Mode         | Drag does…               |
//! |------------------------------------------|--------------|--------------------------|
//! | tangent handle of the single selection   | `SetTangent` | re-aim the tangent       |
//! | a selected point                         | `MovePoints` | move every selected point|
//! | any point                                | `MovePoints` | select it, then move     |
//! | near a curve                             | `Select`     | rubber-band select       |
//! | empty space                              | `Select`     | rubber-band select       |

use crate::config::ScreenTolerances;
use crate::error::EditorError;
use crate::history::{History, Step};
use crate::model::{PropertyCommand, PropertyModel};
use crate::operations::{self, CurveOperation, MergePhase, MergeTracker, OperationKind};
use crate::selection::{PointsByCurve, Selection, SelectionPath};
use crate::view::CurveView;
use curved_core::{
    Curve, Point, PropertyId, SplinePoint, Vec2, find_closest_curve, find_points, hit_position,
    hit_tangent,
};
use log::{debug, trace, warn};
use std::collections::BTreeMap;

/// How the current drag is interpreted. Fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Select,
    MovePoints,
    SetTangent,
}

/// Transient state between pointer-down and pointer-up.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub mode: DragMode,
    pub start: Point,
    /// Positions of the selected points at drag start, in `point_list` order.
    pub original_positions: Vec<Point>,
    /// Displacement needed before the press counts as a drag (curve space).
    pub min_drag_extents: Vec2,
    /// Per-axis hit tolerance (curve space).
    pub hit_box_extents: Vec2,
    /// The drag threshold has been crossed.
    pub dragging: bool,
    merge: MergeTracker,
}

impl DragSession {
    fn new(start: Point, screen_scale: Vec2, tolerances: &ScreenTolerances) -> Self {
        let inv = Vec2::new((1.0 / screen_scale.x).abs(), (1.0 / screen_scale.y).abs());
        Self {
            mode: DragMode::Select,
            start,
            original_positions: Vec::new(),
            min_drag_extents: inv * tolerances.drag_padding,
            hit_box_extents: inv * tolerances.hit_padding,
            dragging: false,
            merge: MergeTracker::new(),
        }
    }
}

pub struct CurvePresenter<V, M, H> {
    view: V,
    model: M,
    history: H,
    /// Ids of the animated properties, i.e. the editable curve set.
    input: Vec<PropertyId>,
    selection: Selection,
    session: Option<DragSession>,
}

impl<V, M, H> CurvePresenter<V, M, H>
where
    V: CurveView,
    M: PropertyModel,
    H: History,
{
    pub fn new(view: V, model: M, history: H) -> Self {
        let mut presenter = Self {
            view,
            model,
            history,
            input: Vec::new(),
            selection: Selection::new(),
            session: None,
        };
        presenter.update_input();
        presenter
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn input(&self) -> &[PropertyId] {
        &self.input
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// A drag session exists and has crossed the drag threshold.
    pub fn is_dragging(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.dragging)
    }

    /// Replace the property model and rebuild the curve set. Returns the
    /// previous model.
    pub fn set_model(&mut self, model: M) -> M {
        let old = std::mem::replace(&mut self.model, model);
        self.update_input();
        old
    }

    /// Rebuild the curve set from the model's animated properties.
    ///
    /// The view only hears about a new input when the id list changed.
    /// Selection paths that no longer resolve are dropped.
    pub fn update_input(&mut self) {
        let input: Vec<PropertyId> = self
            .model
            .property_ids()
            .into_iter()
            .filter(|&id| {
                self.model
                    .property_value(id)
                    .is_some_and(|v| v.animated_curve().is_some())
            })
            .collect();

        if input != self.input {
            debug!("curve input changed: {} curves", input.len());
            self.input = input;
            self.view.set_input(&self.input);
        }

        let pruned = self.selection.retain(|path| self.path_is_valid(path));
        self.set_selection(pruned);
        self.view.refresh();
    }

    /// Replace the selection. Returns `false` (and notifies nobody) when the
    /// new selection equals the current one.
    pub fn set_selection(&mut self, selection: Selection) -> bool {
        if selection == self.selection {
            return false;
        }
        self.selection = selection;
        self.view.set_selection(&self.selection);
        true
    }

    /// Current value of curve `index`.
    pub fn curve(&self, index: usize) -> Result<Curve, EditorError> {
        let id = self.property_id(index)?;
        let value = self
            .model
            .property_value(id)
            .ok_or(EditorError::MissingProperty(id))?;
        value
            .animated_curve()
            .cloned()
            .ok_or(EditorError::NotACurve(id))
    }

    /// Current values of every curve in the set.
    pub fn curves(&self) -> Result<Vec<Curve>, EditorError> {
        (0..self.input.len()).map(|i| self.curve(i)).collect()
    }

    fn property_id(&self, index: usize) -> Result<PropertyId, EditorError> {
        self.input
            .get(index)
            .copied()
            .ok_or(EditorError::CurveIndex {
                index,
                count: self.input.len(),
            })
    }

    fn path_is_valid(&self, path: &SelectionPath) -> bool {
        match self.curve(path.curve()) {
            Ok(curve) => path.point().is_none_or(|p| p < curve.len()),
            Err(_) => false,
        }
    }

    fn execute(&mut self, operation: CurveOperation) -> Result<(), EditorError> {
        let kind = operation.kind;
        let selection_after = operation.selection_after.clone();
        trace!("execute {kind} ({:?})", operation.phase);
        self.history
            .execute(operation, &mut self.model)
            .map_err(|source| {
                warn!("{kind} rejected by history: {source}");
                EditorError::Commit { kind, source }
            })?;
        if let Some(selection) = selection_after {
            self.set_selection(selection);
        }
        Ok(())
    }

    fn commit_curves(
        &self,
        curves: BTreeMap<usize, Curve>,
    ) -> Result<PropertyCommand, EditorError> {
        let entries = curves
            .into_iter()
            .map(|(index, curve)| Ok((self.property_id(index)?, curve)))
            .collect::<Result<Vec<_>, EditorError>>()?;
        operations::set_curves(&self.model, entries, true)
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Insert a point on the single selected curve, or select the existing
    /// point at that `x`.
    pub fn on_add_point(&mut self, p: Point) -> Result<(), EditorError> {
        let Some(index) = self.selection.single_curve_index() else {
            debug!("add point ignored: no single curve selected");
            return Ok(());
        };
        let curve = self.curve(index)?;

        if let Some(existing) = curve.find_point(p.x) {
            self.set_selection(Selection::from_pairs(&[(index, existing)]));
            self.view.refresh();
            return Ok(());
        }

        let inserted = curve.insert_point(p.x, p.y);
        let point_index = inserted
            .find_point(p.x)
            .ok_or(EditorError::IllegalState("inserted point not found"))?;
        let after = Selection::from_pairs(&[(index, point_index)]);
        let command = operations::set_curve(&self.model, self.property_id(index)?, inserted, true)?;
        debug!("insert point {point_index} on curve {index}");
        self.execute(CurveOperation::insert_point(
            command,
            self.selection.clone(),
            after,
        ))?;
        self.view.refresh();
        Ok(())
    }

    /// Remove every selected point the curves allow to be removed.
    pub fn on_remove(&mut self) -> Result<(), EditorError> {
        let selected = self.selection.points_by_curve();
        let mut curves = BTreeMap::new();
        // curves mapped to an empty list stay selected as a whole
        let mut kept = PointsByCurve::new();
        let mut removed_total = 0;

        for (&curve_index, points) in &selected {
            let kept_here = kept.entry(curve_index).or_default();
            if points.is_empty() {
                continue;
            }
            let mut curve = self.curve(curve_index)?;
            let mut remove_count = 0;
            for &point in points {
                // earlier removals shifted the remaining indices down
                let index = point - remove_count;
                let before = curve.len();
                curve = curve.remove_point(index)?;
                if curve.len() == before {
                    kept_here.push(index);
                } else {
                    remove_count += 1;
                }
            }
            removed_total += remove_count;
            curves.insert(curve_index, curve);
        }

        if curves.is_empty() {
            return Ok(());
        }
        let after = Selection::from_points_by_curve(&kept);
        if removed_total == 0 {
            debug!("remove ignored: every selected point is protected");
            self.set_selection(after);
            self.view.refresh();
            return Ok(());
        }

        debug!("remove {removed_total} points from {} curves", curves.len());
        let command = self.commit_curves(curves)?;
        self.execute(CurveOperation::remove_points(
            command,
            self.selection.clone(),
            after,
        ))?;
        self.view.refresh();
        Ok(())
    }

    pub fn on_select_all(&mut self) -> Result<(), EditorError> {
        let mut pairs = Vec::new();
        for (i, curve) in self.curves()?.iter().enumerate() {
            pairs.extend((0..curve.len()).map(|j| (i, j)));
        }
        self.set_selection(Selection::from_pairs(&pairs));
        Ok(())
    }

    pub fn on_deselect_all(&mut self) {
        self.set_selection(Selection::new());
    }

    /// Revert the latest history step and restore its selection.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let step = self.history.undo(&mut self.model)?;
        Ok(self.finish_step(step))
    }

    /// Re-apply the latest undone step and restore its selection.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let step = self.history.redo(&mut self.model)?;
        Ok(self.finish_step(step))
    }

    fn finish_step(&mut self, step: Option<Step>) -> bool {
        let Some(step) = step else {
            return false;
        };
        debug!("history step: {}", step.label);
        if let Some(selection) = step.selection {
            self.set_selection(selection);
        }
        self.update_input();
        true
    }

    // ─── Pointer protocol ────────────────────────────────────────────────

    /// Pointer pressed at `start` (curve space). `screen_scale` is the number
    /// of pixels per curve unit on each axis.
    pub fn on_start_drag(
        &mut self,
        start: Point,
        screen_scale: Vec2,
        tolerances: &ScreenTolerances,
    ) -> Result<(), EditorError> {
        if self.session.is_some() {
            warn!("drag started while another drag was active; finishing it first");
            self.on_end_drag()?;
        }

        let mut session = DragSession::new(start, screen_scale, tolerances);
        let hit = session.hit_box_extents;
        let curves = self.curves()?;

        if let Some((c, p)) = self.selection.single_point() {
            let point = point_at(&curves, c, p)?;
            if hit_tangent(start, point, hit, screen_scale, tolerances.tangent_length) {
                debug!("drag: set tangent of point {p} on curve {c}");
                session.mode = DragMode::SetTangent;
                self.session = Some(session);
                return Ok(());
            }
        }

        for (c, p) in self.selection.point_list() {
            let point = point_at(&curves, c, p)?;
            if hit_position(start, point.position(), hit) {
                debug!("drag: move selection");
                self.begin_move(&mut session, &curves)?;
                self.session = Some(session);
                return Ok(());
            }
        }

        let min = start - hit;
        let max = start + hit;
        let hits = find_points(&curves, min, max);
        if !hits.is_empty() {
            // a hit on the already selected curve wins over hits elsewhere
            let preferred = self.selection.single_curve_index().and_then(|selected| {
                hits.iter()
                    .copied()
                    .filter(|&(c, _)| c == selected)
                    .min_by(|&a, &b| {
                        let da = distance_to(&curves, a, start);
                        let db = distance_to(&curves, b, start);
                        da.total_cmp(&db)
                    })
            });
            let selection = match preferred {
                Some(pair) => Selection::from_pairs(&[pair]),
                None => Selection::from_pairs(&hits),
            };
            debug!("drag: select and move {} points", selection.len());
            self.set_selection(selection);
            self.begin_move(&mut session, &curves)?;
        } else if let Some(c) = find_closest_curve(&curves, min, max, start, hit) {
            debug!("drag: select curve {c}");
            self.set_selection(Selection::whole_curves([c]));
        } else {
            debug!("drag: rubber band");
            self.set_selection(Selection::new());
        }

        self.session = Some(session);
        self.view.refresh();
        Ok(())
    }

    fn begin_move(&self, session: &mut DragSession, curves: &[Curve]) -> Result<(), EditorError> {
        session.original_positions = self
            .selection
            .point_list()
            .into_iter()
            .map(|(c, p)| point_at(curves, c, p).map(SplinePoint::position))
            .collect::<Result<_, _>>()?;
        session.mode = DragMode::MovePoints;
        Ok(())
    }

    /// Pointer moved to `position`. Does nothing until the displacement
    /// reaches the drag threshold on either axis.
    pub fn on_drag(&mut self, position: Point) -> Result<(), EditorError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let delta = position - session.start;
        if !session.dragging
            && delta.x.abs() < session.min_drag_extents.x
            && delta.y.abs() < session.min_drag_extents.y
        {
            return Ok(());
        }
        session.dragging = true;
        let mode = session.mode;

        match mode {
            DragMode::MovePoints => self.drag_points(delta)?,
            DragMode::SetTangent => self.drag_tangent(position)?,
            DragMode::Select => self.drag_select(position)?,
        }
        self.view.refresh();
        Ok(())
    }

    fn next_phase(&mut self) -> Result<MergePhase, EditorError> {
        self.session
            .as_mut()
            .ok_or(EditorError::IllegalState("no drag session"))?
            .merge
            .advance()
    }

    fn drag_points(&mut self, delta: Vec2) -> Result<(), EditorError> {
        let points = self.selection.point_list();
        if points.is_empty() {
            return Ok(());
        }
        let originals = self
            .session
            .as_ref()
            .map(|s| s.original_positions.clone())
            .unwrap_or_default();
        if originals.len() != points.len() {
            return Err(EditorError::IllegalState(
                "selection changed during a point drag",
            ));
        }

        let mut targets: BTreeMap<usize, Vec<(usize, Point)>> = BTreeMap::new();
        for (&(c, p), &original) in points.iter().zip(&originals) {
            targets.entry(c).or_default().push((p, original + delta));
        }

        // all moves on one curve land in one replacement
        let mut working = BTreeMap::new();
        for (c, mut moves) in targets {
            // the leading point moves first so it never blocks the points
            // following it
            if delta.x > 0.0 {
                moves.sort_unstable_by(|a, b| b.0.cmp(&a.0));
            } else {
                moves.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            }
            let mut curve = self.curve(c)?;
            for (p, target) in moves {
                curve = curve.set_position(p, target.x, target.y)?;
            }
            working.insert(c, curve);
        }

        let command = self.commit_curves(working)?;
        let phase = self.next_phase()?;
        trace!("move {} points by {delta:?} ({phase:?})", points.len());
        self.execute(CurveOperation::move_points(command, phase))
    }

    fn drag_tangent(&mut self, position: Point) -> Result<(), EditorError> {
        let Some((c, p)) = self.selection.single_point() else {
            return Err(EditorError::IllegalState(
                "tangent drag without a single selected point",
            ));
        };
        let curve = self.curve(c)?;
        let point = *curve.point(p)?;
        let mut tangent = point.position() - position;
        if tangent.hypot2() == 0.0 {
            return Ok(());
        }
        // keep tangents in the +x half-plane so the slope is unambiguous
        if tangent.x < 0.0 {
            tangent = -tangent;
        }
        let tangent = tangent / tangent.hypot();
        let updated = curve.set_tangent(p, tangent.x, tangent.y)?;
        let command = operations::set_curve(&self.model, self.property_id(c)?, updated, true)?;
        let phase = self.next_phase()?;
        trace!("set tangent of point {p} on curve {c} ({phase:?})");
        self.execute(CurveOperation::set_tangent(command, phase))
    }

    fn drag_select(&mut self, position: Point) -> Result<(), EditorError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let start = session.start;
        let hit = session.hit_box_extents;
        let min = Point::new(start.x.min(position.x), start.y.min(position.y));
        let max = Point::new(start.x.max(position.x), start.y.max(position.y));
        self.view.set_selection_box(min, max);

        let curves = self.curves()?;
        let hits = find_points(&curves, min - hit, max + hit);
        self.set_selection(Selection::from_pairs(&hits));
        Ok(())
    }

    /// Pointer released. Closes any open merge group and always refreshes
    /// the view.
    pub fn on_end_drag(&mut self) -> Result<(), EditorError> {
        let result = match self.session.take() {
            Some(session) if session.dragging => self.finish_drag(session),
            _ => Ok(()),
        };
        self.view.refresh();
        result
    }

    fn finish_drag(&mut self, mut session: DragSession) -> Result<(), EditorError> {
        match session.mode {
            DragMode::MovePoints => {
                let Some(phase) = session.merge.close()? else {
                    return Ok(());
                };
                let mut curves = BTreeMap::new();
                for (c, _) in self.selection.point_list() {
                    if !curves.contains_key(&c) {
                        curves.insert(c, self.curve(c)?);
                    }
                }
                let command = self.commit_curves(curves)?;
                debug!("drag finished: {}", OperationKind::MovePoints);
                self.execute(CurveOperation::move_points(command, phase))
            }
            DragMode::SetTangent => {
                let Some(phase) = session.merge.close()? else {
                    return Ok(());
                };
                let (c, _) = self.selection.single_point().ok_or(EditorError::IllegalState(
                    "tangent drag without a single selected point",
                ))?;
                let command =
                    operations::set_curve(&self.model, self.property_id(c)?, self.curve(c)?, true)?;
                debug!("drag finished: {}", OperationKind::SetTangent);
                self.execute(CurveOperation::set_tangent(command, phase))
            }
            DragMode::Select => {
                self.view.set_selection_box(Point::ZERO, Point::ZERO);
                Ok(())
            }
        }
    }
}

fn point_at(curves: &[Curve], c: usize, p: usize) -> Result<&SplinePoint, EditorError> {
    let curve = curves.get(c).ok_or(EditorError::CurveIndex {
        index: c,
        count: curves.len(),
    })?;
    Ok(curve.point(p)?)
}

fn distance_to(curves: &[Curve], (c, p): (usize, usize), origin: Point) -> f64 {
    point_at(curves, c, p)
        .map(|point| point.position().distance(origin))
        .unwrap_or(f64::INFINITY)
}
