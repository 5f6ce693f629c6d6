//! The whiteboard session: one surface, its history, tools and sync state.

use crate::camera::Camera;
use crate::config::SessionConfig;
use crate::factory::{self, ShapeKind};
use crate::history::{History, Snapshot};
use crate::keymap::{self, Command, KeyEvent, Modifiers};
use crate::persistence::{
    LoadOutcome, SaveDecision, SaveOutcome, SaveReceipt, SaveRequest, SaveStart, SaveTracker,
    SyncError, WhiteboardRecord, WhiteboardRepository,
};
use crate::shapes::{SerializableColor, Shape, ShapeId};
use crate::storage::{Backend, Subscription};
use crate::surface::{NEUTRAL_BACKGROUND, Surface, SurfaceState};
use crate::tools::{CreateAction, Tool, ToolManager, ToolMode};
use crate::widget::WidgetManager;
use kurbo::{Affine, Point, Vec2};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Hit tolerance in screen pixels.
const HIT_TOLERANCE: f64 = 4.0;

/// Result of routing a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled(Command),
    /// Ctrl/Cmd+S: the caller should run [`WhiteboardSession::save`].
    SaveRequested,
    Ignored,
}

/// Edit focus waiting for its text object to be attached.
#[derive(Debug, Clone, Copy)]
struct PendingFocus {
    target: ShapeId,
    attempts_left: u32,
}

type RemoteQueue = Arc<Mutex<VecDeque<WhiteboardRecord>>>;

/// An editing session over one project's whiteboard.
///
/// The session is driven from a single thread. Saving is split into
/// [`begin_save`](Self::begin_save) and [`finish_save`](Self::finish_save)
/// so edits can continue while a write is awaited.
pub struct WhiteboardSession<B: Backend> {
    config: SessionConfig,
    surface: Surface,
    history: History,
    tools: ToolManager,
    camera: Camera,
    widgets: WidgetManager,
    repository: WhiteboardRepository<B>,
    tracker: SaveTracker,
    /// Serialized surface as of the last load, remote apply or save.
    synced_json: Option<String>,
    project_id: Option<String>,
    pending_focus: Option<PendingFocus>,
    external_text_focus: bool,
    remote_queue: RemoteQueue,
    remote_subscription: Option<Subscription>,
    disposed: bool,
}

impl<B: Backend> WhiteboardSession<B> {
    pub fn new(config: SessionConfig, backend: Arc<B>) -> Self {
        let surface = Surface::new(config.surface_width, config.surface_height);
        let mut history = History::new(config.history_capacity);
        history.reset(Snapshot::capture(surface.state()));
        Self {
            tools: ToolManager::new(
                config.draw_color,
                config.draw_brush_width,
                config.eraser_brush_width,
            ),
            camera: Camera::from_config(&config),
            config,
            surface,
            history,
            widgets: WidgetManager::new(),
            repository: WhiteboardRepository::new(backend),
            tracker: SaveTracker::new(),
            synced_json: None,
            project_id: None,
            pending_focus: None,
            external_text_focus: false,
            remote_queue: Arc::default(),
            remote_subscription: None,
            disposed: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn widgets(&self) -> &WidgetManager {
        &self.widgets
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.tools.current_mode
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Attach the session to a project. Any remote watch on the previous
    /// project is dropped.
    pub fn set_project(&mut self, project_id: Option<String>) {
        if self.project_id != project_id {
            self.stop_watching();
            if let Ok(mut queue) = self.remote_queue.lock() {
                queue.clear();
            }
        }
        self.project_id = project_id;
    }

    /// Tell the session whether a text field outside the surface has focus.
    pub fn set_external_text_focus(&mut self, focused: bool) {
        self.external_text_focus = focused;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if !self.disposed {
            self.surface.set_size(width, height);
        }
    }

    /// Whether the surface differs from the last saved form.
    pub fn has_unsaved_changes(&self) -> bool {
        self.surface
            .to_json()
            .map(|json| self.tracker.is_dirty(&json))
            .unwrap_or(true)
    }

    /// Record a snapshot if the surface reported any mutation.
    fn commit(&mut self) -> bool {
        if self.surface.drain_events().is_empty() {
            return false;
        }
        self.history.record(Snapshot::capture(self.surface.state()))
    }

    fn origin(&self) -> Point {
        self.config.default_origin
    }

    /// Insert objects, select them, and record one snapshot.
    fn insert(&mut self, shapes: Vec<Shape>) -> Option<ShapeId> {
        if self.disposed {
            return None;
        }
        let ids: Vec<ShapeId> = shapes.into_iter().map(|s| self.surface.add(s)).collect();
        self.widgets.select_all(ids.iter().copied());
        self.commit();
        ids.first().copied()
    }

    /// Insert a labeled rectangle or circle at the default position.
    pub fn create_shape(&mut self, kind: ShapeKind) -> Option<ShapeId> {
        self.insert(vec![factory::labeled_shape(kind, self.origin())])
    }

    /// Name-keyed variant of [`create_shape`](Self::create_shape); false for
    /// unknown kinds.
    pub fn create_shape_named(&mut self, kind: &str) -> bool {
        match ShapeKind::parse(kind) {
            Some(kind) => self.create_shape(kind).is_some(),
            None => {
                log::debug!("Ignoring unknown shape kind {:?}", kind);
                false
            }
        }
    }

    /// Insert a sticky note. Its label enters edit mode on a later
    /// [`tick`](Self::tick) once it is attached.
    pub fn create_sticky_note(&mut self) -> Option<ShapeId> {
        let (note, label) = factory::sticky_note(self.origin(), factory::pick_sticky_color());
        let id = self.insert(vec![note])?;
        self.pending_focus = Some(PendingFocus {
            target: label,
            attempts_left: self.config.focus_retry_attempts,
        });
        Some(id)
    }

    /// Insert a text box and start editing it.
    pub fn create_text(&mut self) -> Option<ShapeId> {
        let id = self.insert(vec![factory::text_box(self.origin())])?;
        self.widgets.enter_editing(id);
        Some(id)
    }

    /// Insert a line, with an arrowhead when `arrow`. Returns the line id.
    pub fn create_line(&mut self, arrow: bool) -> Option<ShapeId> {
        self.insert(factory::line(self.origin(), arrow))
    }

    pub fn create_section(
        &mut self,
        title: &str,
        fill: SerializableColor,
        text_color: SerializableColor,
        x: f64,
        y: f64,
    ) -> Option<ShapeId> {
        self.insert(vec![factory::section(title, fill, text_color, Point::new(x, y))])
    }

    pub fn create_task_card(&mut self, section: Option<&str>) -> Option<ShapeId> {
        self.insert(vec![factory::task_card(section, self.origin())])
    }

    /// Create the To Do / In Progress / Done row centered for `surface_width`.
    pub fn layout_default_sections(&mut self, surface_width: f64) -> Vec<ShapeId> {
        let top = self.config.section_top;
        factory::default_section_layout(surface_width)
            .into_iter()
            .filter_map(|p| self.create_section(p.title, p.fill, p.text_color, p.x, top))
            .collect()
    }

    /// Remove every object and restore the neutral background.
    pub fn reset_to_blank(&mut self) {
        if self.disposed {
            return;
        }
        self.surface.clear();
        self.surface.set_background(NEUTRAL_BACKGROUND);
        self.widgets.clear_selection();
        self.pending_focus = None;
        self.refresh_brush();
        self.commit();
    }

    /// Pick a persistent mode or run a one-shot creation.
    pub fn select_tool(&mut self, tool: impl Into<Tool>) {
        if self.disposed {
            return;
        }
        match tool.into() {
            Tool::Mode(mode) => {
                self.leave_editing();
                self.tools.set_mode(mode, &mut self.surface);
                log::info!("Tool: {:?}", mode);
            }
            Tool::Create(action) => {
                self.run_create(action);
                self.tools.set_mode(ToolMode::Select, &mut self.surface);
            }
        }
    }

    fn run_create(&mut self, action: CreateAction) -> Option<ShapeId> {
        match action {
            CreateAction::Rectangle => self.create_shape(ShapeKind::Rectangle),
            CreateAction::Circle => self.create_shape(ShapeKind::Circle),
            CreateAction::StickyNote => self.create_sticky_note(),
            CreateAction::Text => self.create_text(),
            CreateAction::Line => self.create_line(false),
            CreateAction::Arrow => self.create_line(true),
            CreateAction::Section => {
                let Point { x, y } = self.origin();
                self.create_section(
                    factory::NEW_SECTION_TITLE,
                    factory::SECTION_FILL,
                    factory::SECTION_TEXT,
                    x,
                    y,
                )
            }
            CreateAction::TaskCard => self.create_task_card(None),
        }
    }

    /// Re-derive the brush, since the eraser follows the background color.
    fn refresh_brush(&mut self) {
        if self.tools.current_mode.is_drawing() {
            let mode = self.tools.current_mode;
            self.tools.set_mode(mode, &mut self.surface);
        }
    }

    pub fn undo(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                log::info!("Undo performed");
                true
            }
            None => {
                log::info!("Nothing to undo");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                log::info!("Redo performed");
                true
            }
            None => {
                log::info!("Nothing to redo");
                false
            }
        }
    }

    /// Replace the surface with a snapshot without recording history.
    fn restore(&mut self, snapshot: &Snapshot) {
        self.history.begin_restore();
        self.surface.restore(snapshot.to_state());
        self.commit();
        self.history.end_restore();
        let surface = &self.surface;
        self.widgets.retain(|id| surface.contains(id));
        self.refresh_brush();
    }

    /// Delete the selected objects. Returns how many were removed.
    pub fn delete_selection(&mut self) -> usize {
        if self.disposed || self.widgets.is_editing() {
            return 0;
        }
        let ids: Vec<ShapeId> = self.widgets.selected().iter().copied().collect();
        let removed = ids
            .into_iter()
            .filter(|id| self.surface.remove(*id).is_some())
            .count();
        self.widgets.clear_selection();
        if removed > 0 {
            self.commit();
            log::info!("Deleted {} object(s)", removed);
        }
        removed
    }

    /// Translate the selected objects.
    pub fn move_selected(&mut self, delta: Vec2) -> bool {
        if self.disposed {
            return false;
        }
        // Objects nested in a selected group move with it.
        let ids: Vec<ShapeId> = self
            .widgets
            .selected()
            .iter()
            .copied()
            .filter(|id| self.surface.owner_of(*id) == Some(*id))
            .collect();
        for id in ids {
            self.surface
                .modify(id, |shape| shape.transform(Affine::translate(delta)));
        }
        self.commit()
    }

    /// Replace the content of a text object.
    pub fn edit_text(&mut self, id: ShapeId, content: &str) -> bool {
        if self.disposed || self.surface.find(id).and_then(Shape::as_text).is_none() {
            return false;
        }
        self.surface.modify(id, |shape| {
            if let Some(text) = shape.as_text_mut() {
                text.content = content.to_string();
            }
        });
        self.commit()
    }

    /// Select the top-most object under a screen point, or clear the
    /// selection when nothing is hit.
    pub fn select_at(&mut self, screen_point: Point) -> Option<ShapeId> {
        if self.disposed {
            return None;
        }
        let world = self.camera.screen_to_world(screen_point);
        let hit = self
            .surface
            .objects_at_point(world, HIT_TOLERANCE / self.camera.zoom)
            .first()
            .copied();
        match hit {
            Some(id) => self.widgets.select(id),
            None => self.widgets.clear_selection(),
        }
        hit
    }

    /// Start editing a text object, or the label of a group.
    pub fn enter_text_editing(&mut self, id: ShapeId) -> bool {
        if self.disposed {
            return false;
        }
        let target = match self.surface.find(id) {
            Some(Shape::Text(text)) => text.id,
            Some(Shape::Group(group)) => match group.label() {
                Some(label) => label.id(),
                None => return false,
            },
            _ => return false,
        };
        self.leave_editing();
        self.widgets.enter_editing(target);
        true
    }

    /// Drop text focus. A nested label hands the selection back to the
    /// top-level object that owns it.
    fn leave_editing(&mut self) -> bool {
        let Some(focused) = self.widgets.focused() else {
            return false;
        };
        self.widgets.exit_editing();
        match self.surface.owner_of(focused) {
            Some(owner) if owner != focused => {
                self.widgets.remove(focused);
                self.widgets.add_to_selection(owner);
            }
            Some(_) => {}
            None => self.widgets.remove(focused),
        }
        true
    }

    /// Resolve a deferred edit-focus request. Returns the focused id once
    /// the target is attached; gives up after the configured attempts.
    pub fn tick(&mut self) -> Option<ShapeId> {
        if self.disposed {
            return None;
        }
        let pending = self.pending_focus.as_mut()?;
        let target = pending.target;
        if self.surface.find(target).and_then(Shape::as_text).is_some() {
            self.pending_focus = None;
            self.leave_editing();
            self.widgets.enter_editing(target);
            log::debug!("Editing label {}", target);
            return Some(target);
        }
        pending.attempts_left = pending.attempts_left.saturating_sub(1);
        if pending.attempts_left == 0 {
            log::warn!("Label {} never attached; dropping edit focus", target);
            self.pending_focus = None;
        }
        None
    }

    pub fn has_pending_focus(&self) -> bool {
        self.pending_focus.is_some()
    }

    /// Begin a brush stroke at a world point. Only works in draw or eraser mode.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        !self.disposed && self.tools.begin(point, &self.surface)
    }

    pub fn extend_stroke(&mut self, point: Point) {
        if !self.disposed {
            self.tools.update(point);
        }
    }

    /// Finish the stroke and add the painted path.
    pub fn end_stroke(&mut self, point: Point) -> Option<ShapeId> {
        if self.disposed {
            return None;
        }
        let path = self.tools.end(point, self.surface.brush())?;
        let id = self.surface.add(path);
        self.commit();
        Some(id)
    }

    /// Leave text editing, else cancel a stroke, else clear the selection.
    pub fn escape(&mut self) -> bool {
        if self.leave_editing() {
            return true;
        }
        if self.tools.is_active() {
            self.tools.cancel();
            return true;
        }
        if self.widgets.has_selection() {
            self.widgets.clear_selection();
            return true;
        }
        false
    }

    /// Route a key press.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> KeyOutcome {
        if self.disposed {
            return KeyOutcome::Ignored;
        }
        let text_focused = self.external_text_focus || self.widgets.is_editing();
        let Some(command) = keymap::resolve(key, modifiers, text_focused) else {
            return KeyOutcome::Ignored;
        };
        if command == Command::Save {
            return KeyOutcome::SaveRequested;
        }
        self.execute(command);
        KeyOutcome::Handled(command)
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent, modifiers: Modifiers) -> KeyOutcome {
        match event {
            KeyEvent::Pressed(key) => self.handle_key(key, modifiers),
            KeyEvent::Released(_) => KeyOutcome::Ignored,
        }
    }

    /// Run a command. Save is async and only reported here.
    pub fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::SetMode(mode) => {
                self.select_tool(mode);
                true
            }
            Command::Create(action) => {
                self.select_tool(action);
                true
            }
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::DeleteSelection => self.delete_selection() > 0,
            Command::ZoomIn => self.camera.zoom_in(),
            Command::ZoomOut => self.camera.zoom_out(),
            Command::Save => false,
            Command::Escape => self.escape(),
        }
    }

    /// Prepare a save of the current surface.
    pub fn begin_save(&mut self) -> Result<SaveStart<B>, SyncError> {
        if self.disposed {
            return Ok(SaveStart::Skipped(SaveOutcome::Disposed));
        }
        let Some(project_id) = self.project_id.clone() else {
            return Ok(SaveStart::Skipped(SaveOutcome::NoProject));
        };
        let canvas_json = self.surface.to_json()?;
        match self.tracker.begin(&canvas_json) {
            SaveDecision::Proceed => Ok(SaveStart::Ready(SaveRequest {
                repository: self.repository.clone(),
                project_id,
                canvas_json,
            })),
            SaveDecision::NoChanges => {
                log::info!("No changes to save");
                Ok(SaveStart::Skipped(SaveOutcome::NoChanges))
            }
            SaveDecision::Coalesced => {
                log::debug!("Save already in flight; queued a follow-up");
                Ok(SaveStart::Skipped(SaveOutcome::Coalesced))
            }
        }
    }

    /// Apply the result of a sent save.
    ///
    /// Returns `Ok(true)` when saves were coalesced behind this one and the
    /// surface still differs from what was written, i.e. the caller should
    /// start another save.
    pub fn finish_save(&mut self, receipt: SaveReceipt) -> Result<bool, SyncError> {
        let SaveReceipt {
            canvas_json,
            result,
        } = receipt;
        let follow_up = self.tracker.finish(canvas_json.clone(), result.is_ok());
        match result {
            Ok(record) => {
                self.synced_json = Some(canvas_json);
                log::info!("Saved whiteboard for project {}", record.project_id);
            }
            Err(e) => {
                log::error!("Failed to save whiteboard: {}", e);
                return Err(e.into());
            }
        }
        Ok(follow_up && !self.disposed && self.has_unsaved_changes())
    }

    /// Save the surface to the attached project, following up coalesced
    /// requests until the stored form matches.
    pub async fn save(&mut self) -> Result<SaveOutcome, SyncError> {
        loop {
            let request = match self.begin_save()? {
                SaveStart::Ready(request) => request,
                SaveStart::Skipped(outcome) => return Ok(outcome),
            };
            let receipt = request.send().await;
            if !self.finish_save(receipt)? {
                return Ok(SaveOutcome::Saved);
            }
        }
    }

    /// Load a project's whiteboard. When no record exists, or loading
    /// fails, the default section template is installed; the error is
    /// still returned in the failure case.
    pub async fn load(&mut self, project_id: &str) -> Result<LoadOutcome, SyncError> {
        if self.disposed {
            return Ok(LoadOutcome::Disposed);
        }
        self.set_project(Some(project_id.to_string()));
        let fetched = self.repository.fetch(project_id).await;
        let decoded = fetched.map(|record| {
            record.map(|r| {
                let state = SurfaceState::from_json(&r.canvas_json);
                (r.canvas_json, state)
            })
        });

        match decoded {
            Ok(Some((json, Ok(state)))) => {
                self.install(state);
                self.tracker.mark_synced(Some(json.clone()));
                self.synced_json = Some(json);
                log::info!("Loaded whiteboard for project {}", project_id);
                Ok(LoadOutcome::Loaded)
            }
            Ok(None) => {
                self.install_template();
                self.tracker.mark_synced(None);
                log::info!("No whiteboard for project {}; using template", project_id);
                Ok(LoadOutcome::Template)
            }
            Ok(Some((_, Err(e)))) => {
                log::error!("Stored whiteboard for {} is unreadable: {}", project_id, e);
                self.install_fallback();
                Err(e.into())
            }
            Err(e) => {
                log::error!("Failed to load whiteboard for {}: {}", project_id, e);
                self.install_fallback();
                Err(e.into())
            }
        }
    }

    /// Replace the surface wholesale and start history afresh.
    fn install(&mut self, state: SurfaceState) {
        self.history.begin_restore();
        self.surface.restore(state);
        self.commit();
        self.history.end_restore();
        self.reset_interaction();
    }

    fn install_template(&mut self) {
        self.history.begin_restore();
        self.reset_to_blank();
        let width = self.surface.size().width;
        self.layout_default_sections(width);
        self.history.end_restore();
        self.reset_interaction();
        self.synced_json = self.surface.to_json().ok();
    }

    /// Template after a failed load. The template counts as saved so it
    /// cannot overwrite a record that merely failed to arrive.
    fn install_fallback(&mut self) {
        self.install_template();
        self.tracker.mark_synced(self.synced_json.clone());
    }

    fn reset_interaction(&mut self) {
        self.widgets = WidgetManager::new();
        self.tools.cancel();
        self.pending_focus = None;
        self.refresh_brush();
        self.history.reset(Snapshot::capture(self.surface.state()));
    }

    /// Start queueing remote changes to the project's record. Returns false
    /// when no project is attached.
    pub fn watch_remote(&mut self) -> Result<bool, SyncError> {
        if self.disposed {
            return Ok(false);
        }
        let Some(project_id) = self.project_id.as_deref() else {
            return Ok(false);
        };
        let queue = Arc::clone(&self.remote_queue);
        let subscription = self.repository.subscribe(project_id, move |record| {
            if let Ok(mut queue) = queue.lock() {
                queue.push_back(record);
            }
        })?;
        self.remote_subscription = Some(subscription);
        Ok(true)
    }

    pub fn is_watching_remote(&self) -> bool {
        self.remote_subscription
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    fn stop_watching(&mut self) {
        if let Some(subscription) = self.remote_subscription.take() {
            subscription.unsubscribe();
        }
    }

    /// Apply the newest queued remote record, unless the surface has local
    /// edits since the last sync. Local edits win; they reach the backend on
    /// the next save.
    pub fn poll_remote(&mut self) -> Result<bool, SyncError> {
        if self.disposed {
            return Ok(false);
        }
        let latest = match self.remote_queue.lock() {
            Ok(mut queue) => queue.drain(..).last(),
            Err(_) => None,
        };
        let Some(record) = latest else {
            return Ok(false);
        };
        if self.project_id.as_deref() != Some(record.project_id.as_str())
            || self.synced_json.as_deref() == Some(record.canvas_json.as_str())
        {
            return Ok(false);
        }
        let current = self.surface.to_json()?;
        if self.synced_json.as_deref() != Some(current.as_str()) {
            log::info!("Keeping local edits over remote whiteboard update");
            return Ok(false);
        }

        let state = SurfaceState::from_json(&record.canvas_json)?;
        self.install(state);
        self.tracker.mark_synced(Some(record.canvas_json.clone()));
        self.synced_json = Some(record.canvas_json);
        log::info!("Applied remote whiteboard update");
        Ok(true)
    }

    /// Tear the session down: pending focus requests and the remote watch
    /// are dropped and all further input is ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pending_focus = None;
        self.stop_watching();
        if let Ok(mut queue) = self.remote_queue.lock() {
            queue.clear();
        }
        self.tools.cancel();
        log::debug!("Whiteboard session disposed");
    }
}
