use crate::config::Config;
use crate::editor::{AnnotationEditor, BaseImage, EditorResponse, LabelOutcome};
use crate::identity::{IdentityProvider, LocalIdentity};
use crate::image_source::{DecodedImage, ImageLoader, ImageSource};
use crate::input::{CanvasBounds, InputEvent};
use crate::model::{AnnotationList, Point, TaskStatus, TaskUpdate};
use crate::render::{Canvas, DrawCommand};
use crate::store::{AppState, JsonTaskStore, TaskStore};
use eframe::egui;
use std::cell::RefCell;
use std::rc::Rc;

// ── Task session ────────────────────────────────────────────────────────────

/// Everything tied to the task currently on screen.
struct TaskSession {
    task_id: String,
    editor: AnnotationEditor,
    /// Filled by the editor's change callback, drained once per frame.
    outbox: Rc<RefCell<Option<AnnotationList>>>,
    loader: ImageLoader,
    texture: Option<egui::TextureHandle>,
    label_buf: String,
    label_rejected: bool,
    /// The finger driving the current touch gesture.
    active_touch: Option<egui::TouchId>,
}

impl TaskSession {
    fn poll_image(&mut self, ctx: &egui::Context) {
        let Some((source, result)) = self.loader.poll() else {
            return;
        };
        match result {
            Ok(image) => {
                self.texture = Some(load_texture(ctx, &image));
                let (width, height) = image.size();
                log::debug!("image: {source} decoded at {width}x{height}");
                self.editor.image_ready(&source, width, height);
            }
            Err(err) => {
                log::warn!("image: could not load {source}: {err}");
                self.texture = None;
                self.editor.image_failed(&source);
            }
        }
    }

    fn take_change(&self) -> Option<AnnotationList> {
        self.outbox.borrow_mut().take()
    }
}

fn load_texture(ctx: &egui::Context, image: &DecodedImage) -> egui::TextureHandle {
    let rgba = &image.rgba;
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    ctx.load_texture("task-image", color_image, egui::TextureOptions::LINEAR)
}

// ── Canvas painting & input ─────────────────────────────────────────────────

fn to_pos(origin: egui::Pos2, p: Point) -> egui::Pos2 {
    origin + egui::vec2(p.x, p.y)
}

fn paint_canvas(
    painter: &egui::Painter,
    origin: egui::Pos2,
    canvas: &Canvas,
    texture: Option<&egui::TextureHandle>,
) {
    for cmd in canvas.commands() {
        match cmd {
            DrawCommand::Image { width, height } => {
                if let Some(tex) = texture {
                    let rect = egui::Rect::from_min_size(
                        origin,
                        egui::vec2(*width as f32, *height as f32),
                    );
                    painter.image(
                        tex.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
            }
            DrawCommand::StrokeRect {
                origin: start,
                width,
                height,
                stroke,
            } => {
                let end = Point::new(start.x + width, start.y + height);
                let rect = egui::Rect::from_two_pos(to_pos(origin, *start), to_pos(origin, end));
                painter.rect_stroke(
                    rect,
                    0.0,
                    egui::Stroke::new(stroke.width, stroke.color.to_egui()),
                    egui::StrokeKind::Middle,
                );
            }
            DrawCommand::Text {
                anchor,
                text,
                color,
                size,
            } => {
                painter.text(
                    to_pos(origin, *anchor),
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(*size),
                    color.to_egui(),
                );
            }
        }
    }
}

fn point(pos: egui::Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

/// Primary-button and touch events of this frame, in device coordinates.
///
/// Starts only count inside `hit_rect`, the visible part of the canvas.
/// Moves and releases are taken from anywhere so a drag can leave the
/// canvas and still finish. `None` marks a cancelled touch.
///
/// Only the finger in `active_touch` drives a gesture; touches with any
/// other id are dropped until that finger ends or is cancelled.
fn collect_input(
    ctx: &egui::Context,
    hit_rect: egui::Rect,
    active_touch: &mut Option<egui::TouchId>,
) -> Vec<Option<InputEvent>> {
    ctx.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    if *pressed {
                        hit_rect
                            .contains(*pos)
                            .then(|| Some(InputEvent::PointerDown(point(*pos))))
                    } else {
                        Some(Some(InputEvent::PointerUp(point(*pos))))
                    }
                }
                egui::Event::PointerMoved(pos) => Some(Some(InputEvent::PointerMove(point(*pos)))),
                egui::Event::Touch { id, phase, pos, .. } => {
                    touch_input(*id, *phase, *pos, hit_rect, active_touch)
                }
                _ => None,
            })
            .collect()
    })
}

fn touch_input(
    id: egui::TouchId,
    phase: egui::TouchPhase,
    pos: egui::Pos2,
    hit_rect: egui::Rect,
    active_touch: &mut Option<egui::TouchId>,
) -> Option<Option<InputEvent>> {
    if phase == egui::TouchPhase::Start {
        if active_touch.is_some() || !hit_rect.contains(pos) {
            return None;
        }
        *active_touch = Some(id);
        return Some(Some(InputEvent::TouchStart(vec![point(pos)])));
    }
    if *active_touch != Some(id) {
        return None;
    }
    match phase {
        egui::TouchPhase::Move => Some(Some(InputEvent::TouchMove(vec![point(pos)]))),
        egui::TouchPhase::End => {
            *active_touch = None;
            Some(Some(InputEvent::TouchEnd(vec![point(pos)])))
        }
        egui::TouchPhase::Cancel => {
            *active_touch = None;
            Some(None)
        }
        egui::TouchPhase::Start => None,
    }
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct AnnotateApp {
    config: Config,
    identity: LocalIdentity,
    store: JsonTaskStore,
    state: AppState,
    session: Option<TaskSession>,
    sign_in_buf: String,
    status: Option<String>,
}

impl AnnotateApp {
    pub fn new(ctx: &egui::Context, config: Config) -> Self {
        let identity = LocalIdentity::new(config.user.clone());
        let store = JsonTaskStore::new(config.tasks_file.clone());
        let mut app = Self {
            config,
            identity,
            store,
            state: AppState::new(),
            session: None,
            sign_in_buf: String::new(),
            status: None,
        };
        if app.identity.is_authenticated() {
            app.load_tasks(ctx);
        }
        app
    }

    fn load_tasks(&mut self, ctx: &egui::Context) {
        let Some(user) = self.identity.current_user().map(str::to_owned) else {
            return;
        };
        match self.store.tasks_for(&user) {
            Ok(tasks) => {
                log::info!("loaded {} tasks for {user}", tasks.len());
                self.state.set_tasks(tasks);
            }
            Err(err) => {
                log::error!("could not read {}: {err}", self.store.path().display());
                self.status = Some(format!("Could not load tasks: {err}"));
                return;
            }
        }

        let requested = self
            .config
            .task
            .take()
            .filter(|id| self.state.task_by_id(id).is_some());
        let target = requested
            .or_else(|| self.state.incomplete_task_ids().first().cloned())
            .or_else(|| self.state.tasks().first().map(|t| t.task_id.clone()));

        match target {
            Some(task_id) => self.open_task(ctx, &task_id),
            None => self.status = Some("No tasks assigned yet.".to_owned()),
        }
    }

    fn open_task(&mut self, ctx: &egui::Context, task_id: &str) {
        let Some(task) = self.state.select_task(task_id) else {
            log::warn!("task {task_id} is not assigned to the current user");
            return;
        };
        let source = ImageSource::new(task.image_url.clone());
        let annotations = task.annotations.clone();

        let outbox = Rc::new(RefCell::new(None));
        let sink = outbox.clone();
        let mut editor = AnnotationEditor::new(
            annotations,
            self.config.editor_options(),
            move |list: &AnnotationList| *sink.borrow_mut() = Some(list.clone()),
        );
        editor.set_image(source.clone());

        let waker_ctx = ctx.clone();
        let mut loader = ImageLoader::new(self.store.base_dir().map(|dir| dir.to_path_buf()))
            .with_waker(move || waker_ctx.request_repaint());
        loader.request(&source);

        log::info!("opened task {task_id}");
        self.session = Some(TaskSession {
            task_id: task_id.to_owned(),
            editor,
            outbox,
            loader,
            texture: None,
            label_buf: String::new(),
            label_rejected: false,
            active_touch: None,
        });
    }

    /// Write the current annotations and mark the task completed.
    fn save(&mut self) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let update = TaskUpdate {
            annotations: session.editor.annotations().clone(),
            status: TaskStatus::Completed,
        };
        match self.store.update(&session.task_id, update) {
            Ok(()) => {
                self.state.mark_completed(&session.task_id);
                self.status = Some(format!("Saved task {}.", session.task_id));
                true
            }
            Err(err) => {
                log::error!("saving task {} failed: {err}", session.task_id);
                self.status = Some(format!("Save failed: {err}"));
                false
            }
        }
    }

    fn next_task(&mut self, ctx: &egui::Context) {
        let Some(current) = self.session.as_ref().map(|s| s.task_id.clone()) else {
            return;
        };
        if !self.save() {
            return;
        }
        if let Some(next) = self.state.next_incomplete_task(&current).map(str::to_owned) {
            self.open_task(ctx, &next);
        }
    }

    fn sign_out(&mut self) {
        self.identity.sign_out();
        self.session = None;
        self.state.set_tasks(Vec::new());
        self.status = None;
    }

    /// Hand editor output to the app state, then feed the state's list back
    /// to the editor as its source of truth.
    fn sync_annotations(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        if let Some(list) = session.take_change() {
            self.state.update_annotations(list);
            session
                .editor
                .set_annotations(self.state.current_annotations().clone());
        }
    }

    fn sign_in_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading("Sign in");
                ui.add_space(12.0);
                ui.label("User id:");
                let te = ui.text_edit_singleline(&mut self.sign_in_buf);
                let submitted = te.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Sign in").clicked() || submitted {
                    if self.identity.sign_in(&self.sign_in_buf) {
                        self.sign_in_buf.clear();
                        self.load_tasks(ctx);
                    } else {
                        self.status = Some("Enter a user id.".to_owned());
                    }
                }
            });
        });
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        let next_id = self
            .session
            .as_ref()
            .and_then(|s| self.state.next_incomplete_task(&s.task_id))
            .map(str::to_owned);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(user) = self.identity.current_user() {
                    ui.label(format!("Signed in as {user}"));
                }
                if let Some(task) = self.state.current_task() {
                    ui.separator();
                    ui.label(format!("Task {} ({})", task.task_id, task.status.label()));
                }
                ui.separator();

                if let Some(session) = &mut self.session {
                    if ui
                        .add_enabled(session.editor.can_undo(), egui::Button::new("Undo"))
                        .clicked()
                    {
                        session.editor.undo();
                    }
                    if ui
                        .add_enabled(session.editor.can_redo(), egui::Button::new("Redo"))
                        .clicked()
                    {
                        session.editor.redo();
                    }
                    ui.separator();
                }

                let idle = self.session.as_ref().is_some_and(|s| !s.editor.is_prompting());
                match next_id {
                    Some(_) => {
                        if ui.add_enabled(idle, egui::Button::new("Next Task →")).clicked() {
                            self.next_task(ctx);
                        }
                    }
                    None => {
                        if ui.add_enabled(idle, egui::Button::new("Save")).clicked() {
                            self.save();
                        }
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Sign out").clicked() {
                        self.sign_out();
                    }
                });
            });
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        if let Some(notice) = self.session.as_mut().and_then(|s| s.editor.take_notice()) {
            self.status = Some(notice.message().to_owned());
        }
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(session) = &self.session {
                    ui.label(format!("{} annotations", session.editor.annotations().len()));
                    ui.separator();
                }
                if let Some(status) = &self.status {
                    ui.label(status);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match self.state.progress() {
                        Some(progress) => {
                            ui.add(
                                egui::ProgressBar::new(progress)
                                    .desired_width(200.0)
                                    .show_percentage(),
                            );
                        }
                        None => {
                            ui.label("No Tasks Assigned");
                        }
                    }
                });
            });
        });
    }

    fn canvas_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &mut self.session else {
                ui.centered_and_justified(|ui| ui.label("No task open."));
                return;
            };
            match session.editor.image() {
                BaseImage::Pending(_) if session.editor.canvas().is_blank() => {
                    ui.label("Loading image...");
                }
                BaseImage::Failed(source) => {
                    ui.label(format!("Image could not be loaded: {source}"));
                }
                _ => {}
            }

            egui::ScrollArea::both().drag_to_scroll(false).show(ui, |ui| {
                let (width, height) = session.editor.canvas().size();
                let (response, painter) = ui.allocate_painter(
                    egui::vec2(width as f32, height as f32),
                    egui::Sense::click_and_drag(),
                );
                let canvas_rect = response.rect;
                let bounds = CanvasBounds::new(canvas_rect.min.x, canvas_rect.min.y);

                let visible = canvas_rect.intersect(ui.clip_rect());
                for event in collect_input(ctx, visible, &mut session.active_touch) {
                    let outcome = match event {
                        Some(event) => session.editor.handle_input(&event, bounds),
                        None => {
                            session.editor.abort_drag();
                            EditorResponse::Ignored
                        }
                    };
                    if outcome == EditorResponse::PromptLabel {
                        session.label_buf.clear();
                        session.label_rejected = false;
                    }
                }

                painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));
                paint_canvas(
                    &painter,
                    canvas_rect.min,
                    session.editor.canvas(),
                    session.texture.as_ref(),
                );

                if !session.editor.is_prompting() {
                    let hovered = response
                        .hover_pos()
                        .and_then(|pos| session.editor.hit_test(bounds.to_canvas(point(pos))));
                    if let Some(index) = hovered {
                        let label = session.editor.annotations()[index].text.clone();
                        response.on_hover_text(label);
                    }
                }
            });
        });
    }

    fn label_prompt(&mut self, ctx: &egui::Context) {
        let Some(session) = &mut self.session else {
            return;
        };
        if !session.editor.is_prompting() {
            return;
        }

        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Label")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Enter a label for this region:");
                let te = ui.text_edit_singleline(&mut session.label_buf);
                if te.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                } else {
                    te.request_focus();
                }
                if session.label_rejected {
                    ui.colored_label(egui::Color32::LIGHT_RED, "The label cannot be empty.");
                }
                ui.horizontal(|ui| {
                    submit |= ui.button("OK").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if cancel {
            session.editor.cancel_label();
        } else if submit {
            match session.editor.submit_label(&session.label_buf) {
                LabelOutcome::Reprompt => session.label_rejected = true,
                LabelOutcome::Committed | LabelOutcome::NotPrompting => {
                    session.label_buf.clear();
                    session.label_rejected = false;
                }
            }
        }
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.identity.is_authenticated() {
            self.sign_in_view(ctx);
            return;
        }

        if let Some(session) = &mut self.session {
            session.poll_image(ctx);
        }

        self.toolbar(ctx);
        self.status_bar(ctx);
        self.canvas_view(ctx);
        self.label_prompt(ctx);
        self.sync_annotations();
    }
}
