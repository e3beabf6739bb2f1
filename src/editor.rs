//! The interactive rectangle editor.
//!
//! A gesture runs `Idle -> Drawing -> LabelPrompt -> Idle`. Only a resolved
//! label prompt touches the committed list; moves and releases work on the
//! pending rectangle alone. Undo and redo are accepted in `Idle` only.

use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::image_source::ImageSource;
use crate::input::{CanvasBounds, InputEvent, Phase};
use crate::model::{Annotation, AnnotationList, Point};
use crate::render::{self, Canvas, RenderStyle, FALLBACK_SIZE};

// ── State ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum EditorState {
    Idle,
    Drawing { start: Point, current: Point },
    /// Waiting for the host to resolve the label prompt. Pointer input is
    /// ignored until then.
    LabelPrompt { pending: Annotation },
}

#[derive(Clone, Debug, PartialEq)]
pub enum BaseImage {
    Missing,
    Pending(ImageSource),
    Ready {
        source: ImageSource,
        width: u32,
        height: u32,
    },
    Failed(ImageSource),
}

impl BaseImage {
    fn source(&self) -> Option<&ImageSource> {
        match self {
            BaseImage::Missing => None,
            BaseImage::Pending(source) | BaseImage::Failed(source) => Some(source),
            BaseImage::Ready { source, .. } => Some(source),
        }
    }
}

/// How the drawing surface is sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceSizing {
    /// Match the image's natural pixel size.
    #[default]
    Natural,
    Fixed { width: u32, height: u32 },
}

/// User-facing messages the host should display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    GestureCancelled,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::GestureCancelled => "Annotation discarded: no label was given.",
        }
    }
}

/// What an input event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorResponse {
    Ignored,
    Started,
    Moved,
    /// The drag ended; the host must now ask for a label.
    PromptLabel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelOutcome {
    Committed,
    /// Blank label; keep the prompt open.
    Reprompt,
    /// No prompt was open.
    NotPrompting,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditorOptions {
    pub history_limit: usize,
    pub sizing: SurfaceSizing,
    pub style: RenderStyle,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            sizing: SurfaceSizing::Natural,
            style: RenderStyle::default(),
        }
    }
}

// ── Editor ──────────────────────────────────────────────────────────────────

pub struct AnnotationEditor {
    annotations: AnnotationList,
    history: History,
    state: EditorState,
    image: BaseImage,
    canvas: Canvas,
    options: EditorOptions,
    notice: Option<Notice>,
    on_change: Box<dyn FnMut(&AnnotationList)>,
}

impl AnnotationEditor {
    /// `on_change` receives the full replacement list after every commit,
    /// undo and redo.
    pub fn new(
        annotations: AnnotationList,
        options: EditorOptions,
        on_change: impl FnMut(&AnnotationList) + 'static,
    ) -> Self {
        let (width, height) = match options.sizing {
            SurfaceSizing::Natural => FALLBACK_SIZE,
            SurfaceSizing::Fixed { width, height } => (width, height),
        };
        Self {
            annotations,
            history: History::with_limit(options.history_limit),
            state: EditorState::Idle,
            image: BaseImage::Missing,
            canvas: Canvas::new(width, height),
            options,
            notice: None,
            on_change: Box::new(on_change),
        }
    }

    pub fn annotations(&self) -> &AnnotationList {
        &self.annotations
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn image(&self) -> &BaseImage {
        &self.image
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.state, EditorState::LabelPrompt { .. })
    }

    /// The uncommitted rectangle, while dragging or awaiting a label.
    pub fn pending(&self) -> Option<Annotation> {
        match &self.state {
            EditorState::Idle => None,
            EditorState::Drawing { start, current } => {
                Some(Annotation::from_drag(*start, *current, String::new()))
            }
            EditorState::LabelPrompt { pending } => Some(pending.clone()),
        }
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    // ── Input ───────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &InputEvent, bounds: CanvasBounds) -> EditorResponse {
        let point = event.resolve(bounds);
        match event.phase() {
            Phase::Start => match point {
                Some(p) => self.pointer_down(p),
                None => EditorResponse::Ignored,
            },
            Phase::Move => match point {
                Some(p) => self.pointer_move(p),
                None => EditorResponse::Ignored,
            },
            Phase::End => self.pointer_up(point),
        }
    }

    /// Start a drag at a canvas-local point. Ignored mid-gesture.
    pub fn pointer_down(&mut self, p: Point) -> EditorResponse {
        if self.state != EditorState::Idle {
            return EditorResponse::Ignored;
        }
        log::debug!("editor: drag started at ({}, {})", p.x, p.y);
        self.state = EditorState::Drawing {
            start: p,
            current: p,
        };
        EditorResponse::Started
    }

    pub fn pointer_move(&mut self, p: Point) -> EditorResponse {
        let EditorState::Drawing { current, .. } = &mut self.state else {
            return EditorResponse::Ignored;
        };
        *current = p;
        self.redraw();
        EditorResponse::Moved
    }

    /// End the drag. `None` means the release position is unknown and the
    /// last observed position is used.
    pub fn pointer_up(&mut self, p: Option<Point>) -> EditorResponse {
        let EditorState::Drawing { start, current } = self.state else {
            return EditorResponse::Ignored;
        };
        let end = p.unwrap_or(current);
        let pending = Annotation::from_drag(start, end, String::new());
        log::debug!(
            "editor: drag ended, pending {}x{} at ({}, {})",
            pending.width,
            pending.height,
            pending.x,
            pending.y
        );
        self.state = EditorState::LabelPrompt { pending };
        self.redraw();
        EditorResponse::PromptLabel
    }

    /// Drop an in-progress drag, e.g. when the platform cancels a touch.
    /// A gesture already waiting for its label is left alone.
    pub fn abort_drag(&mut self) -> bool {
        if !matches!(self.state, EditorState::Drawing { .. }) {
            return false;
        }
        log::debug!("editor: drag interrupted");
        self.state = EditorState::Idle;
        self.redraw();
        true
    }

    // ── Label prompt ────────────────────────────────────────────────────────

    pub fn submit_label(&mut self, text: &str) -> LabelOutcome {
        let EditorState::LabelPrompt { pending } = &self.state else {
            return LabelOutcome::NotPrompting;
        };
        let label = text.trim();
        if label.is_empty() {
            return LabelOutcome::Reprompt;
        }

        let annotation = Annotation {
            text: label.to_owned(),
            ..pending.clone()
        };
        self.history.record(self.annotations.clone());
        self.annotations = self.annotations.appended(annotation);
        self.state = EditorState::Idle;
        log::debug!("editor: committed '{label}', {} annotations", self.annotations.len());

        self.redraw();
        self.emit();
        LabelOutcome::Committed
    }

    /// Dismiss the prompt and drop the pending rectangle. Returns whether a
    /// prompt was open.
    pub fn cancel_label(&mut self) -> bool {
        if !self.is_prompting() {
            return false;
        }
        log::debug!("editor: label prompt dismissed, gesture discarded");
        self.state = EditorState::Idle;
        self.notice = Some(Notice::GestureCancelled);
        self.redraw();
        true
    }

    // ── History ─────────────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.state == EditorState::Idle && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state == EditorState::Idle && self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        if self.state != EditorState::Idle {
            return false;
        }
        let Some(previous) = self.history.undo(&self.annotations) else {
            return false;
        };
        self.annotations = previous;
        self.redraw();
        self.emit();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.state != EditorState::Idle {
            return false;
        }
        let Some(next) = self.history.redo(&self.annotations) else {
            return false;
        };
        self.annotations = next;
        self.redraw();
        self.emit();
        true
    }

    // ── Host updates ────────────────────────────────────────────────────────

    /// Adopt a list from the host. An echo of the current list is ignored;
    /// anything else resets history and drops an in-progress gesture.
    pub fn set_annotations(&mut self, annotations: AnnotationList) {
        if annotations == self.annotations {
            return;
        }
        log::debug!(
            "editor: host replaced annotations ({} entries), history reset",
            annotations.len()
        );
        self.annotations = annotations;
        self.history.clear();
        self.state = EditorState::Idle;
        self.redraw();
    }

    /// Switch to a new image reference. The current frame stays on screen
    /// until the new image finishes decoding.
    pub fn set_image(&mut self, source: ImageSource) {
        if self.image.source() == Some(&source) {
            return;
        }
        self.image = BaseImage::Pending(source);
    }

    /// Decode finished for `source`. Results for any other source are ignored.
    pub fn image_ready(&mut self, source: &ImageSource, width: u32, height: u32) {
        if self.image.source() != Some(source) {
            return;
        }
        self.image = BaseImage::Ready {
            source: source.clone(),
            width,
            height,
        };
        self.redraw();
    }

    /// Decode failed: the surface goes blank and stays that way.
    pub fn image_failed(&mut self, source: &ImageSource) {
        if self.image.source() != Some(source) {
            return;
        }
        self.image = BaseImage::Failed(source.clone());
        self.canvas.clear();
    }

    /// Topmost committed annotation under a canvas-local point.
    pub fn hit_test(&self, p: Point) -> Option<usize> {
        self.annotations.iter().rposition(|ann| ann.contains(p))
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn emit(&mut self) {
        (self.on_change)(&self.annotations);
    }

    fn redraw(&mut self) {
        let BaseImage::Ready { width, height, .. } = self.image else {
            return;
        };
        let (w, h) = match self.options.sizing {
            SurfaceSizing::Natural => (width, height),
            SurfaceSizing::Fixed { width, height } => (width, height),
        };
        self.canvas.resize(w, h);
        let pending = self.pending();
        render::redraw(
            &mut self.canvas,
            Some((width, height)),
            &self.annotations,
            pending.as_ref(),
            &self.options.style,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCommand;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor_with_log() -> (AnnotationEditor, Rc<RefCell<Vec<AnnotationList>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let editor = AnnotationEditor::new(AnnotationList::new(), EditorOptions::default(), move |list| {
            sink.borrow_mut().push(list.clone())
        });
        (editor, log)
    }

    fn ready(editor: &mut AnnotationEditor) {
        let source = ImageSource::new("a.png");
        editor.set_image(source.clone());
        editor.image_ready(&source, 200, 100);
    }

    #[test]
    fn moves_never_commit() {
        let (mut editor, log) = editor_with_log();
        ready(&mut editor);
        editor.pointer_down(Point::new(1.0, 1.0));
        for i in 0..10 {
            editor.pointer_move(Point::new(i as f32, i as f32));
        }
        assert!(editor.annotations().is_empty());
        assert!(log.borrow().is_empty());
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn pointer_down_ignored_mid_gesture() {
        let (mut editor, _) = editor_with_log();
        editor.pointer_down(Point::new(1.0, 1.0));
        assert_eq!(editor.pointer_down(Point::new(9.0, 9.0)), EditorResponse::Ignored);
        editor.pointer_up(Some(Point::new(3.0, 3.0)));
        assert_eq!(editor.pointer_down(Point::new(9.0, 9.0)), EditorResponse::Ignored);
        assert_eq!(editor.pointer_move(Point::new(9.0, 9.0)), EditorResponse::Ignored);
        assert_eq!(
            editor.pending().unwrap(),
            Annotation::from_drag(Point::new(1.0, 1.0), Point::new(3.0, 3.0), "")
        );
    }

    #[test]
    fn blank_label_reprompts() {
        let (mut editor, log) = editor_with_log();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up(Some(Point::new(4.0, 4.0)));
        assert_eq!(editor.submit_label("   "), LabelOutcome::Reprompt);
        assert!(editor.is_prompting());
        assert_eq!(editor.submit_label("  box "), LabelOutcome::Committed);
        assert_eq!(editor.annotations()[0].text, "box");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn submit_without_prompt_does_nothing() {
        let (mut editor, _) = editor_with_log();
        assert_eq!(editor.submit_label("x"), LabelOutcome::NotPrompting);
        assert!(!editor.cancel_label());
        assert!(editor.take_notice().is_none());
    }

    #[test]
    fn cancel_sets_notice_once() {
        let (mut editor, _) = editor_with_log();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up(None);
        assert!(editor.cancel_label());
        assert_eq!(editor.take_notice(), Some(Notice::GestureCancelled));
        assert_eq!(editor.take_notice(), None);
    }

    #[test]
    fn touch_end_without_points_uses_last_move() {
        let (mut editor, _) = editor_with_log();
        let bounds = CanvasBounds::new(10.0, 10.0);
        editor.handle_input(&InputEvent::TouchStart(vec![Point::new(20.0, 20.0)]), bounds);
        editor.handle_input(&InputEvent::TouchMove(vec![Point::new(50.0, 30.0)]), bounds);
        let response = editor.handle_input(&InputEvent::TouchEnd(Vec::new()), bounds);
        assert_eq!(response, EditorResponse::PromptLabel);
        let pending = editor.pending().unwrap();
        assert_eq!((pending.x, pending.y, pending.width, pending.height), (10.0, 10.0, 30.0, 10.0));
    }

    #[test]
    fn abort_drag_clears_pending_rectangle() {
        let (mut editor, _) = editor_with_log();
        ready(&mut editor);
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(8.0, 8.0));
        assert_eq!(editor.canvas().commands().len(), 2);

        assert!(editor.abort_drag());
        assert_eq!(editor.state(), &EditorState::Idle);
        assert_eq!(editor.canvas().commands().len(), 1);
        assert!(!editor.abort_drag());
    }

    #[test]
    fn undo_blocked_while_prompting() {
        let (mut editor, _) = editor_with_log();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up(None);
        editor.submit_label("a");
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up(None);
        assert!(!editor.can_undo());
        assert!(!editor.undo());
        assert_eq!(editor.annotations().len(), 1);
    }

    #[test]
    fn host_echo_keeps_history() {
        let (mut editor, log) = editor_with_log();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up(None);
        editor.submit_label("a");
        let emitted = log.borrow().last().cloned().unwrap();
        editor.set_annotations(emitted);
        assert!(editor.can_undo());

        editor.set_annotations(AnnotationList::new());
        assert!(!editor.can_undo());
        assert!(editor.annotations().is_empty());
    }

    #[test]
    fn frame_survives_until_new_image_decodes() {
        let (mut editor, _) = editor_with_log();
        ready(&mut editor);
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up(Some(Point::new(5.0, 5.0)));
        editor.submit_label("a");
        let frame = editor.canvas().clone();

        let next = ImageSource::new("b.png");
        editor.set_image(next.clone());
        assert_eq!(editor.canvas(), &frame);

        // A late result for the old image is ignored.
        editor.image_ready(&ImageSource::new("a.png"), 1, 1);
        assert_eq!(editor.canvas(), &frame);

        editor.image_ready(&next, 640, 480);
        assert_eq!(editor.canvas().size(), (640, 480));
        assert_eq!(
            editor.canvas().commands()[0],
            DrawCommand::Image { width: 640, height: 480 }
        );
    }

    #[test]
    fn failed_image_leaves_surface_blank() {
        let (mut editor, _) = editor_with_log();
        ready(&mut editor);
        assert!(!editor.canvas().is_blank());

        let broken = ImageSource::new("broken.png");
        editor.set_image(broken.clone());
        editor.image_failed(&broken);
        assert!(editor.canvas().is_blank());

        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(3.0, 3.0));
        assert!(editor.canvas().is_blank());
    }

    #[test]
    fn fixed_sizing_overrides_natural_size() {
        let options = EditorOptions {
            sizing: SurfaceSizing::Fixed { width: 300, height: 200 },
            ..EditorOptions::default()
        };
        let mut editor = AnnotationEditor::new(AnnotationList::new(), options, |_| {});
        assert_eq!(editor.canvas().size(), (300, 200));
        ready(&mut editor);
        assert_eq!(editor.canvas().size(), (300, 200));
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let list: AnnotationList = vec![
            Annotation::from_drag(Point::new(0.0, 0.0), Point::new(50.0, 50.0), "under"),
            Annotation::from_drag(Point::new(40.0, 40.0), Point::new(10.0, 10.0), "over"),
        ]
        .into();
        let editor = AnnotationEditor::new(list, EditorOptions::default(), |_| {});
        assert_eq!(editor.hit_test(Point::new(20.0, 20.0)), Some(1));
        assert_eq!(editor.hit_test(Point::new(45.0, 45.0)), Some(0));
        assert_eq!(editor.hit_test(Point::new(60.0, 60.0)), None);
    }
}
