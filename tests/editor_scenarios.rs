use annotate_task::editor::{AnnotationEditor, EditorOptions, EditorState, LabelOutcome, Notice};
use annotate_task::image_source::ImageSource;
use annotate_task::input::{CanvasBounds, InputEvent};
use annotate_task::model::{Annotation, AnnotationList, Point};
use annotate_task::render::DrawCommand;
use std::cell::RefCell;
use std::rc::Rc;

struct Harness {
    editor: AnnotationEditor,
    emitted: Rc<RefCell<Vec<AnnotationList>>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_annotations(AnnotationList::new())
    }

    fn with_annotations(annotations: AnnotationList) -> Self {
        let emitted = Rc::new(RefCell::new(Vec::new()));
        let sink = emitted.clone();
        let mut editor = AnnotationEditor::new(annotations, EditorOptions::default(), move |list: &AnnotationList| {
            sink.borrow_mut().push(list.clone());
        });
        let source = ImageSource::new("task.png");
        editor.set_image(source.clone());
        editor.image_ready(&source, 400, 300);
        Self { editor, emitted }
    }

    fn drag(&mut self, from: (f32, f32), to: (f32, f32)) {
        let bounds = CanvasBounds::default();
        self.editor
            .handle_input(&InputEvent::PointerDown(Point::new(from.0, from.1)), bounds);
        self.editor
            .handle_input(&InputEvent::PointerMove(Point::new(to.0, to.1)), bounds);
        self.editor
            .handle_input(&InputEvent::PointerUp(Point::new(to.0, to.1)), bounds);
    }

    fn draw(&mut self, from: (f32, f32), to: (f32, f32), label: &str) {
        self.drag(from, to);
        assert_eq!(self.editor.submit_label(label), LabelOutcome::Committed);
    }

    fn last_emitted(&self) -> Option<AnnotationList> {
        self.emitted.borrow().last().cloned()
    }
}

fn cat() -> Annotation {
    Annotation {
        x: 10.0,
        y: 10.0,
        width: 40.0,
        height: 30.0,
        text: "cat".into(),
    }
}

fn rects(commands: &[DrawCommand]) -> Vec<(Point, f32, f32)> {
    commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::StrokeRect {
                origin,
                width,
                height,
                ..
            } => Some((*origin, *width, *height)),
            _ => None,
        })
        .collect()
}

fn labels(commands: &[DrawCommand]) -> Vec<(Point, String)> {
    commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::Text { anchor, text, .. } => Some((*anchor, text.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_a_commit_pushes_previous_list() {
    let mut h = Harness::new();
    h.draw((10.0, 10.0), (50.0, 40.0), "cat");

    let expected: AnnotationList = vec![cat()].into();
    assert_eq!(h.editor.annotations(), &expected);
    assert_eq!(h.editor.history().undo_stack(), [AnnotationList::new()]);
    assert!(h.editor.history().redo_stack().is_empty());
    assert_eq!(h.last_emitted(), Some(expected));
}

#[test]
fn scenario_b_undo_moves_current_to_redo() {
    let mut h = Harness::new();
    h.draw((10.0, 10.0), (50.0, 40.0), "cat");

    assert!(h.editor.undo());
    assert!(h.editor.annotations().is_empty());
    assert!(h.editor.history().undo_stack().is_empty());
    assert_eq!(
        h.editor.history().redo_stack(),
        [AnnotationList::from(vec![cat()])]
    );
    assert_eq!(h.last_emitted(), Some(AnnotationList::new()));
}

#[test]
fn scenario_c_redo_restores() {
    let mut h = Harness::new();
    h.draw((10.0, 10.0), (50.0, 40.0), "cat");
    h.editor.undo();

    assert!(h.editor.redo());
    assert_eq!(h.editor.annotations(), &AnnotationList::from(vec![cat()]));
    assert!(h.editor.history().redo_stack().is_empty());
    assert_eq!(h.emitted.borrow().len(), 3);
}

#[test]
fn scenario_d_zero_area_drag_commits() {
    let mut h = Harness::new();
    h.draw((5.0, 5.0), (5.0, 5.0), "dot");

    assert_eq!(
        h.editor.annotations()[0],
        Annotation {
            x: 5.0,
            y: 5.0,
            width: 0.0,
            height: 0.0,
            text: "dot".into(),
        }
    );
}

#[test]
fn scenario_e_cancel_leaves_everything_alone() {
    let mut h = Harness::new();
    h.draw((10.0, 10.0), (50.0, 40.0), "cat");
    let list_before = h.editor.annotations().clone();
    let undo_before = h.editor.history().undo_stack().to_vec();
    let emitted_before = h.emitted.borrow().len();

    h.drag((100.0, 100.0), (150.0, 120.0));
    assert!(h.editor.is_prompting());
    assert!(h.editor.cancel_label());

    assert_eq!(h.editor.annotations(), &list_before);
    assert_eq!(h.editor.history().undo_stack(), undo_before.as_slice());
    assert_eq!(h.editor.state(), &EditorState::Idle);
    assert!(h.editor.pending().is_none());
    assert_eq!(h.editor.take_notice(), Some(Notice::GestureCancelled));
    assert_eq!(h.emitted.borrow().len(), emitted_before);
}

#[test]
fn redraw_is_idempotent() {
    let mut h = Harness::new();
    h.draw((10.0, 10.0), (50.0, 40.0), "cat");
    h.draw((60.0, 60.0), (20.0, 90.0), "dog");
    let first = h.editor.canvas().clone();

    // An echo from the host and a stray move outside a drag both redraw or no-op.
    let current = h.editor.annotations().clone();
    h.editor.set_annotations(current);
    h.editor.pointer_move(Point::new(3.0, 3.0));
    let source = ImageSource::new("task.png");
    h.editor.image_ready(&source, 400, 300);

    let second = h.editor.canvas();
    assert_eq!(rects(first.commands()), rects(second.commands()));
    assert_eq!(labels(first.commands()), labels(second.commands()));
    assert_eq!(
        labels(second.commands()),
        [
            (Point::new(10.0, 5.0), "cat".to_owned()),
            (Point::new(60.0, 55.0), "dog".to_owned()),
        ]
    );
}

#[test]
fn undo_redo_are_exact_inverses() {
    let mut h = Harness::new();
    let drags = [
        ((1.0, 1.0), (10.0, 10.0), "a"),
        ((20.0, 20.0), (5.0, 5.0), "b"),
        ((7.0, 7.0), (7.0, 7.0), "c"),
        ((0.0, 50.0), (30.0, 10.0), "d"),
    ];
    for (from, to, label) in drags {
        h.draw(from, to, label);
    }
    let final_list = h.editor.annotations().clone();
    let n = drags.len();

    for _ in 0..n {
        assert!(h.editor.undo());
    }
    assert!(h.editor.annotations().is_empty());
    assert!(!h.editor.undo());

    for _ in 0..n {
        assert!(h.editor.redo());
    }
    assert_eq!(h.editor.annotations(), &final_list);
    assert!(!h.editor.redo());
}

#[test]
fn new_commit_invalidates_redo() {
    let mut h = Harness::new();
    h.draw((0.0, 0.0), (1.0, 1.0), "a");
    h.draw((0.0, 0.0), (2.0, 2.0), "b");
    h.editor.undo();
    h.editor.undo();
    assert_eq!(h.editor.history().redo_stack().len(), 2);

    h.draw((0.0, 0.0), (3.0, 3.0), "c");
    assert!(h.editor.history().redo_stack().is_empty());
    assert!(!h.editor.can_redo());
}

#[test]
fn cancelled_prompt_never_commits() {
    let mut h = Harness::new();
    for _ in 0..3 {
        h.drag((0.0, 0.0), (9.0, 9.0));
        assert_eq!(h.editor.submit_label(""), LabelOutcome::Reprompt);
        assert_eq!(h.editor.submit_label(" \t "), LabelOutcome::Reprompt);
        h.editor.cancel_label();
    }
    assert!(h.editor.annotations().is_empty());
    assert!(h.editor.history().undo_stack().is_empty());
    assert!(h.emitted.borrow().is_empty());
}

#[test]
fn negative_extents_commit_and_render() {
    let mut h = Harness::new();
    h.draw((100.0, 100.0), (40.0, 60.0), "left-up");

    let ann = &h.editor.annotations()[0];
    assert_eq!((ann.x, ann.y, ann.width, ann.height), (100.0, 100.0, -60.0, -40.0));
    assert_eq!(
        rects(h.editor.canvas().commands()),
        [(Point::new(100.0, 100.0), -60.0, -40.0)]
    );
    assert_eq!(h.editor.hit_test(Point::new(70.0, 80.0)), Some(0));
}

#[test]
fn snapshots_survive_later_commits() {
    let mut h = Harness::new();
    h.draw((0.0, 0.0), (1.0, 1.0), "a");
    let snapshot = h.editor.annotations().clone();
    h.draw((0.0, 0.0), (2.0, 2.0), "b");
    h.draw((0.0, 0.0), (3.0, 3.0), "c");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(h.editor.history().undo_stack()[1], snapshot);
    assert!(h.editor.history().undo_stack()[1].ptr_eq(&snapshot));
}

#[test]
fn pending_rectangle_drawn_last_in_cool_color() {
    let mut h = Harness::with_annotations(vec![cat()].into());
    let style = EditorOptions::default().style;
    let bounds = CanvasBounds::new(100.0, 50.0);
    h.editor
        .handle_input(&InputEvent::TouchStart(vec![Point::new(110.0, 60.0)]), bounds);
    h.editor
        .handle_input(&InputEvent::TouchMove(vec![Point::new(130.0, 90.0)]), bounds);

    let commands = h.editor.canvas().commands();
    assert!(matches!(commands.first(), Some(DrawCommand::Image { .. })));
    match commands.last() {
        Some(DrawCommand::StrokeRect {
            origin,
            width,
            height,
            stroke,
        }) => {
            assert_eq!(*origin, Point::new(10.0, 10.0));
            assert_eq!((*width, *height), (20.0, 30.0));
            assert_eq!(*stroke, style.pending);
        }
        other => panic!("expected pending rectangle, got {other:?}"),
    }
    // Only the committed annotation carries a label.
    assert_eq!(labels(commands).len(), 1);
    assert_eq!(h.editor.annotations().len(), 1);
}
