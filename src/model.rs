use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

// ── Geometry ────────────────────────────────────────────────────────────────

/// A position in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ── Annotation ──────────────────────────────────────────────────────────────

/// A labeled rectangle anchored at the point where the drag started.
///
/// `width` and `height` keep the sign of the drag direction, so a drag up
/// or to the left yields negative extents. Nothing normalizes them; use
/// [`Annotation::bounds`] when an axis-aligned min/max box is needed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: String,
}

impl Annotation {
    /// Geometry of a drag from `start` to `end`, with the given label.
    pub fn from_drag(start: Point, end: Point, text: impl Into<String>) -> Self {
        Self {
            x: start.x,
            y: start.y,
            width: end.x - start.x,
            height: end.y - start.y,
            text: text.into(),
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Opposite corner of the drag origin.
    pub fn corner(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Normalized `(min, max)` corners.
    pub fn bounds(&self) -> (Point, Point) {
        let (a, b) = (self.origin(), self.corner());
        (
            Point::new(a.x.min(b.x), a.y.min(b.y)),
            Point::new(a.x.max(b.x), a.y.max(b.y)),
        )
    }

    /// Edge-inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        let (min, max) = self.bounds();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }
}

// ── Annotation list ─────────────────────────────────────────────────────────

/// Committed annotations for one image, in creation order.
///
/// The backing slice is shared and never mutated: every change produces a
/// new list, so a snapshot held by the history stacks cannot observe later
/// edits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Annotation>", into = "Vec<Annotation>")]
pub struct AnnotationList(Arc<[Annotation]>);

impl AnnotationList {
    pub fn new() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// A new list holding every annotation of `self` followed by `annotation`.
    pub fn appended(&self, annotation: Annotation) -> Self {
        let mut items = Vec::with_capacity(self.0.len() + 1);
        items.extend_from_slice(&self.0);
        items.push(annotation);
        Self(items.into())
    }

    /// Whether both lists share the same backing allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn to_vec(&self) -> Vec<Annotation> {
        self.0.to_vec()
    }
}

impl Default for AnnotationList {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for AnnotationList {
    type Target = [Annotation];

    fn deref(&self) -> &[Annotation] {
        &self.0
    }
}

impl From<Vec<Annotation>> for AnnotationList {
    fn from(items: Vec<Annotation>) -> Self {
        Self(items.into())
    }
}

impl From<AnnotationList> for Vec<Annotation> {
    fn from(list: AnnotationList) -> Self {
        list.to_vec()
    }
}

impl FromIterator<Annotation> for AnnotationList {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Tasks ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// One image assigned to one user for annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(default)]
    pub annotations: AnnotationList,
    #[serde(default)]
    pub status: TaskStatus,
    pub assigned_to: String,
    #[serde(default)]
    pub created_at: String,
}

/// The fields a save writes back to the task store.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskUpdate {
    pub annotations: AnnotationList,
    pub status: TaskStatus,
}
