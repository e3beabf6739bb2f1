//! Drawing surface and the redraw pass.
//!
//! [`Canvas`] records what would be painted as a flat list of
//! [`DrawCommand`]s. The app replays that list onto an egui painter each
//! frame; tests inspect it directly.

use crate::model::{Annotation, Point};
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Surface size when no image has been decoded.
pub const FALLBACK_SIZE: (u32, u32) = (800, 600);

// ── Colors & style ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_egui(&self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
            (self.a * 255.0) as u8,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color4,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStyle {
    /// Committed rectangles.
    pub committed: Stroke,
    /// The rectangle being dragged.
    pub pending: Stroke,
    pub label_color: Color4,
    pub label_size: f32,
    /// Label anchor relative to the annotation's drag origin. The anchor is
    /// the left end of the text baseline.
    pub label_offset: Point,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            committed: Stroke {
                width: 2.0,
                color: Color4::rgb(1.0, 0.0, 0.0),
            },
            pending: Stroke {
                width: 2.0,
                color: Color4::rgb(0.0, 0.0, 1.0),
            },
            label_color: Color4::rgb(1.0, 0.0, 0.0),
            label_size: 16.0,
            label_offset: Point::new(0.0, -5.0),
        }
    }
}

// ── Canvas ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Base image at natural size, top-left at the canvas origin.
    Image { width: u32, height: u32 },
    /// Rectangle outline; extents may be negative.
    StrokeRect {
        origin: Point,
        width: f32,
        height: f32,
        stroke: Stroke,
    },
    Text {
        anchor: Point,
        text: String,
        color: Color4,
        size: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(FALLBACK_SIZE.0, FALLBACK_SIZE.1)
    }
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn draw_image(&mut self, width: u32, height: u32) {
        self.commands.push(DrawCommand::Image { width, height });
    }

    pub fn stroke_rect(&mut self, origin: Point, width: f32, height: f32, stroke: Stroke) {
        self.commands.push(DrawCommand::StrokeRect {
            origin,
            width,
            height,
            stroke,
        });
    }

    pub fn fill_text(&mut self, anchor: Point, text: &str, color: Color4, size: f32) {
        self.commands.push(DrawCommand::Text {
            anchor,
            text: text.to_owned(),
            color,
            size,
        });
    }
}

/// Clear `canvas` and paint the image, every committed annotation with its
/// label, then the pending rectangle on top.
///
/// `image` is the decoded image's natural size; without it nothing is drawn
/// and the canvas keeps whatever it last showed.
pub fn redraw(
    canvas: &mut Canvas,
    image: Option<(u32, u32)>,
    annotations: &[Annotation],
    pending: Option<&Annotation>,
    style: &RenderStyle,
) {
    let Some((width, height)) = image else {
        return;
    };

    canvas.clear();
    canvas.draw_image(width, height);

    for ann in annotations {
        canvas.stroke_rect(ann.origin(), ann.width, ann.height, style.committed);
        let anchor = Point::new(ann.x + style.label_offset.x, ann.y + style.label_offset.y);
        canvas.fill_text(anchor, &ann.text, style.label_color, style.label_size);
    }

    if let Some(rect) = pending {
        canvas.stroke_rect(rect.origin(), rect.width, rect.height, style.pending);
    }
}
