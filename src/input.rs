use crate::model::Point;

/// Top-left corner of the drawing surface in device coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasBounds {
    pub left: f32,
    pub top: f32,
}

impl CanvasBounds {
    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }

    /// Device position to canvas-local position.
    pub fn to_canvas(&self, device: Point) -> Point {
        Point::new(device.x - self.left, device.y - self.top)
    }
}

/// Raw pointer or touch input, positions in device coordinates.
///
/// Touch variants carry the touch points reported with the event; only
/// the first one is used.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    TouchStart(Vec<Point>),
    TouchMove(Vec<Point>),
    TouchEnd(Vec<Point>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Start,
    Move,
    End,
}

impl InputEvent {
    pub fn phase(&self) -> Phase {
        match self {
            InputEvent::PointerDown(_) | InputEvent::TouchStart(_) => Phase::Start,
            InputEvent::PointerMove(_) | InputEvent::TouchMove(_) => Phase::Move,
            InputEvent::PointerUp(_) | InputEvent::TouchEnd(_) => Phase::End,
        }
    }

    /// Canvas-local position for either event family.
    ///
    /// `None` when a touch event arrives with no touch points, which is
    /// what a touch-end reports once the last finger has lifted.
    pub fn resolve(&self, bounds: CanvasBounds) -> Option<Point> {
        let device = match self {
            InputEvent::PointerDown(p) | InputEvent::PointerMove(p) | InputEvent::PointerUp(p) => {
                *p
            }
            InputEvent::TouchStart(touches)
            | InputEvent::TouchMove(touches)
            | InputEvent::TouchEnd(touches) => *touches.first()?,
        };
        Some(bounds.to_canvas(device))
    }
}
