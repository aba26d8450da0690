//! Floating picture-in-picture window geometry
//!
//! Pure geometry with no knowledge of playback. Coordinates are logical
//! pixels with the origin at the top-left of the viewport.

/// Which side the window rests against after a drag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipWindow {
    pub x: f32,
    pub y: f32,
    pub size: Size,
    viewport: Size,
    margin: f32,
}

impl PipWindow {
    /// Place a window against the right edge, near the bottom of the viewport.
    pub fn new(viewport: Size, size: Size, margin: f32) -> Self {
        let mut window = Self {
            x: viewport.width - size.width - margin,
            y: viewport.height - size.height - margin * 4.0,
            size,
            viewport,
            margin,
        };
        window.clamp();
        window
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.size.width / 2.0
    }

    /// Live drag update, kept inside the viewport
    pub fn drag_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        self.clamp();
    }

    /// The edge nearer the window's centre; ties go right.
    pub fn nearest_edge(&self) -> Edge {
        if self.center_x() < self.viewport.width / 2.0 {
            Edge::Left
        } else {
            Edge::Right
        }
    }

    /// Snap horizontally to the nearer edge on drag release.
    pub fn snap_to_nearest_edge(&mut self) -> Edge {
        let edge = self.nearest_edge();
        self.x = match edge {
            Edge::Left => self.margin,
            Edge::Right => self.viewport.width - self.size.width - self.margin,
        };
        self.clamp();
        edge
    }

    /// Re-fit after a viewport change (rotation, split screen).
    pub fn set_viewport(&mut self, viewport: Size) {
        let edge = self.nearest_edge();
        self.viewport = viewport;
        self.clamp();
        if edge == Edge::Right {
            self.x = viewport.width - self.size.width - self.margin;
            self.clamp();
        }
    }

    fn clamp(&mut self) {
        let max_x = (self.viewport.width - self.size.width - self.margin).max(self.margin);
        let max_y = (self.viewport.height - self.size.height - self.margin).max(self.margin);
        self.x = self.x.clamp(self.margin.min(max_x), max_x);
        self.y = self.y.clamp(self.margin.min(max_y), max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> PipWindow {
        PipWindow::new(Size::new(400.0, 800.0), Size::new(120.0, 200.0), 10.0)
    }

    #[test]
    fn starts_against_the_right_edge() {
        let w = window();
        assert_eq!(w.x, 270.0);
        assert_eq!(w.nearest_edge(), Edge::Right);
    }

    #[test]
    fn drag_is_clamped_to_viewport() {
        let mut w = window();
        w.drag_by(-1000.0, 5000.0);
        assert_eq!(w.x, 10.0);
        assert_eq!(w.y, 590.0);
    }

    #[test]
    fn release_snaps_to_nearer_edge() {
        let mut w = window();
        // centre at 270 + 60 - 150 = 180 < 200
        w.drag_by(-150.0, 0.0);
        assert_eq!(w.snap_to_nearest_edge(), Edge::Left);
        assert_eq!(w.x, 10.0);

        // centre at 10 + 60 + 140 = 210 > 200
        w.drag_by(140.0, 0.0);
        assert_eq!(w.snap_to_nearest_edge(), Edge::Right);
        assert_eq!(w.x, 270.0);
    }

    #[test]
    fn rotation_keeps_the_docked_edge() {
        let mut w = window();
        w.set_viewport(Size::new(800.0, 400.0));
        assert_eq!(w.x, 670.0);
        assert_eq!(w.y, 190.0);
    }
}
