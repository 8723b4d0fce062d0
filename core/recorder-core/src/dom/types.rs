//! Shared geometry types: viewport and bounding box.

use serde::{Deserialize, Serialize};

/// Viewport information for position-based lookups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportInfo {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportInfo {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Bounding box for an element in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point of this bounding box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the center sits at or below `fraction` of the viewport height.
    pub fn is_in_lower_region(&self, viewport: &ViewportInfo, fraction: f64) -> bool {
        let (_, center_y) = self.center();
        center_y >= viewport.height as f64 * fraction && center_y <= viewport.height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_region_uses_center() {
        let viewport = ViewportInfo::default();
        let toolbar = BoundingBox::new(600.0, 660.0, 40.0, 40.0);
        let header = BoundingBox::new(600.0, 10.0, 40.0, 40.0);
        let offscreen = BoundingBox::new(600.0, 900.0, 40.0, 40.0);
        assert!(toolbar.is_in_lower_region(&viewport, 0.5));
        assert!(!header.is_in_lower_region(&viewport, 0.5));
        assert!(!offscreen.is_in_lower_region(&viewport, 0.5));
    }
}
