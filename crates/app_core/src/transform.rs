//! Fit-to-view geometry and translation clamping for the zoom viewer

/// Intrinsic pixel size of displayed content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentSize {
    pub width: f32,
    pub height: f32,
}

impl ContentSize {
    /// `None` unless both sides are positive and finite
    pub fn new(width: f32, height: f32) -> Option<Self> {
        valid_extent(width, height).then_some(Self { width, height })
    }
}

/// Size of the area the content is drawn into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Option<Self> {
        valid_extent(width, height).then_some(Self { width, height })
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

fn valid_extent(width: f32, height: f32) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

/// Absolute transform handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Content pixels to viewport pixels
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

/// Content rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Content and viewport sizes together with the derived fit scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub content: ContentSize,
    pub viewport: Viewport,
    /// Scale at which the whole content fits the viewport
    pub base_scale: f32,
}

impl Geometry {
    pub fn new(content: ContentSize, viewport: Viewport) -> Self {
        let base_scale =
            (viewport.width / content.width).min(viewport.height / content.height);
        Self {
            content,
            viewport,
            base_scale,
        }
    }

    /// Displayed content size at `relative_scale`
    pub fn scaled_size(&self, relative_scale: f32) -> (f32, f32) {
        let s = self.base_scale * relative_scale;
        (self.content.width * s, self.content.height * s)
    }

    /// Relative scale at which the content covers the viewport on its
    /// tighter axis, floored at `min_zoom` and capped at `max_scale`
    pub fn fill_scale(&self, min_zoom: f32, max_scale: f32) -> f32 {
        let width_fill = self.viewport.width / (self.content.width * self.base_scale);
        let height_fill = self.viewport.height / (self.content.height * self.base_scale);
        width_fill.max(height_fill).max(min_zoom).min(max_scale)
    }

    /// Allowed translation range on each axis at `relative_scale`
    pub fn translation_bounds(&self, relative_scale: f32) -> ((f32, f32), (f32, f32)) {
        let (w, h) = self.scaled_size(relative_scale);
        (
            axis_bounds(w, self.viewport.width),
            axis_bounds(h, self.viewport.height),
        )
    }
}

/// Range for the content's leading edge on one axis.
///
/// Content no larger than the viewport is pinned to the centre.
pub fn axis_bounds(content_len: f32, view_len: f32) -> (f32, f32) {
    if content_len <= view_len {
        let centered = (view_len - content_len) / 2.0;
        (centered, centered)
    } else {
        (view_len - content_len, 0.0)
    }
}

/// Relative scale plus absolute translation of the content's top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl TransformState {
    /// Whole content visible and centred
    pub fn fit(geometry: &Geometry) -> Self {
        let mut state = Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        };
        state.clamp(geometry);
        state
    }

    /// Multiply the scale by `factor` keeping the content point under
    /// `(focus_x, focus_y)` in place
    pub fn zoom_about(&mut self, factor: f32, focus_x: f32, focus_y: f32) {
        self.translate_x = focus_x - (focus_x - self.translate_x) * factor;
        self.translate_y = focus_y - (focus_y - self.translate_y) * factor;
        self.scale *= factor;
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.translate_x += dx;
        self.translate_y += dy;
    }

    /// Apply the per-axis clamping rule
    pub fn clamp(&mut self, geometry: &Geometry) {
        let ((min_x, max_x), (min_y, max_y)) = geometry.translation_bounds(self.scale);
        self.translate_x = self.translate_x.clamp(min_x, max_x);
        self.translate_y = self.translate_y.clamp(min_y, max_y);
    }

    pub fn absolute(&self, geometry: &Geometry) -> Transform {
        Transform {
            scale: geometry.base_scale * self.scale,
            translate_x: self.translate_x,
            translate_y: self.translate_y,
        }
    }

    pub fn display_rect(&self, geometry: &Geometry) -> Rect {
        let (w, h) = geometry.scaled_size(self.scale);
        Rect {
            left: self.translate_x,
            top: self.translate_y,
            right: self.translate_x + w,
            bottom: self.translate_y + h,
        }
    }
}
