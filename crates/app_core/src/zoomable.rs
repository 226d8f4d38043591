//! Zoomable viewer state: pinch, pan, fling and double-tap zoom over one image.
//!
//! The view is driven by two inputs: gesture events from the input layer and
//! frame ticks from the render loop. It performs no I/O; malformed input is
//! ignored.

use crate::config::ViewerConfig;
use crate::transform::{ContentSize, Geometry, Rect, Transform, TransformState, Viewport};
use std::f32::consts::PI;
use std::time::{Duration, Instant};

/// Input from the gesture detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// A finger went down; interrupts animation and fling
    TouchDown,
    ScaleBegin,
    /// Incremental pinch factor around the focal point
    Scale { factor: f32, focus_x: f32, focus_y: f32 },
    ScaleEnd,
    /// Drag delta in viewport pixels (direction of finger movement)
    Scroll { dx: f32, dy: f32 },
    /// Release velocity in viewport pixels per second
    Fling { vx: f32, vy: f32 },
    DoubleTap { x: f32, y: f32 },
    TouchUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    AtRest,
    Scaling,
    Panning,
    Flinging,
    AnimatingZoom,
}

#[derive(Debug, Clone, Copy)]
struct ZoomAnimation {
    from: f32,
    to: f32,
    focus: (f32, f32),
    started: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
struct Fling {
    vx: f32,
    vy: f32,
    last: Option<Instant>,
}

/// Ease in and out, matching a cosine accelerate-decelerate curve
fn accelerate_decelerate(t: f32) -> f32 {
    ((t + 1.0) * PI).cos() / 2.0 + 0.5
}

pub struct ZoomableView {
    config: ViewerConfig,
    content: Option<ContentSize>,
    viewport: Option<Viewport>,
    geometry: Option<Geometry>,
    transform: Option<TransformState>,
    state: ViewState,
    animation: Option<ZoomAnimation>,
    fling: Option<Fling>,
}

impl ZoomableView {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            content: None,
            viewport: None,
            geometry: None,
            transform: None,
            state: ViewState::AtRest,
            animation: None,
            fling: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Relative zoom on top of fit-to-view, 1.0 when nothing is shown
    pub fn relative_scale(&self) -> f32 {
        self.transform.map(|t| t.scale).unwrap_or(self.config.min_scale)
    }

    pub fn is_zoomed(&self) -> bool {
        self.relative_scale() > self.config.min_scale
    }

    /// Current absolute transform, once both content and viewport are known
    pub fn transform(&self) -> Option<Transform> {
        Some(self.transform?.absolute(self.geometry.as_ref()?))
    }

    pub fn display_rect(&self) -> Option<Rect> {
        Some(self.transform?.display_rect(self.geometry.as_ref()?))
    }

    /// Install new content (or none); resets to fit-to-view
    pub fn set_content(&mut self, content: Option<ContentSize>) {
        self.content = content;
        self.rebuild();
    }

    /// Recompute fit-to-view for a new viewport size. Invalid sizes are ignored.
    pub fn on_viewport_resized(&mut self, width: f32, height: f32) {
        let Some(viewport) = Viewport::new(width, height) else {
            tracing::trace!(width, height, "Ignoring invalid viewport size");
            return;
        };
        self.viewport = Some(viewport);
        self.rebuild();
    }

    /// Cancel any motion and return to fit-to-view
    pub fn reset_to_safe_state(&mut self) {
        self.cancel_motion();
        self.transform = self.geometry.as_ref().map(TransformState::fit);
    }

    /// Drop the content when the view goes away
    pub fn cleanup(&mut self) {
        self.content = None;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.cancel_motion();
        self.geometry = match (self.content, self.viewport) {
            (Some(content), Some(viewport)) => Some(Geometry::new(content, viewport)),
            _ => None,
        };
        self.transform = self.geometry.as_ref().map(TransformState::fit);
    }

    fn cancel_motion(&mut self) {
        self.animation = None;
        self.fling = None;
        self.state = ViewState::AtRest;
    }

    pub fn on_gesture(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::TouchDown => {
                if matches!(self.state, ViewState::AnimatingZoom | ViewState::Flinging) {
                    self.cancel_motion();
                }
            }
            GestureEvent::ScaleBegin => {
                if self.geometry.is_some() {
                    self.cancel_motion();
                    self.state = ViewState::Scaling;
                }
            }
            GestureEvent::Scale { factor, focus_x, focus_y } => {
                self.pinch(factor, focus_x, focus_y)
            }
            GestureEvent::ScaleEnd => {
                if self.state == ViewState::Scaling {
                    self.state = ViewState::AtRest;
                }
            }
            GestureEvent::Scroll { dx, dy } => self.pan(dx, dy),
            GestureEvent::Fling { vx, vy } => self.start_fling(vx, vy),
            GestureEvent::DoubleTap { x, y } => self.double_tap(x, y),
            GestureEvent::TouchUp => {
                if self.state == ViewState::Panning {
                    self.state = ViewState::AtRest;
                }
            }
        }
    }

    fn pinch(&mut self, factor: f32, focus_x: f32, focus_y: f32) {
        if !(factor.is_finite() && factor > 0.0 && focus_x.is_finite() && focus_y.is_finite()) {
            return;
        }
        let (Some(geometry), Some(mut t)) = (self.geometry, self.transform) else {
            return;
        };
        if matches!(self.state, ViewState::AnimatingZoom | ViewState::Flinging) {
            self.cancel_motion();
        }
        self.state = ViewState::Scaling;

        let target = t.scale * factor;
        if target < self.config.min_scale {
            t = TransformState::fit(&geometry);
        } else {
            let applied = if target > self.config.max_scale {
                self.config.max_scale / t.scale
            } else {
                factor
            };
            t.zoom_about(applied, focus_x, focus_y);
            t.clamp(&geometry);
        }
        self.transform = Some(t);
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) || self.state == ViewState::Scaling {
            return;
        }
        if !self.is_zoomed() {
            return;
        }
        let (Some(geometry), Some(mut t)) = (self.geometry, self.transform) else {
            return;
        };
        self.cancel_motion();
        self.state = ViewState::Panning;
        t.translate(dx, dy);
        t.clamp(&geometry);
        self.transform = Some(t);
    }

    fn start_fling(&mut self, vx: f32, vy: f32) {
        if !(vx.is_finite() && vy.is_finite()) || self.state == ViewState::Scaling {
            return;
        }
        if !self.is_zoomed() {
            return;
        }
        let (Some(geometry), Some(t)) = (self.geometry, self.transform) else {
            return;
        };

        // Axes pinned to the centre cannot move
        let ((min_x, max_x), (min_y, max_y)) = geometry.translation_bounds(t.scale);
        let divisor = self.config.fling_velocity_divisor;
        let vx = if min_x < max_x { vx / divisor } else { 0.0 };
        let vy = if min_y < max_y { vy / divisor } else { 0.0 };

        self.cancel_motion();
        if vx.hypot(vy) < self.config.fling_stop_velocity {
            return;
        }
        self.fling = Some(Fling { vx, vy, last: None });
        self.state = ViewState::Flinging;
    }

    fn double_tap(&mut self, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        let (Some(geometry), Some(t)) = (self.geometry, self.transform) else {
            return;
        };
        self.cancel_motion();

        let (to, focus) = if self.is_zoomed() {
            (self.config.min_scale, geometry.viewport.center())
        } else {
            let fill = geometry.fill_scale(self.config.double_tap_min_zoom, self.config.max_scale);
            (fill, (x, y))
        };

        self.animation = Some(ZoomAnimation {
            from: t.scale,
            to,
            focus,
            started: None,
        });
        self.state = ViewState::AnimatingZoom;
    }

    /// Advance animation or fling to `now`. Returns whether another frame is needed.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        match self.state {
            ViewState::AnimatingZoom => self.step_animation(now),
            ViewState::Flinging => self.step_fling(now),
            _ => false,
        }
    }

    fn step_animation(&mut self, now: Instant) -> bool {
        let (Some(mut anim), Some(geometry), Some(mut t)) =
            (self.animation, self.geometry, self.transform)
        else {
            self.cancel_motion();
            return false;
        };

        let started = *anim.started.get_or_insert(now);
        let duration = Duration::from_millis(self.config.zoom_animation_ms);
        let progress = if duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(started).as_secs_f32() / duration.as_secs_f32()).min(1.0)
        };

        let scale = anim.from + (anim.to - anim.from) * accelerate_decelerate(progress);
        if t.scale > 0.0 {
            t.zoom_about(scale / t.scale, anim.focus.0, anim.focus.1);
            t.clamp(&geometry);
        }

        if progress >= 1.0 {
            if anim.to <= self.config.min_scale {
                t = TransformState::fit(&geometry);
            }
            self.transform = Some(t);
            self.cancel_motion();
            return false;
        }

        self.transform = Some(t);
        self.animation = Some(anim);
        true
    }

    fn step_fling(&mut self, now: Instant) -> bool {
        let (Some(mut fling), Some(geometry), Some(mut t)) =
            (self.fling, self.geometry, self.transform)
        else {
            self.cancel_motion();
            return false;
        };

        let Some(last) = fling.last.replace(now) else {
            self.fling = Some(fling);
            return true;
        };
        let dt = now.saturating_duration_since(last).as_secs_f32();

        t.translate(fling.vx * dt, fling.vy * dt);
        let ((min_x, max_x), (min_y, max_y)) = geometry.translation_bounds(t.scale);
        if t.translate_x <= min_x || t.translate_x >= max_x {
            fling.vx = 0.0;
        }
        if t.translate_y <= min_y || t.translate_y >= max_y {
            fling.vy = 0.0;
        }
        t.clamp(&geometry);
        self.transform = Some(t);

        let decay = (-self.config.fling_friction * dt).exp();
        fling.vx *= decay;
        fling.vy *= decay;

        if fling.vx.hypot(fling.vy) < self.config.fling_stop_velocity {
            self.cancel_motion();
            return false;
        }

        self.fling = Some(fling);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(cw: f32, ch: f32, vw: f32, vh: f32) -> ZoomableView {
        let mut v = ZoomableView::new(ViewerConfig::default());
        v.on_viewport_resized(vw, vh);
        v.set_content(ContentSize::new(cw, ch));
        v
    }

    fn pinch(v: &mut ZoomableView, factor: f32, x: f32, y: f32) {
        v.on_gesture(GestureEvent::ScaleBegin);
        v.on_gesture(GestureEvent::Scale { factor, focus_x: x, focus_y: y });
        v.on_gesture(GestureEvent::ScaleEnd);
    }

    /// Run frames 16ms apart until the view settles
    fn settle(v: &mut ZoomableView) -> Instant {
        let mut now = Instant::now();
        for _ in 0..1000 {
            if !v.on_frame(now) {
                break;
            }
            now += Duration::from_millis(16);
        }
        now
    }

    fn assert_no_gap(v: &ZoomableView, vw: f32, vh: f32) {
        let rect = v.display_rect().unwrap();
        if rect.width() > vw {
            assert!(rect.left <= 0.001 && rect.right >= vw - 0.001, "{rect:?}");
        }
        if rect.height() > vh {
            assert!(rect.top <= 0.001 && rect.bottom >= vh - 0.001, "{rect:?}");
        }
    }

    #[test]
    fn test_set_content_yields_fit() {
        let v = view(4000.0, 3000.0, 800.0, 800.0);
        let t = v.transform().unwrap();
        assert_eq!(t.scale, 0.2);
        assert_eq!(t.translate_x, 0.0);
        assert_eq!(t.translate_y, 100.0);
        assert_eq!(v.state(), ViewState::AtRest);
    }

    #[test]
    fn test_no_transform_without_viewport() {
        let mut v = ZoomableView::new(ViewerConfig::default());
        v.set_content(ContentSize::new(10.0, 10.0));
        assert!(v.transform().is_none());

        v.on_viewport_resized(0.0, 100.0);
        assert!(v.transform().is_none());

        v.on_viewport_resized(100.0, 100.0);
        assert!(v.transform().is_some());
    }

    #[test]
    fn test_pinch_scale_stays_in_range() {
        let mut v = view(1200.0, 900.0, 600.0, 600.0);
        let factors = [1.7, 0.4, 2.5, 3.1, 0.9, 0.2, 1.05, 8.0, 0.99, 1.3, 0.5, 4.0];
        let foci = [(0.0, 0.0), (300.0, 300.0), (599.0, 10.0), (42.0, 580.0)];

        for (i, factor) in factors.iter().cycle().take(200).enumerate() {
            let (x, y) = foci[i % foci.len()];
            v.on_gesture(GestureEvent::Scale { factor: *factor, focus_x: x, focus_y: y });
            let s = v.relative_scale();
            assert!((1.0..=3.0 + 1e-5).contains(&s), "scale {s}");
            assert_no_gap(&v, 600.0, 600.0);
        }
    }

    #[test]
    fn test_pinch_below_min_snaps_to_fit() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        let fit = v.transform().unwrap();
        pinch(&mut v, 2.0, 100.0, 100.0);
        pinch(&mut v, 0.3, 100.0, 100.0);
        assert_eq!(v.transform().unwrap(), fit);
    }

    #[test]
    fn test_pinch_above_max_clamps_to_max() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        pinch(&mut v, 10.0, 250.0, 250.0);
        assert!((v.relative_scale() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_malformed_pinch_ignored() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        let before = v.transform();
        for factor in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            v.on_gesture(GestureEvent::Scale { factor, focus_x: 1.0, focus_y: 1.0 });
        }
        assert_eq!(v.transform(), before);
    }

    #[test]
    fn test_pan_only_when_zoomed() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        let fit = v.transform();
        v.on_gesture(GestureEvent::Scroll { dx: 50.0, dy: 50.0 });
        assert_eq!(v.transform(), fit);
        assert_eq!(v.state(), ViewState::AtRest);

        pinch(&mut v, 2.0, 250.0, 250.0);
        v.on_gesture(GestureEvent::Scroll { dx: -100.0, dy: 0.0 });
        assert_eq!(v.state(), ViewState::Panning);
        assert_eq!(v.transform().unwrap().translate_x, -350.0);

        v.on_gesture(GestureEvent::Scroll { dx: 10_000.0, dy: -10_000.0 });
        assert_no_gap(&v, 500.0, 500.0);
        let t = v.transform().unwrap();
        assert_eq!(t.translate_x, 0.0);
        assert_eq!(t.translate_y, -500.0);

        v.on_gesture(GestureEvent::TouchUp);
        assert_eq!(v.state(), ViewState::AtRest);
    }

    #[test]
    fn test_letterboxed_axis_stays_centred_while_panning() {
        // Wide content: at 1.5x height still fits, so y stays centred
        let mut v = view(2000.0, 500.0, 1000.0, 1000.0);
        pinch(&mut v, 1.5, 500.0, 500.0);
        v.on_gesture(GestureEvent::Scroll { dx: 0.0, dy: 300.0 });
        let rect = v.display_rect().unwrap();
        assert!(((rect.top + rect.bottom) / 2.0 - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_fling_decays_and_never_opens_gap() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        pinch(&mut v, 3.0, 250.0, 250.0);
        v.on_gesture(GestureEvent::Fling { vx: 3000.0, vy: -4500.0 });
        assert_eq!(v.state(), ViewState::Flinging);

        let mut now = Instant::now();
        let mut frames = 0;
        while v.on_frame(now) {
            assert_no_gap(&v, 500.0, 500.0);
            now += Duration::from_millis(16);
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(v.state(), ViewState::AtRest);
        assert_no_gap(&v, 500.0, 500.0);
    }

    #[test]
    fn test_fling_ignored_at_fit() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        v.on_gesture(GestureEvent::Fling { vx: 3000.0, vy: 3000.0 });
        assert_eq!(v.state(), ViewState::AtRest);
        assert!(!v.on_frame(Instant::now()));
    }

    #[test]
    fn test_touch_down_cancels_fling() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        pinch(&mut v, 2.0, 250.0, 250.0);
        v.on_gesture(GestureEvent::Fling { vx: 5000.0, vy: 0.0 });
        let now = Instant::now();
        v.on_frame(now);
        v.on_frame(now + Duration::from_millis(16));
        let moved = v.transform();

        v.on_gesture(GestureEvent::TouchDown);
        assert_eq!(v.state(), ViewState::AtRest);
        assert!(!v.on_frame(now + Duration::from_millis(32)));
        assert_eq!(v.transform(), moved);
    }

    #[test]
    fn test_double_tap_toggles_zoom() {
        // Landscape in square viewport: fill scale 2.0
        let mut v = view(2000.0, 1000.0, 1000.0, 1000.0);
        let fit = v.transform().unwrap();

        v.on_gesture(GestureEvent::DoubleTap { x: 300.0, y: 500.0 });
        assert_eq!(v.state(), ViewState::AnimatingZoom);
        settle(&mut v);
        assert_eq!(v.state(), ViewState::AtRest);
        assert!((v.relative_scale() - 2.0).abs() < 1e-4);
        assert_no_gap(&v, 1000.0, 1000.0);

        v.on_gesture(GestureEvent::DoubleTap { x: 10.0, y: 10.0 });
        settle(&mut v);
        assert_eq!(v.transform().unwrap(), fit);
    }

    #[test]
    fn test_animation_runs_for_configured_duration() {
        let mut v = view(1000.0, 1000.0, 1000.0, 1000.0);
        v.on_gesture(GestureEvent::DoubleTap { x: 500.0, y: 500.0 });

        let start = Instant::now();
        assert!(v.on_frame(start));
        assert!(v.on_frame(start + Duration::from_millis(150)));
        let mid = v.relative_scale();
        assert!(mid > 1.0 && mid < 1.1, "{mid}");
        assert!(!v.on_frame(start + Duration::from_millis(300)));
        assert!((v.relative_scale() - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_touch_down_cancels_animation() {
        let mut v = view(2000.0, 1000.0, 1000.0, 1000.0);
        v.on_gesture(GestureEvent::DoubleTap { x: 500.0, y: 500.0 });
        let start = Instant::now();
        v.on_frame(start);
        v.on_frame(start + Duration::from_millis(100));

        v.on_gesture(GestureEvent::TouchDown);
        assert_eq!(v.state(), ViewState::AtRest);
        let s = v.relative_scale();
        assert!(s > 1.0 && s < 2.0);
    }

    #[test]
    fn test_content_change_resets() {
        let mut v = view(1000.0, 1000.0, 500.0, 500.0);
        pinch(&mut v, 2.0, 0.0, 0.0);
        v.set_content(ContentSize::new(500.0, 250.0));
        assert_eq!(v.relative_scale(), 1.0);
        assert_eq!(v.transform().unwrap().translate_y, 125.0);

        v.on_gesture(GestureEvent::DoubleTap { x: 1.0, y: 1.0 });
        v.reset_to_safe_state();
        assert_eq!(v.state(), ViewState::AtRest);

        v.cleanup();
        assert!(v.transform().is_none());
    }

    #[test]
    fn test_interpolator_endpoints() {
        assert!(accelerate_decelerate(0.0).abs() < 1e-6);
        assert!((accelerate_decelerate(0.5) - 0.5).abs() < 1e-6);
        assert!((accelerate_decelerate(1.0) - 1.0).abs() < 1e-6);
    }
}
