use cgmath::{InnerSpace, Matrix4, Vector3, Zero};
use log::{debug, warn};

use crate::{
    body::Body,
    constants::{
        CAMERA_SMOOTHING, FRAME_PADDING, MAX_ZOOM, MIN_FRAME_EXTENT, MIN_ZOOM,
        OUTLIER_MULTIPLIER_RANGE, ZOOM_OFFSET_RANGE,
    },
    sim::collision::CollisionReport,
    vector::Vector2,
};

/// Anything the camera can frame.
pub trait Framed {
    fn position(&self) -> Vector2;
    fn mass(&self) -> f32;
    fn radius(&self) -> f32;
}

impl Framed for Body {
    fn position(&self) -> Vector2 {
        self.position
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// 2D camera that follows the center of mass (or one body) and zooms to fit the scene.
///
/// The first [`Camera::update`] after construction or [`Camera::reset`] snaps straight to the
/// target; later updates converge exponentially at a frame-rate independent speed.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vector2,
    target: Vector2,
    zoom: f32,
    zoom_offset: f32,
    smoothing: f32,
    aspect: f32,
    outlier_multiplier: f32,
    followed: Option<usize>,
    initialized: bool,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            position: Vector2::zero(),
            target: Vector2::zero(),
            zoom: 1.0,
            zoom_offset: 1.0,
            smoothing: CAMERA_SMOOTHING,
            aspect: aspect_ratio(width, height),
            outlier_multiplier: 3.0,
            followed: None,
            initialized: false,
        }
    }

    pub fn update<B: Framed>(&mut self, bodies: &[B], dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            warn!("ignoring camera update with dt {dt}");
            return;
        }
        if bodies.is_empty() {
            return;
        }

        let inliers = compute_inliers(bodies, self.outlier_multiplier);

        let followed = self.followed;
        match followed {
            Some(idx) if idx < bodies.len() => self.target = bodies[idx].position(),
            _ => {
                if let Some(idx) = followed {
                    debug!("followed body {idx} is gone, tracking center of mass");
                    self.followed = None;
                }
                self.target = center_of_mass(inliers.iter().map(|&i| &bodies[i]))
                    .or_else(|| center_of_mass(bodies.iter()))
                    .unwrap_or(self.target);
            }
        }

        let target_zoom = clamp_zoom(compute_optimal_zoom(bodies, &inliers) * self.zoom_offset);

        if !self.initialized {
            self.position = self.target;
            self.zoom = target_zoom;
            self.initialized = true;
            return;
        }

        let lerp = 1.0 - (-self.smoothing * dt).exp();
        self.position += (self.target - self.position) * lerp;

        let zoom_lerp = 1.0 - (-self.smoothing * 0.5 * dt).exp();
        self.zoom = clamp_zoom(self.zoom + (target_zoom - self.zoom) * zoom_lerp);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            warn!("ignoring NaN zoom");
            return;
        }
        self.zoom = clamp_zoom(zoom);
    }

    /// Scales the user zoom multiplier applied on top of the automatic zoom.
    pub fn zoom_by(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            warn!("ignoring zoom factor {factor}");
            return;
        }
        self.zoom_offset =
            (self.zoom_offset * factor).clamp(ZOOM_OFFSET_RANGE.0, ZOOM_OFFSET_RANGE.1);
    }

    /// Shifts the camera in world units. Tracking pulls it back over the following updates.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            warn!("ignoring pan by ({dx}, {dy})");
            return;
        }
        self.position += Vector2::new(dx, dy);
    }

    /// `None` tracks the center of mass.
    pub fn set_followed_body(&mut self, idx: Option<usize>) {
        self.followed = idx;
    }

    pub fn followed_body(&self) -> Option<usize> {
        self.followed
    }

    /// Carries the followed index over a step that merged bodies. Following an absorbed body
    /// falls back to the center of mass.
    pub fn follow_across_merges(&mut self, report: &CollisionReport) {
        if let Some(idx) = self.followed {
            self.followed = report.remap_index(idx);
            if self.followed.is_none() {
                debug!("followed body {idx} was absorbed, tracking center of mass");
            }
        }
    }

    /// Cycles center of mass -> body 0 -> ... -> body n-1 -> center of mass.
    pub fn follow_next(&mut self, n_bodies: usize) {
        self.followed = match self.followed {
            None if n_bodies > 0 => Some(0),
            Some(idx) if idx + 1 < n_bodies => Some(idx + 1),
            _ => None,
        };
    }

    /// Reverse of [`Camera::follow_next`].
    pub fn follow_previous(&mut self, n_bodies: usize) {
        self.followed = match self.followed {
            None if n_bodies > 0 => Some(n_bodies - 1),
            Some(idx) if idx > 0 && idx <= n_bodies => Some(idx - 1),
            _ => None,
        };
    }

    pub fn set_outlier_multiplier(&mut self, multiplier: f32) {
        if multiplier.is_nan() {
            return;
        }
        self.outlier_multiplier =
            multiplier.clamp(OUTLIER_MULTIPLIER_RANGE.0, OUTLIER_MULTIPLIER_RANGE.1);
    }

    pub fn outlier_multiplier(&self) -> f32 {
        self.outlier_multiplier
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Back to an uninitialized camera tracking the center of mass at unit zoom.
    pub fn reset(&mut self) {
        self.position = Vector2::zero();
        self.target = Vector2::zero();
        self.zoom = 1.0;
        self.zoom_offset = 1.0;
        self.followed = None;
        self.initialized = false;
    }

    /// `Scale(zoom) * Translate(-position)`: the translation happens in world units.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_nonuniform_scale(self.zoom, self.zoom, 1.0)
            * Matrix4::from_translation(Vector3::new(-self.position.x, -self.position.y, 0.0))
    }

    /// View matrix with the horizontal axis corrected for the viewport aspect ratio.
    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_nonuniform_scale(1.0 / self.aspect, 1.0, 1.0) * self.view_matrix()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().into(),
        }
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn target(&self) -> Vector2 {
        self.target
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_offset(&self) -> f32 {
        self.zoom_offset
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

fn aspect_ratio(width: f32, height: f32) -> f32 {
    let aspect = width / height;
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Mass-weighted mean position, `None` without positive mass.
fn center_of_mass<'a, B: Framed + 'a>(bodies: impl Iterator<Item = &'a B>) -> Option<Vector2> {
    let mut weighted = [0.0f64; 2];
    let mut total = 0.0f64;
    for b in bodies {
        let m = b.mass() as f64;
        if m <= 0.0 {
            continue;
        }
        let p = b.position();
        weighted[0] += p.x as f64 * m;
        weighted[1] += p.y as f64 * m;
        total += m;
    }
    if total > 0.0 {
        Some(Vector2::new(
            (weighted[0] / total) as f32,
            (weighted[1] / total) as f32,
        ))
    } else {
        None
    }
}

/// Indices of bodies within `multiplier` times the median distance to the overall center of
/// mass.
pub fn compute_inliers<B: Framed>(bodies: &[B], multiplier: f32) -> Vec<usize> {
    if bodies.is_empty() {
        return Vec::new();
    }

    let com = center_of_mass(bodies.iter()).unwrap_or_else(Vector2::zero);
    let dists: Vec<f32> = bodies
        .iter()
        .map(|b| (b.position() - com).magnitude())
        .collect();

    let mut sorted = dists.clone();
    let mid = sorted.len() / 2;
    let (_, median, _) = sorted.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    let median = if *median > 0.0 { *median } else { 1e-4 };

    let threshold = multiplier * median;
    dists
        .iter()
        .enumerate()
        .filter(|&(_, d)| *d <= threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Zoom that fits the padded bounding box of `inliers` (all bodies when empty) into the
/// `[-1, 1]` viewport.
pub fn compute_optimal_zoom<B: Framed>(bodies: &[B], inliers: &[usize]) -> f32 {
    if bodies.is_empty() {
        return 1.0;
    }

    let mut min = Vector2::new(f32::MAX, f32::MAX);
    let mut max = Vector2::new(f32::MIN, f32::MIN);
    let mut extend = |b: &B| {
        let p = b.position();
        let r = b.radius();
        min.x = min.x.min(p.x - r);
        min.y = min.y.min(p.y - r);
        max.x = max.x.max(p.x + r);
        max.y = max.y.max(p.y + r);
    };
    if inliers.is_empty() {
        bodies.iter().for_each(&mut extend);
    } else {
        inliers.iter().for_each(|&i| extend(&bodies[i]));
    }

    let width = ((max.x - min.x) * FRAME_PADDING).max(MIN_FRAME_EXTENT);
    let height = ((max.y - min.y) * FRAME_PADDING).max(MIN_FRAME_EXTENT);

    clamp_zoom((2.0 / width).min(2.0 / height))
}
