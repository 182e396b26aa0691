//! Boundary to the renderer (§6.1): the core's view of where and how to draw
//! the scene this frame. The renderer hands back an opaque texture plus the
//! rectangle it drew into; the core never owns a render target itself.

use nalgebra::Vector3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Orbit camera parameterized the way the teacher's scene-preview camera is:
/// a focus point plus spherical offset, rather than a free-flying transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarCamera {
    pub focus: Vector3<f32>,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl PolarCamera {
    pub fn eye(&self) -> Vector3<f32> {
        let x = self.radius * self.phi.sin() * self.theta.cos();
        let y = self.radius * self.phi.cos();
        let z = self.radius * self.phi.sin() * self.theta.sin();
        self.focus + Vector3::new(x, y, z)
    }

    pub fn orbit(&mut self, delta_theta: f32, delta_phi: f32) {
        self.theta += delta_theta;
        const MIN_PHI: f32 = 0.01;
        const MAX_PHI: f32 = std::f32::consts::PI - 0.01;
        self.phi = (self.phi + delta_phi).clamp(MIN_PHI, MAX_PHI);
    }

    pub fn zoom(&mut self, delta_radius: f32) {
        const MIN_RADIUS: f32 = 0.1;
        self.radius = (self.radius + delta_radius).max(MIN_RADIUS);
    }
}

impl Default for PolarCamera {
    fn default() -> Self {
        Self {
            focus: Vector3::zeros(),
            radius: 5.0,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,
            znear: 0.05,
            zfar: 1000.0,
        }
    }
}

/// Everything the core hands the renderer collaborator for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameView {
    pub rect: Rect,
    pub camera: PolarCamera,
    pub background: [f32; 4],
}
