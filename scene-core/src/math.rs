//! Transforms and bounding volumes shared by every entity in the scene graph.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// Position-rotation-scale transform. Composition order is
/// position * rotation * scale, matching the order every entity applies its
/// own fields in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.position == Vector3::zeros()
            && self.rotation == UnitQuaternion::identity()
            && self.scale == Vector3::new(1.0, 1.0, 1.0)
    }

    pub fn with_scale_pinned(mut self) -> Self {
        self.scale = Vector3::new(1.0, 1.0, 1.0);
        self
    }

    /// Composes `self` then `rhs`, i.e. `rhs` is expressed in `self`'s local
    /// frame. Used to combine a parent transform with a child offset.
    pub fn then(&self, rhs: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&rhs.position)),
            rotation: self.rotation * rhs.rotation,
            scale: self.scale.component_mul(&rhs.scale),
        }
    }

    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Vector3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_position = -(inv_rotation * self.position).component_mul(&inv_scale);
        Transform {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::new_translation(&self.position);
        let r = self.rotation.to_homogeneous();
        let s = Matrix4::new_nonuniform_scaling(&self.scale);
        t * r * s
    }

    /// Same rigid composition as [`Transform::then`] but with scale stripped
    /// from both sides first, exactly as the lowering procedure's offset-frame
    /// computation requires (§4.4).
    pub fn rigid_relative_to(&self, other: &Transform) -> Transform {
        let a = Transform {
            scale: Vector3::new(1.0, 1.0, 1.0),
            ..*self
        };
        let b = Transform {
            scale: Vector3::new(1.0, 1.0, 1.0),
            ..*other
        };
        a.inverse().then(&b)
    }

    /// Euler XYZ extraction used to name per-DoF coordinate channels during
    /// lowering.
    pub fn euler_xyz(&self) -> (f32, f32, f32) {
        self.rotation.euler_angles()
    }
}

/// Axis-aligned bounding box. Union over an empty box returns the other box
/// unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn from_point(p: Vector3<f32>) -> Self {
        Self { min: p, max: p }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Aabb {
            min: Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }
}
