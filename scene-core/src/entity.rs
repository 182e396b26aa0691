//! The closed set of scene entity kinds (§3.3) and their shared machinery:
//! label sanitization, class descriptors, capability flags and
//! cross-reference metadata.

use std::path::PathBuf;

use nalgebra::Vector3;

use crate::id::Id;
use crate::math::Transform;

/// Opaque handle to a loaded mesh resource. The core never parses or owns
/// mesh data itself (§1, out of scope); it only carries whatever handle the
/// mesh-loading collaborator produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ground,
    Mesh,
    Body,
    Joint,
    Station,
}

pub struct ClassDescriptor {
    pub name_singular: &'static str,
    pub name_plural: &'static str,
    pub icon: char,
    pub description: &'static str,
}

impl EntityKind {
    pub fn class(self) -> ClassDescriptor {
        match self {
            EntityKind::Ground => ClassDescriptor {
                name_singular: "Ground",
                name_plural: "Ground",
                icon: '⊕',
                description: "The immovable world-frame root.",
            },
            EntityKind::Mesh => ClassDescriptor {
                name_singular: "Mesh",
                name_plural: "Meshes",
                icon: '△',
                description: "A decorative or measurement mesh attached to a frame.",
            },
            EntityKind::Body => ClassDescriptor {
                name_singular: "Body",
                name_plural: "Bodies",
                icon: '■',
                description: "A rigid body with mass.",
            },
            EntityKind::Joint => ClassDescriptor {
                name_singular: "Joint",
                name_plural: "Joints",
                icon: '⊙',
                description: "A kinematic connection between two bodies.",
            },
            EntityKind::Station => ClassDescriptor {
                name_singular: "Station",
                name_plural: "Stations",
                icon: '•',
                description: "A labelled point of interest on a frame.",
            },
        }
    }
}

/// Sanitizes a raw, user-typed label down to `[A-Za-z0-9_-]` (§3.4.5).
pub fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossrefDirection {
    ToParent,
    ToChild,
}

/// One cross-reference slot on an entity: a stable index, a human label for
/// error messages, a direction, and the current target.
#[derive(Clone, Copy, Debug)]
pub struct CrossrefSlot {
    pub index: usize,
    pub label: &'static str,
    pub direction: CrossrefDirection,
    pub target: Id,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointType {
    Weld,
    Free,
    Pin,
    Custom(u32),
}

impl JointType {
    pub fn from_type_index(index: u32) -> Self {
        match index {
            0 => JointType::Weld,
            1 => JointType::Free,
            2 => JointType::Pin,
            other => JointType::Custom(other),
        }
    }

    pub fn type_index(self) -> u32 {
        match self {
            JointType::Weld => 0,
            JointType::Free => 1,
            JointType::Pin => 2,
            JointType::Custom(i) => i,
        }
    }

    /// Per-DoF coordinate suffixes this joint type exposes, gated by the
    /// known degrees of freedom table in §4.4.
    pub fn dof_suffixes(self) -> &'static [&'static str] {
        match self {
            JointType::Free => &["_tx", "_ty", "_tz", "_rx", "_ry", "_rz"],
            JointType::Pin => &["_rz"],
            JointType::Weld | JointType::Custom(_) => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ground {
    pub id: Id,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub id: Id,
    pub label: String,
    pub mesh_handle: MeshHandle,
    pub source_path: PathBuf,
    pub transform: Transform,
    pub parent: Id,
    pub has_physical_size: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub id: Id,
    pub label: String,
    pub transform: Transform,
    pub mass: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    pub id: Id,
    pub label: String,
    pub joint_type: JointType,
    pub transform: Transform,
    /// User-assigned name, may be empty (§3.3); when empty the lowering
    /// procedure derives `"<child>_to_<parent>"`.
    pub user_name: String,
    pub parent: Id,
    pub child: Id,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub id: Id,
    pub label: String,
    pub position: Vector3<f32>,
    pub parent: Id,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Ground(Ground),
    Mesh(Mesh),
    Body(Body),
    Joint(Joint),
    Station(Station),
}

/// Narrows a shared or exclusive `Entity` reference to one specific variant,
/// underpinning `SceneGraph::get_as` / `iter_as`. `None` on a mismatch is the
/// documented discriminator, not an error (§4.1).
pub trait Variant: Sized {
    fn kind() -> EntityKind;
    fn from_entity(e: &Entity) -> Option<&Self>;
    fn from_entity_mut(e: &mut Entity) -> Option<&mut Self>;
}

macro_rules! impl_variant {
    ($t:ident) => {
        impl Variant for $t {
            fn kind() -> EntityKind {
                EntityKind::$t
            }

            fn from_entity(e: &Entity) -> Option<&Self> {
                match e {
                    Entity::$t(v) => Some(v),
                    _ => None,
                }
            }

            fn from_entity_mut(e: &mut Entity) -> Option<&mut Self> {
                match e {
                    Entity::$t(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_variant!(Ground);
impl_variant!(Mesh);
impl_variant!(Body);
impl_variant!(Joint);
impl_variant!(Station);

impl Entity {
    pub fn id(&self) -> Id {
        match self {
            Entity::Ground(e) => e.id,
            Entity::Mesh(e) => e.id,
            Entity::Body(e) => e.id,
            Entity::Joint(e) => e.id,
            Entity::Station(e) => e.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Ground(_) => EntityKind::Ground,
            Entity::Mesh(_) => EntityKind::Mesh,
            Entity::Body(_) => EntityKind::Body,
            Entity::Joint(_) => EntityKind::Joint,
            Entity::Station(_) => EntityKind::Station,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Entity::Ground(_) => "Ground",
            Entity::Mesh(e) => &e.label,
            Entity::Body(e) => &e.label,
            Entity::Joint(e) => &e.label,
            Entity::Station(e) => &e.label,
        }
    }

    /// Sets the label, sanitizing it first. A no-op on Ground (§3.4.1).
    pub fn set_label(&mut self, raw: &str) {
        let clean = sanitize_label(raw);
        match self {
            Entity::Ground(_) => {}
            Entity::Mesh(e) => e.label = clean,
            Entity::Body(e) => e.label = clean,
            Entity::Joint(e) => e.label = clean,
            Entity::Station(e) => e.label = clean,
        }
    }

    pub fn can_select(&self) -> bool {
        !matches!(self, Entity::Ground(_))
    }

    pub fn can_delete(&self) -> bool {
        !matches!(self, Entity::Ground(_))
    }

    pub fn can_translate(&self) -> bool {
        !matches!(self, Entity::Ground(_))
    }

    pub fn can_rotate(&self) -> bool {
        matches!(self, Entity::Mesh(_) | Entity::Body(_) | Entity::Joint(_))
    }

    pub fn can_scale(&self) -> bool {
        matches!(self, Entity::Mesh(_))
    }

    /// World position regardless of variant (Station has no rotation/scale,
    /// so only position is meaningful there).
    pub fn position(&self) -> Vector3<f32> {
        match self {
            Entity::Ground(_) => Vector3::zeros(),
            Entity::Mesh(e) => e.transform.position,
            Entity::Body(e) => e.transform.position,
            Entity::Joint(e) => e.transform.position,
            Entity::Station(e) => e.position,
        }
    }

    pub fn set_position(&mut self, pos: Vector3<f32>) {
        match self {
            Entity::Ground(_) => {}
            Entity::Mesh(e) => e.transform.position = pos,
            Entity::Body(e) => e.transform.position = pos,
            Entity::Joint(e) => e.transform.position = pos,
            Entity::Station(e) => e.position = pos,
        }
    }

    pub fn transform(&self) -> Transform {
        match self {
            Entity::Ground(_) => Transform::identity(),
            Entity::Mesh(e) => e.transform,
            Entity::Body(e) => e.transform,
            Entity::Joint(e) => e.transform,
            Entity::Station(e) => Transform {
                position: e.position,
                ..Transform::identity()
            },
        }
    }

    pub fn set_transform(&mut self, t: Transform) {
        match self {
            Entity::Ground(_) => {}
            Entity::Mesh(e) => e.transform = t,
            Entity::Body(e) => e.transform = t.with_scale_pinned(),
            Entity::Joint(e) => e.transform = t.with_scale_pinned(),
            Entity::Station(e) => e.position = t.position,
        }
    }

    /// All cross-reference slots this entity carries, in their declared
    /// index order (§3.3's "Cross-refs (direction)" column).
    pub fn crossrefs(&self) -> Vec<CrossrefSlot> {
        match self {
            Entity::Ground(_) | Entity::Body(_) => vec![],
            Entity::Mesh(e) => vec![CrossrefSlot {
                index: 0,
                label: "parent",
                direction: CrossrefDirection::ToParent,
                target: e.parent,
            }],
            Entity::Joint(e) => vec![
                CrossrefSlot {
                    index: 0,
                    label: "parent",
                    direction: CrossrefDirection::ToParent,
                    target: e.parent,
                },
                CrossrefSlot {
                    index: 1,
                    label: "child",
                    direction: CrossrefDirection::ToChild,
                    target: e.child,
                },
            ],
            Entity::Station(e) => vec![CrossrefSlot {
                index: 0,
                label: "parent",
                direction: CrossrefDirection::ToParent,
                target: e.parent,
            }],
        }
    }

    /// Overwrites the cross-reference at `index`. Returns `false` if there is
    /// no such index (caller maps that to `BadIndex`).
    pub fn set_crossref(&mut self, index: usize, new_target: Id) -> bool {
        match (self, index) {
            (Entity::Mesh(e), 0) => {
                e.parent = new_target;
                true
            }
            (Entity::Joint(e), 0) => {
                e.parent = new_target;
                true
            }
            (Entity::Joint(e), 1) => {
                e.child = new_target;
                true
            }
            (Entity::Station(e), 0) => {
                e.parent = new_target;
                true
            }
            _ => false,
        }
    }
}
