//! Small boundary traits that let the edit-action layer ask geometric
//! questions about opaque mesh handles without owning mesh data itself
//! (§1 scope, §6.3). A host application backs these with whatever mesh
//! library it actually parsed the file with.

use std::path::PathBuf;

use nalgebra::Vector3;

use crate::entity::MeshHandle;
use crate::math::Transform;

/// Per-mesh geometric queries, all in the mesh's own local space. The core
/// transforms the result into world space using the mesh entity's transform.
pub trait MeshGeometryProvider {
    fn local_bounds_center(&self, handle: MeshHandle) -> Option<Vector3<f32>>;
    fn local_vertex_average_center(&self, handle: MeshHandle) -> Option<Vector3<f32>>;
    fn local_mass_center(&self, handle: MeshHandle) -> Option<Vector3<f32>>;
    /// Nearest ray/triangle intersection against the mesh's actual geometry,
    /// given a ray already transformed into the mesh's local space. Returns
    /// the ray parameter of the hit, if any; `interaction-core`'s picking
    /// layers use this to resolve clicks against real surfaces rather than a
    /// proxy bounding volume.
    fn raycast_local(
        &self,
        handle: MeshHandle,
        origin_local: Vector3<f32>,
        dir_local: Vector3<f32>,
    ) -> Option<f32>;
}

/// Opaque handles into the external musculoskeletal-model library (§6.3).
/// The core never looks inside these; it only passes them back to
/// [`ExternalModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyRef(pub u64);
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRef(pub u64);
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JointProtoRef(pub u64);
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JointRef(pub u64);
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshRef(pub u64);
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StationRef(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyOrGround {
    Ground,
    Body(BodyRef),
}

/// The construction half of the external-model boundary, driven by
/// [`crate::lowering::lower`]. One instance of `dyn ExternalModel` represents
/// one in-progress external model (§4.4); the host creates it empty and hands
/// it to `lower`.
pub trait ExternalModel {
    fn set_show_frames(&mut self, show: bool);
    fn ground_frame(&self) -> FrameRef;
    fn add_body(&mut self, name: &str, mass: f32) -> BodyRef;
    /// A body is itself a physical frame; this is that frame, with no offset.
    fn body_frame(&self, body: BodyRef) -> FrameRef;
    fn add_frame_on_ground(&mut self, name: &str, offset: Transform) -> FrameRef;
    fn add_frame_on_body(&mut self, body: BodyRef, name: &str, offset: Transform) -> FrameRef;
    fn add_frame_on_joint(&mut self, joint: JointRef, name: &str, offset: Transform) -> FrameRef;
    fn clone_joint_prototype(&mut self, type_index: u32) -> JointProtoRef;
    fn add_joint(
        &mut self,
        proto: JointProtoRef,
        name: &str,
        parent_frame: FrameRef,
        child_frame: FrameRef,
    ) -> JointRef;
    fn name_joint_coordinate(&mut self, joint: JointRef, suffix: &str, full_name: &str);
    fn attach_geometry(&mut self, frame: FrameRef, mesh: MeshHandle, name: &str, offset: Transform);
    fn add_station(&mut self, frame: FrameRef, name: &str, local_pos: Vector3<f32>);
    fn add_marker(&mut self, frame: FrameRef, name: &str, local_pos: Vector3<f32>);
    fn invalidate_all_properties(&mut self);
    fn finalize_connections(&mut self);
    fn initialize(&mut self);
}

/// The enumeration half of the boundary, driven by
/// [`crate::lowering::import`] (§4.5). A separate trait because import reads
/// an already-initialized model the host loaded from disk; it is never the
/// same value as the `ExternalModel` being constructed by `lower`.
pub trait ExternalModelSource {
    fn bodies(&self) -> Vec<BodyRef>;
    fn joints(&self) -> Vec<JointRef>;
    fn meshes(&self) -> Vec<MeshRef>;
    fn stations(&self) -> Vec<StationRef>;

    fn body_name(&self, body: BodyRef) -> String;
    fn body_world_transform(&self, body: BodyRef) -> Transform;

    fn joint_type_index(&self, joint: JointRef) -> u32;
    fn joint_name(&self, joint: JointRef) -> String;
    fn joint_parent(&self, joint: JointRef) -> Option<BodyOrGround>;
    fn joint_child(&self, joint: JointRef) -> Option<BodyOrGround>;

    fn mesh_owner(&self, mesh: MeshRef) -> Option<BodyOrGround>;
    fn mesh_source_path(&self, mesh: MeshRef) -> Option<PathBuf>;
    fn mesh_handle(&self, mesh: MeshRef) -> MeshHandle;
    fn mesh_world_transform(&self, mesh: MeshRef) -> Transform;

    fn station_owner(&self, station: StationRef) -> Option<BodyOrGround>;
    fn station_name(&self, station: StationRef) -> String;
    fn station_local_position(&self, station: StationRef) -> Vector3<f32>;
}
