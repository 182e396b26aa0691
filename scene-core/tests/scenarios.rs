//! End-to-end concrete scenarios exercising actions, commits and lowering
//! together, as distinct from the per-module unit tests.

use nalgebra::Vector3;

use scene_core::actions;
use scene_core::boundary::{BodyRef, ExternalModel, FrameRef, JointProtoRef, JointRef};
use scene_core::commit::CommitStore;
use scene_core::entity::{Entity, MeshHandle, Mesh as MeshEntity};
use scene_core::id::EMPTY_ID;
use scene_core::lowering::{lower, LoweringOptions};
use scene_core::math::Transform;

#[derive(Default)]
struct CountingModel {
    next_ref: u64,
    bodies: Vec<String>,
    joints: Vec<String>,
    meshes_attached: usize,
    mesh_offsets: Vec<Transform>,
}

impl ExternalModel for CountingModel {
    fn set_show_frames(&mut self, _show: bool) {}
    fn ground_frame(&self) -> FrameRef {
        FrameRef(0)
    }
    fn add_body(&mut self, name: &str, _mass: f32) -> BodyRef {
        self.bodies.push(name.to_string());
        self.next_ref += 1;
        BodyRef(self.next_ref)
    }
    fn body_frame(&self, body: BodyRef) -> FrameRef {
        FrameRef(body.0)
    }
    fn add_frame_on_ground(&mut self, _name: &str, _offset: Transform) -> FrameRef {
        self.next_ref += 1;
        FrameRef(self.next_ref)
    }
    fn add_frame_on_body(&mut self, _body: BodyRef, _name: &str, _offset: Transform) -> FrameRef {
        self.next_ref += 1;
        FrameRef(self.next_ref)
    }
    fn add_frame_on_joint(&mut self, _joint: JointRef, _name: &str, _offset: Transform) -> FrameRef {
        self.next_ref += 1;
        FrameRef(self.next_ref)
    }
    fn clone_joint_prototype(&mut self, type_index: u32) -> JointProtoRef {
        JointProtoRef(type_index as u64)
    }
    fn add_joint(
        &mut self,
        _proto: JointProtoRef,
        name: &str,
        _parent_frame: FrameRef,
        _child_frame: FrameRef,
    ) -> JointRef {
        self.joints.push(name.to_string());
        self.next_ref += 1;
        JointRef(self.next_ref)
    }
    fn name_joint_coordinate(&mut self, _joint: JointRef, _suffix: &str, _full_name: &str) {}
    fn attach_geometry(&mut self, _frame: FrameRef, _mesh: MeshHandle, _name: &str, offset: Transform) {
        self.meshes_attached += 1;
        self.mesh_offsets.push(offset);
    }
    fn add_station(&mut self, _frame: FrameRef, _name: &str, _local_pos: Vector3<f32>) {}
    fn add_marker(&mut self, _frame: FrameRef, _name: &str, _local_pos: Vector3<f32>) {}
    fn invalidate_all_properties(&mut self) {}
    fn finalize_connections(&mut self) {}
    fn initialize(&mut self) {}
}

/// S1: empty graph, one ground-attached body, lower.
#[test]
fn s1_ground_attached_body_lowers_cleanly() {
    let mut store = CommitStore::new();
    let b0 = actions::add_body(&mut store, Vector3::zeros(), EMPTY_ID);
    assert_eq!(store.scratch().try_get(b0).unwrap().label(), "Body0");
    assert!(!store.can_redo());

    let mut model = CountingModel::default();
    lower(store.scratch(), &mut model, LoweringOptions::default()).unwrap();
    assert_eq!(model.bodies, vec!["Body0"]);
    assert_eq!(model.joints, vec!["Body0_to_ground"]);
    assert_eq!(model.meshes_attached, 0);
}

/// S2: two meshes reparented onto the same body, lowered with zero-offset
/// geometry since the body sits at the world origin.
#[test]
fn s2_two_meshes_share_a_body_with_zero_offsets() {
    let mut store = CommitStore::new();
    let graph = store.scratch_mut();
    let m0 = graph.allocate_id();
    graph
        .add(Entity::Mesh(MeshEntity {
            id: m0,
            label: "m0".into(),
            mesh_handle: MeshHandle(0),
            source_path: "m0.obj".into(),
            transform: Transform::identity(),
            parent: scene_core::id::GROUND_ID,
            has_physical_size: true,
        }))
        .unwrap();
    let m1 = graph.allocate_id();
    graph
        .add(Entity::Mesh(MeshEntity {
            id: m1,
            label: "m1".into(),
            mesh_handle: MeshHandle(1),
            source_path: "m1.obj".into(),
            transform: Transform::identity(),
            parent: scene_core::id::GROUND_ID,
            has_physical_size: true,
        }))
        .unwrap();
    store.commit("added meshes");

    let b0 = actions::add_body(&mut store, Vector3::zeros(), EMPTY_ID);
    assert!(actions::assign_mesh_parents(&mut store, &[m0, m1], b0));

    let mut model = CountingModel::default();
    lower(store.scratch(), &mut model, LoweringOptions::default()).unwrap();
    assert_eq!(model.bodies, vec!["Body0"]);
    assert_eq!(model.meshes_attached, 2);
    for offset in &model.mesh_offsets {
        assert!(offset.is_identity());
    }
}

/// S4: cascade-deleting a body pulls in its joint and any mesh that still
/// cross-references it as parent -- the cascade follows cross-references in
/// either direction (§4.1 algorithms), so a mesh reparented onto the body is
/// just as much a dependent as the joint is.
#[test]
fn s4_cascade_delete_pulls_in_joint_and_reparented_mesh() {
    let mut store = CommitStore::new();
    let graph = store.scratch_mut();
    let m0 = graph.allocate_id();
    graph
        .add(Entity::Mesh(MeshEntity {
            id: m0,
            label: "m0".into(),
            mesh_handle: MeshHandle(0),
            source_path: "m0.obj".into(),
            transform: Transform::identity(),
            parent: scene_core::id::GROUND_ID,
            has_physical_size: true,
        }))
        .unwrap();
    store.commit("added mesh");
    let b0 = actions::add_body(&mut store, Vector3::zeros(), EMPTY_ID);
    assert!(actions::assign_mesh_parents(&mut store, &[m0], b0));
    let joint_id = actions::create_joint(&mut store, b0, scene_core::id::GROUND_ID).unwrap();

    assert!(actions::delete_element(&mut store, b0));

    assert!(store.scratch().try_get(b0).is_none());
    assert!(store.scratch().try_get(joint_id).is_none());
    assert!(store.scratch().try_get(m0).is_none());
}

/// S5: undo, checkout onto the same commit, then a fresh commit drops the
/// abandoned redo branch permanently.
#[test]
fn s5_checkout_then_commit_drops_redo_branch() {
    let mut store = CommitStore::new();
    let _b0 = actions::add_body(&mut store, Vector3::zeros(), EMPTY_ID);
    let c1 = store.current();
    let _b1 = actions::add_body(&mut store, Vector3::new(1.0, 0.0, 0.0), EMPTY_ID);

    store.undo().unwrap();
    assert_eq!(store.current(), c1);
    store.checkout(c1).unwrap();

    let _b2 = actions::add_body(&mut store, Vector3::new(2.0, 0.0, 0.0), EMPTY_ID);
    let c3 = store.current();

    assert_eq!(store.branch_head(), c3);
    assert!(!store.can_redo());
}
