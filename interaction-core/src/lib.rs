//! Interaction state machine, rendering emission and the mesh-loader and
//! renderer boundaries for the biomechanical model assembly editor (§4.6,
//! §4.7, §5, §6). Depends on `scene-core` for the graph, commit store and
//! edit actions it drives; owns no mesh data and no renderer of its own.

pub mod camera;
pub mod drawable;
pub mod easing;
pub mod edit_layer;
pub mod input;
pub mod layer;
pub mod mesh_loader;
pub mod pick;
