//! Input events flowing into the layer stack (§4.6). The host translates its
//! own windowing/input system into these before calling `LayerStack::on_event`.

use nalgebra::{Vector2, Vector3};
use scene_core::id::Id;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    MouseDown {
        button: MouseButton,
        pos: Vector2<f32>,
    },
    MouseUp {
        button: MouseButton,
        pos: Vector2<f32>,
    },
    MouseMoved {
        pos: Vector2<f32>,
        /// The id [`crate::pick::hit_test`] resolved under the cursor this
        /// move, if any.
        hover: Option<Id>,
        /// The exact world-space surface point on that entity's mesh, if
        /// the hit entity is a `Mesh` (§6.1: the core does its own CPU
        /// ray/mesh hit test using the rectangle and mouse position the
        /// host hands it). `None` for non-mesh hovers or no hover at all.
        mesh_hit: Option<Vector3<f32>>,
    },
    KeyDown(Key),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(u32),
}
