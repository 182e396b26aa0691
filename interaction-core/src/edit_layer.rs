//! The base layer (§4.6): always present at the bottom of the stack, renders
//! the whole scene and handles plain click-to-select. Never pops itself.

use scene_core::commit::CommitStore;
use scene_core::id::Id;

use crate::drawable::{emit_drawables, Drawable};
use crate::input::{InputEvent, MouseButton};
use crate::layer::Layer;

pub struct EditLayer {
    ground_visible: bool,
    hover: Option<Id>,
}

impl Default for EditLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditLayer {
    pub fn new() -> Self {
        Self {
            ground_visible: true,
            hover: None,
        }
    }

    pub fn set_ground_visible(&mut self, visible: bool) {
        self.ground_visible = visible;
    }
}

impl Layer for EditLayer {
    fn on_event(&mut self, event: &InputEvent, store: &mut CommitStore) -> bool {
        match *event {
            InputEvent::MouseMoved { hover, .. } => {
                self.hover = hover;
                true
            }
            InputEvent::MouseDown {
                button: MouseButton::Left,
                ..
            } => {
                let graph = store.scratch_mut();
                graph.deselect_all();
                if let Some(id) = self.hover {
                    graph.select(id);
                }
                true
            }
            _ => false,
        }
    }

    fn tick(&mut self, _dt: f32) {}

    fn draw(&self, store: &CommitStore, hover: Option<Id>) -> Vec<Drawable> {
        emit_drawables(store.scratch(), hover, self.ground_visible)
    }

    fn request_pop(&self) -> bool {
        false
    }
}
