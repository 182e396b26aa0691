//! The Interaction State Machine (§4.6): a single-threaded cooperative stack
//! of layers, always rooted at the edit layer, with modal layers pushed on
//! top for picking. Grounded on the teacher's deep `InteractionMode` trait
//! hierarchy (`editor::interaction::InteractionMode`), collapsed to the
//! spec's flat three-method contract per the Design Notes ("Deep inheritance
//! for layers").

use scene_core::commit::CommitStore;
use scene_core::id::Id;

use crate::drawable::Drawable;
use crate::input::InputEvent;

/// One element of the interaction stack. A transition (push or pop) is only
/// ever observed between frames: `tick` runs, then `request_pop` is
/// consulted, then the next frame's `on_event`/`draw` see the new top.
pub trait Layer {
    fn on_event(&mut self, event: &InputEvent, store: &mut CommitStore) -> bool;
    fn tick(&mut self, dt: f32);
    fn draw(&self, store: &CommitStore, hover: Option<Id>) -> Vec<Drawable>;
    fn request_pop(&self) -> bool;
}

/// Owns the layer stack and the one Commit Store all layers mutate. Always
/// has at least one layer (the base edit layer) and never pops it.
pub struct LayerStack {
    store: CommitStore,
    layers: Vec<Box<dyn Layer>>,
}

impl LayerStack {
    pub fn new(base: Box<dyn Layer>) -> Self {
        Self {
            store: CommitStore::new(),
            layers: vec![base],
        }
    }

    pub fn store(&self) -> &CommitStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CommitStore {
        &mut self.store
    }

    pub fn push(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Routes to the topmost layer only; lower layers are suspended while a
    /// modal layer is active (§4.6: "the edit layer's state is preserved").
    pub fn on_event(&mut self, event: &InputEvent) -> bool {
        let top = self.layers.last_mut().expect("base layer is never popped");
        top.on_event(event, &mut self.store)
    }

    /// Advances the top layer's animation/cancel-key bookkeeping, then
    /// performs at most one pop -- transitions are atomic and happen
    /// strictly between frames, never mid-`tick`.
    pub fn tick(&mut self, dt: f32) {
        let top = self.layers.last_mut().expect("base layer is never popped");
        top.tick(dt);
        if self.layers.len() > 1 && self.layers.last().unwrap().request_pop() {
            self.layers.pop();
        }
    }

    pub fn draw(&self, hover: Option<Id>) -> Vec<Drawable> {
        self.layers
            .last()
            .expect("base layer is never popped")
            .draw(&self.store, hover)
    }
}
