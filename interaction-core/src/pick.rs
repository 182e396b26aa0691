//! Parameterized modal picking layers (§4.6): `PickN` for picking entities
//! by kind and `PickTwoMeshPoints` for picking two world points on mesh
//! surfaces. Both are pushed on top of the edit layer and pop themselves
//! when satisfied or cancelled.

use fxhash::FxHashSet;
use nalgebra::Vector3;
use scene_core::commit::CommitStore;
use scene_core::entity::EntityKind;
use scene_core::id::Id;

use crate::drawable::{emit_drawables, Drawable, Highlight};
use crate::easing::elastic_ease_out;
use crate::input::{InputEvent, Key, MouseButton};
use crate::layer::Layer;

/// Entry animation length for `PickN`'s selectable entities (§4.6: "~0.67s").
const ENTRY_ANIMATION_SECS: f32 = 0.67;
const FADED_ALPHA: f32 = 0.2;

pub type ChoiceCallback = Box<dyn FnMut(&[Id], &mut CommitStore) -> bool>;

pub struct PickNOptions {
    pub allow: FxHashSet<EntityKind>,
    pub must_choose: usize,
    pub attaching_to: FxHashSet<Id>,
    pub being_replaced: FxHashSet<Id>,
    pub is_toward: bool,
    pub header: String,
    pub on_choice: ChoiceCallback,
}

pub struct PickN {
    options: PickNOptions,
    chosen: Vec<Id>,
    hover: Option<Id>,
    age: f32,
    pop: bool,
}

impl PickN {
    pub fn new(options: PickNOptions) -> Self {
        Self {
            options,
            chosen: Vec::new(),
            hover: None,
            age: 0.0,
            pop: false,
        }
    }

    fn is_selectable(&self, store: &CommitStore, id: Id) -> bool {
        if self.options.attaching_to.contains(&id) {
            return false;
        }
        match store.scratch().try_get(id) {
            Some(entity) => self.options.allow.contains(&entity.kind()),
            None => false,
        }
    }
}

impl Layer for PickN {
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
                let Some(id) = self.hover else {
                    return true;
                };
                if !self.is_selectable(store, id) {
                    return true;
                }
                if let Some(pos) = self.chosen.iter().position(|&c| c == id) {
                    self.chosen.remove(pos);
                } else {
                    self.chosen.push(id);
                }
                if self.chosen.len() == self.options.must_choose {
                    if (self.options.on_choice)(&self.chosen, store) {
                        self.pop = true;
                    } else {
                        self.chosen.clear();
                    }
                }
                true
            }
            InputEvent::KeyDown(Key::Escape) => {
                self.pop = true;
                true
            }
            _ => false,
        }
    }

    fn tick(&mut self, dt: f32) {
        self.age += dt;
    }

    fn draw(&self, store: &CommitStore, hover: Option<Id>) -> Vec<Drawable> {
        let mut drawables = emit_drawables(store.scratch(), hover, true);
        let entry_t = (self.age / ENTRY_ANIMATION_SECS).min(1.0);
        let scale_boost = elastic_ease_out(entry_t);
        for drawable in &mut drawables {
            if self.is_selectable(store, drawable.id) {
                drawable.transform.scale *= scale_boost;
                if self.chosen.contains(&drawable.id) {
                    drawable.highlight = Highlight {
                        selected: true,
                        ..drawable.highlight
                    };
                }
            } else {
                drawable.color[3] = FADED_ALPHA;
            }
        }
        drawables
    }

    fn request_pop(&self) -> bool {
        self.pop
    }
}

pub type TwoPointsCallback = Box<dyn FnMut(Vector3<f32>, Vector3<f32>, &mut CommitStore) -> bool>;

pub struct PickTwoMeshPoints {
    on_two_points: TwoPointsCallback,
    first: Option<Vector3<f32>>,
    hover_point: Option<Vector3<f32>>,
    pop: bool,
}

impl PickTwoMeshPoints {
    pub fn new(on_two_points: TwoPointsCallback) -> Self {
        Self {
            on_two_points,
            first: None,
            hover_point: None,
            pop: false,
        }
    }
}

impl Layer for PickTwoMeshPoints {
    fn on_event(&mut self, event: &InputEvent, store: &mut CommitStore) -> bool {
        match *event {
            InputEvent::MouseMoved { mesh_hit, .. } => {
                self.hover_point = mesh_hit;
                true
            }
            InputEvent::MouseDown {
                button: MouseButton::Left,
                ..
            } => {
                if let Some(point) = self.hover_point {
                    self.first = Some(point);
                }
                true
            }
            InputEvent::MouseDown {
                button: MouseButton::Right,
                ..
            } => {
                if let (Some(p1), Some(p2)) = (self.first, self.hover_point) {
                    if (self.on_two_points)(p1, p2, store) {
                        self.pop = true;
                    } else {
                        self.first = None;
                    }
                }
                true
            }
            InputEvent::KeyDown(Key::Escape) => {
                self.pop = true;
                true
            }
            _ => false,
        }
    }

    fn tick(&mut self, _dt: f32) {}

    fn draw(&self, store: &CommitStore, hover: Option<Id>) -> Vec<Drawable> {
        emit_drawables(store.scratch(), hover, true)
    }

    fn request_pop(&self) -> bool {
        self.pop
    }
}
