#![forbid(unsafe_code)]

pub mod blend_cpu;
pub mod clock;
pub mod compositor;
pub mod core;
pub mod derive;
pub mod error;
pub mod geometry;
pub mod model;
pub mod randomize;
pub mod surface;
pub mod surface_cpu;

pub use clock::{AnimationClock, AnimationState, Tick};
pub use compositor::Compositor;
pub use core::{Canvas, Node, Rgba8};
pub use derive::BaseShapeCache;
pub use error::{GlowformError, GlowformResult};
pub use model::{
    BlendMode, Layer, LayerType, MovementStyle, OrbitPoint, OrbitRegistry, Scene, scene_from_json,
};
pub use randomize::{RandomizationEngine, RandomizeToggles, Strategy};
pub use surface::{FrameRGBA, RenderTarget, SurfaceProvider, acquire_surface};
pub use surface_cpu::CpuTarget;
