//! Rendering module
//!
//! Text rendering plus the renderer collaborators it draws through: sprite
//! batches, atlas textures and shared text effects.

pub mod batch;
pub mod effect;
pub mod text;
pub mod texture;

pub use batch::{Quad, QuadBatch, SpriteBatch, TextVertex};
pub use effect::{EffectRegistry, FontFormat, TextEffect};
pub use texture::{AtlasTexture, CpuTexture, CpuTextureFactory, SharedTexture, TextureError, TextureFactory, TextureFormat};
