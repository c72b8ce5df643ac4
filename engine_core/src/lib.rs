//! `engine_core`
//!
//! Scene, animation and culling core used by the editor and headless tools.
//!
//! Design goals:
//! - Deterministic and single-threaded; one `update` per frame.
//! - Clear separation of concerns (math, geometry, scene, animation, render).
//! - Traits at the renderer seam so tests run without a GPU.
//! - No `unsafe`.

pub mod anim;
pub mod anim_io;
pub mod config;
pub mod console;
pub mod debug_lines;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod render;
pub mod scene;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::anim::*;
    pub use crate::config::*;
    pub use crate::geometry::*;
    pub use crate::math::*;
    pub use crate::scene::*;
}
