//! `engine_editor`
//!
//! Editor-side systems:
//! - Frame loop: fly camera, scene update, debug overlays, culled draw
//! - Input snapshot and fly-camera controls
//! - Console commands for selection, hierarchy and animation transport
//! - Demo scene and procedural assets

pub mod demo;
pub mod editor;
pub mod input;

pub use editor::Editor;
