//! Renderer contract, clip descriptors, pixel compositing and the bundled backends.
//!
//! The scene graph only talks to [`renderer::Renderer`]. [`cpu::CpuRenderer`] rasterizes with
//! `vello_cpu` into a premultiplied RGBA8 frame; [`recording::RecordingRenderer`] records calls.

/// Clip and mask descriptors.
pub mod clip;
/// Filtered image copies built from composition operators.
pub mod composer;
/// Per-pixel composition operators on premultiplied RGBA8.
pub mod composite;
/// CPU raster backend.
pub mod cpu;
/// Call-recording backend.
pub mod recording;
/// Renderer and render-object traits.
pub mod renderer;
/// Image surfaces, colors and image ids.
pub mod surface;
