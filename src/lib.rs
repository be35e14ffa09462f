pub mod camera;
pub mod engine;
pub mod geometry;
pub mod input;
pub mod post;
pub mod renderer;
pub mod scene;

/// Default window size, a 2:1 viewport.
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 600;
