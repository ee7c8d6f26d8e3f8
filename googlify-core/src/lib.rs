// Googlify Core Library
// Canvas geometry and composition engine for the eye-overlay editor

pub mod compositor;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod hit_test;
pub mod interaction;
pub mod loader;
pub mod node;
pub mod scene;
pub mod viewport;
