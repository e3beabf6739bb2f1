//! Labeled-rectangle annotation of task images.
//!
//! A signed-in user opens an assigned task, drags rectangles over its image,
//! labels each one, and saves the result back to the task store. The
//! drawing state machine lives in [`editor`]; [`app`] wires it to an eframe
//! window.

pub mod app;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod identity;
pub mod image_source;
pub mod input;
pub mod model;
pub mod render;
pub mod store;

pub use error::{Error, Result};
