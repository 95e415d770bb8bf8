//! Folder domain entities.

pub mod color;
pub mod model;

pub use color::ColorTag;
pub use model::Folder;
