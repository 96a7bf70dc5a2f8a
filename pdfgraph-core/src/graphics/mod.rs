pub mod image;

pub use image::{ColorSpace, ImageSpec, SolidColorImage};
