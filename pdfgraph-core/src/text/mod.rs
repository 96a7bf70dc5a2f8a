pub mod font;

pub use font::{Font, FontEncoding, FontResource};
