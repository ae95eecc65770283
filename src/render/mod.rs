pub mod canvas;
pub mod color;
pub mod elements;
pub mod font;
