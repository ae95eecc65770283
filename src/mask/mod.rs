pub mod apply;
pub mod text_mask;
