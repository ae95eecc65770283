pub mod budget;
pub mod grid;
pub mod measure;
pub mod placement;
pub mod radial;
pub mod seed;
