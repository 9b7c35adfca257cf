pub mod normalize;
pub mod adjust;
pub mod geometry;
pub mod blend;

pub use normalize::*;
pub use adjust::*;
pub use geometry::*;
pub use blend::*;
