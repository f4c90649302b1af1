pub mod aquarium;
pub mod light;
pub mod lighting;

pub use aquarium::*;
pub use light::*;
pub use lighting::*;
