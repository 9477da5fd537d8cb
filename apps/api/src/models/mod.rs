pub mod analysis;
pub mod assistant;
pub mod decision;
