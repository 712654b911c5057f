mod barnes_hut;
mod collisions;
mod integrators;
mod particle;
mod quadtree;
mod simulation;

pub use barnes_hut::*;
pub use collisions::*;
pub use integrators::*;
pub use particle::*;
pub use quadtree::*;
pub use simulation::*;

#[cfg(test)]
mod quadtree_tests;
