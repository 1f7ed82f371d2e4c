pub mod cell;
pub mod entity;
pub mod grid;
pub mod maze;
pub mod physics;
pub mod pursuer;
pub mod search;
pub mod visibility;
