pub mod entity;
pub mod geom;
pub mod mechanics;
pub mod physics;
pub mod trigger;
