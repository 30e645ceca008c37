pub mod element;
pub mod error;
pub mod group;
pub mod properties;
