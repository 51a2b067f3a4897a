// Core engine — task primitive, dedup registry, disk store, and the factory
// tying them together.

pub mod factory;
pub mod registry;
pub mod store;
pub mod task;
