pub mod boolean;
pub mod cleanup;
pub mod snap;
pub mod texture;
