pub mod index;
pub mod outputs;
pub mod removal;
pub mod weather;
