pub mod devices;
pub mod error;
pub mod poll;
