pub mod beats;
pub mod segment;
