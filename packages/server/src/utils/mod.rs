pub mod jwt;
pub mod tags;
