pub mod gallery;
pub mod intake;
pub mod listing;
pub mod project;
