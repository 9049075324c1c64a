pub mod gallery;
pub mod history;
pub mod videos;
