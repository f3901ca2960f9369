//! External collaborators and core selection logic

pub mod checkpoint;
pub mod lidarr;
pub mod selector;
