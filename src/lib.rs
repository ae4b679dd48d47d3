pub mod aggregate;
pub mod attendance;
pub mod config;
pub mod db;
pub mod dom;
pub mod error;
pub mod grades;
pub mod models;
pub mod pages;
pub mod periods;
pub mod portal;
pub mod report;
pub mod symbols;
pub mod sync;

pub use aggregate::{compute_average, rank_entries, rank_of, user_ranking, Dimension};
pub use attendance::extract_attendance;
pub use error::PortalError;
pub use grades::extract_grades;
pub use periods::extract_periods;
