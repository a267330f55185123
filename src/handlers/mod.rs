pub mod common;
pub mod distance_matrix;
pub mod health;
pub mod pricing;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
