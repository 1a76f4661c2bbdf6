//! Request and Response models for the cache admin API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{DeletePatternQuery, SetRequest};
pub use responses::{
    DeletePatternResponse, DeleteResponse, ErrorResponse, GetResponse, HealthResponse,
    SetResponse, StatsResponse,
};
