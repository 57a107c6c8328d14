//! # Blogicum Shared
//!
//! Wire types of the Blogicum API: submitted forms with their field rules,
//! response bodies and the error envelope.

pub mod dto;
pub mod forms;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, FieldError};
