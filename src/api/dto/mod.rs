//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers are plain numbers and strings on the wire; requests are
//! converted into domain types at the handler boundary, which is where
//! unit ranks are validated.

pub mod common_dto;
pub mod ingest_dto;
pub mod odds_dto;
pub mod query_dto;

pub use common_dto::*;
pub use ingest_dto::*;
pub use odds_dto::*;
pub use query_dto::*;
