//! Clients for the hosted backend
//!
//! The gateway owns no durable state. Every record lives in the hosted
//! relational backend, reached over HTTP: the table API (PostgREST dialect)
//! for rows and the auth API (GoTrue dialect) for identities and sessions.

pub mod auth;
pub mod client;

pub use auth::{AuthClient, Session};
pub use client::{StoreClient, TableQuery};
