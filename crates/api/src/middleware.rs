//! Request-scoped middleware.

pub mod identity;
