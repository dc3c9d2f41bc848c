//! Middleware module - request rate limiting

pub mod rate_limit;
