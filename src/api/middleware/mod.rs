//! HTTP middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter: reject early, before touching the database
//! 2. Auth: bearer token → `UserContext` (protected routes only)
//! 3. Audit logger: one structured line per request, after auth

pub mod audit;
pub mod auth;
pub mod rate;
