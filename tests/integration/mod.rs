//! Integration tests
//!
//! Exercise the services, the realtime dispatcher and the HTTP router
//! together over the in-memory store. `postgres_test` needs a live database
//! and is ignored by default.

mod lifecycle_test;
mod realtime_test;
mod routes_test;
mod slow_store_test;
