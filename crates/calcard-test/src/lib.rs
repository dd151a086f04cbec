//! End-to-end test crate.
//!
//! The crate itself is empty; the suites live under `tests/integration`
//! and drive the real router through `salvo::test::TestClient` against a
//! fresh in-memory store per test.
