//! Harness crate: the integration tests and benchmarks live at the
//! repository root under `tests/` and `benches/`.
