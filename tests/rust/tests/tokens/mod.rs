//! Token manager integration tests: cache-aside reads, rotation families,
//! replay detection, retention sweeps.

mod lifecycle;
