//! Database integration tests: migrations and repository behavior against
//! real SQLite (in-memory and on-disk).

mod codes;
mod profiles;
