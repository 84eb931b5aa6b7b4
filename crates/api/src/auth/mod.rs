//! Authentication: JWT access tokens, Argon2id password hashing, and the
//! in-memory credential store.

pub mod jwt;
pub mod password;
pub mod store;
