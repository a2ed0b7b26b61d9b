//! Route handlers, one module per API area.

pub mod health;
pub mod ipfs;
pub mod patents;
pub mod zkp;
