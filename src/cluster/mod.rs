//! Module that contains everything related to key ownership: node identities, the hash function
//! every node must agree on, the partitioning schemes and the routing service wrapping them.
pub mod error;
pub mod hashing;
pub mod node;
pub mod partitioning;
pub mod routing;
