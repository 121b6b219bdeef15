pub mod client;
pub mod cluster;
pub mod cmd;
pub mod dispatcher;
pub mod error;
pub mod server;
pub mod storage_engine;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
