//! Network checks.

pub mod connectivity;

pub use connectivity::{ConnectivityChecker, ConnectivityStatus, Reachability, TcpReachability};
