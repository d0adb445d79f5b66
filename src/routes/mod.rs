//! Route declarations consumed by the guard chain

pub mod paths;
pub mod table;

pub use table::{RouteDeclaration, RouteTable};
