//! Records returned by the Dinlr API.
//!
//! Every record is a plain serde struct. Fields the API may omit are
//! `Option`s; open-ended payloads keep unknown fields in `extra`.

mod catalog;
mod customers;
mod inventory;
mod loyalty;
mod orders;

pub use catalog::*;
pub use customers::*;
pub use inventory::*;
pub use loyalty::*;
pub use orders::*;
