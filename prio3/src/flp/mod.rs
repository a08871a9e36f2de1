//! The Fully Linear Proof layer: the validity-circuit interface and its
//! three normative circuits (C4/C7), the gadget library (C5), and the
//! generic FLP engine built on top of them (C6).

mod flp;
mod gadgets;
mod types;

pub use flp::FlpGeneric;
pub use gadgets::{Gadget, Mul, Range2};
pub use types::{Count, GadgetCaller, Histogram, Sum, Type};
