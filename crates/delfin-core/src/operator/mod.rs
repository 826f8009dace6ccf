//! Operator and overload resolution engine
//!
//! [`OperatorCollector`] synthesizes the candidate signatures for an operand
//! type, [`OverloadResolver`] ranks candidates against argument types.

mod collector;
mod invocable;
mod kind;
mod resolve;

pub use collector::OperatorCollector;
pub use invocable::{Invocable, InvocableOrigin};
pub use kind::{BinaryOperator, Operator, UnaryOperator};
pub use resolve::{Conversion, OverloadResolver, Resolution};
