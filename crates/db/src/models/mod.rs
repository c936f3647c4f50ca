pub mod varsel;

pub use varsel::{ExpiredVarsel, NewVarsel, Varsel};
