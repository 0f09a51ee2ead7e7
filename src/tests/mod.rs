//! integrated tests

mod correction;
mod validation;
