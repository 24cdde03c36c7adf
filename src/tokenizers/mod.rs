//! Non-default tokenizer variants, kept alongside
//! [`crate::tokenizer::DefaultTokenizer`] since they only differ in
//! their regex set.

mod numeric;
mod sql;

pub use numeric::NumericTokenizer;
pub use sql::SqlTokenizer;
