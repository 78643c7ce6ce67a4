pub mod csv;

pub use csv::{parse_rows, serialize};
