//! Filter-and-summarise pipeline behind the healthy meals dashboard.
//!
//! ```text
//! load_file ─► MealTable ─► filter::apply ─► FilteredTable ─┬─► aggregate::*
//!                                                           └─► export::serialize
//! ```

pub mod config;
pub mod data;
