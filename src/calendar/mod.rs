//! Calendar-side decisions: which days need a correction, and in which hours.
//!
//! Responsibilities:
//!
//! - carve approved leave out of the working window (`leave`)
//! - pick qualifying workdays from one month of records (`resolver`)
//! - enumerate the months spanned by a date range (`months`)

pub mod leave;
pub mod months;
pub mod resolver;

pub use leave::adjust;
pub use months::months_in;
pub use resolver::resolve;
