//! Cell value coercion for CSVW columns.
//!
//! - **datetime**: LDML pattern, RFC 2822 and ISO 8601 parsing with
//!   canonical XML Schema rendering
//! - **zone**: fixed-offset and IANA timezone resolution

pub mod datetime;
pub mod error;
mod pattern;
pub mod zone;

pub use datetime::{DateTimeCoercer, DateTimeValue, TemporalKind, coerce};
pub use error::{DateTimeParseFailure, InvalidTimezone};
pub use zone::Zone;
