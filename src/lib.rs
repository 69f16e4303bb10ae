//! Extract structured run properties from merge-and-shrink planner logs.
//!
//! A [`Parser`] is an ordered registry of rules. Each run's log is fed through
//! every rule, in registration order, into one [`PropertyRecord`]:
//!
//! - pattern rules take the first regex match and coerce its single capture;
//! - function rules scan the log freely and may read what earlier rules wrote.
//!
//! ```
//! use runprops::{FunctionRule, Parser, ValueType};
//!
//! let mut parser = Parser::new();
//! parser
//!     .add_pattern("calls", r"Total bliss calls: (\d+)", false, ValueType::Int)
//!     .unwrap();
//! parser.add_function(
//!     FunctionRule::new("used_bliss", |_, record| {
//!         let calls = record.int_or("calls", 0);
//!         record.insert("used_bliss", calls > 0);
//!     })
//!     .reads(["calls"])
//!     .writes(["used_bliss"]),
//! );
//!
//! let record = parser.parse("Total bliss calls: 4\n");
//! assert_eq!(record.int_or("calls", 0), 4);
//! assert!(record.bool_or("used_bliss", false));
//! ```

pub mod config;
pub mod derived;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod parsers;
pub mod record;
pub mod rule;
pub mod scan;
pub mod value;

pub use config::ExtractConfig;
pub use derived::{success_ratio, RatioPolicy, SuccessRatios};
pub use error::{ConfigError, IngestError, ParserError};
pub use parser::{Parser, RuleWarning};
pub use record::{ExtractionFailure, PropertyRecord};
pub use rule::{FunctionRule, PatternRule, Rule};
pub use value::{PropertyValue, ValueType};
