//! Grove Core - entity extraction
//!
//! This crate turns source files into the entities the graph layer works
//! with: functions and classes, each carrying its owning file and full
//! source text.
//!
//! # Example
//!
//! ```no_run
//! use grove_core::EntityExtractor;
//!
//! let mut extractor = EntityExtractor::new();
//! let extraction = extractor
//!     .extract("service.py", "class Service:\n    def run(self):\n        pass\n")
//!     .unwrap();
//!
//! assert_eq!(extraction.functions[0].name, "Service.run");
//! ```

mod entity;
mod error;
mod extractor;
mod language;

pub use entity::{Entity, EntityKind, FileExtraction};
pub use error::{ParseError, Result};
pub use extractor::EntityExtractor;
pub use language::{is_source_file_label, SupportedLanguage, SOURCE_EXTENSIONS};
