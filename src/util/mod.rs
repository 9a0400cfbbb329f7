//! Utility functions for common operations.
//!
//! - **HTTP**: Accept headers and size-capped body reads shared by feed and
//!   book requests
//! - **URL validation**: scheme and host checks for user-supplied catalog URLs
//! - **Text processing**: terminal sanitizing, width-aware truncation, and
//!   filesystem-safe filenames
//!
//! # Examples
//!
//! ```
//! use shelf::util::{safe_filename, truncate_to_width, validate_url};
//!
//! let url = validate_url("https://example.com/opds", false).unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//!
//! assert_eq!(safe_filename("War: Part 1/2"), "War- Part 1-2.epub");
//! assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
//! ```

pub mod http;
mod text;
mod url_validator;

pub use text::{display_width, safe_filename, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url, UrlValidationError};
