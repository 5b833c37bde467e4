//! # docfinder search
//!
//! The doctor search agent behind the A2A adapter: turns a message into a
//! [`SearchQuery`], asks a [`DoctorSearch`] backend for matches, and publishes
//! the formatted result through the A2A event bus.
//!
//! ```rust
//! use docfinder_search::{SearchQuery, extract::parse_text};
//!
//! let query = parse_text("Find doctors named Smith in 10001");
//! assert_eq!(query.zipcode, Some(10001));
//! assert_eq!(query.lastname.as_deref(), Some("Smith"));
//! ```

pub mod collaborator;
pub mod config;
pub mod executor;
pub mod extract;
pub mod format;
pub mod query;

pub use collaborator::{
    DoctorRecord, DoctorSearch, FixtureDoctor, FixtureDoctorSearch, HttpDoctorSearch,
    SearchError, SearchResponse,
};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use executor::DoctorSearchExecutor;
pub use extract::{ExtractError, extract};
pub use format::{NO_RESULTS, SearchSummary, format_results, summarize};
pub use query::{Gender, RequiredFields, SearchQuery};
