//! URL and path modeling.
//!
//! Recognizes remote-document links, builds download URLs from their ids, and
//! derives filesystem-safe destination paths from category and title text.

mod link;
mod path;
mod sanitize;

pub use link::{DownloadEndpoint, EndpointError, LinkPattern, ID_PLACEHOLDER};
pub use path::{destination_path, tagged_destination_path};
pub use sanitize::{normalize_category, normalize_text, sanitize_path_component};
