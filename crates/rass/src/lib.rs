pub mod listing;
pub mod source;

pub use listing::{build_listing, write_listing, Listing, ListingEntry};
pub use source::{load_source, tokenize, write_image, Line};
