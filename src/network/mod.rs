// * Network layer
// * Listing endpoint URLs, wire schema, the transport seam and the retrying page fetcher

pub mod client;
pub mod endpoint;
pub mod errors;
pub mod schema;
pub mod transport;

pub use client::PageFetcher;
pub use endpoint::{build_listing_url, cursor_of};
pub use errors::NetworkError;
pub use schema::{GalleryItem, GalleryPage, ItemMeta, ItemStats, NextPage, PageMetadata, Scalar};
pub use transport::{HttpTransport, ScriptedTransport, Transport, TransportFuture};
