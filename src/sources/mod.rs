//! Source acquisition.
//!
//! Sources are responsible for producing a verified, unpacked tree for a
//! formula: archives downloaded over HTTP and checked against the declared
//! digest, or head checkouts tracking the formula's repository.

pub mod archive;
pub mod head;

pub use archive::{ArchiveFormat, ArchiveSource, FetchError, PackageFetcher};
pub use head::HeadSource;
