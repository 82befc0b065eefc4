// * Persistence
// * Where items land on disk, how payloads are encoded, and the ledger of saved URLs

pub mod encoder;
pub mod ledger;
pub mod paths;
pub mod persister;

// * Re-exports for convenient access
pub use encoder::{source_extension, PayloadEncoder, SavedPayload};
pub use ledger::{DedupLedger, LedgerError, SeenUrls};
pub use paths::PathResolver;
pub use persister::{ContentPersister, DownloadOutcome, OutcomeStatus, PersistError};
