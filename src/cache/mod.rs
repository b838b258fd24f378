//! Cache keys, policies and the restore/save lifecycle
//!
//! Keys are hierarchical so a job can fall back to an older cache when the
//! exact commit has not been cached yet, without ever crossing operating
//! systems. A cache is written back only when that adds something.
//!
//! # Lifecycle
//!
//! | Phase | Outcome | When |
//! |-------|---------|------|
//! | restore | SkippedExists | output already on disk |
//! | restore | SkippedDisabled | `<cache>-cache-enabled` is `false` |
//! | restore | Miss / Restored | key computed and persisted, store queried |
//! | save | SkippedNoOutput | nothing on disk |
//! | save | SkippedNoKey | restore did not compute a key |
//! | save | SkippedReadOnly | `<cache>-cache-enabled` is `read-only` |
//! | save | SkippedExactHit | restore matched the exact key |
//! | save | Saved / SavedWithWarning | written, or write failed non-fatally |

pub mod context;
pub mod hash;
pub mod key;
pub mod kinds;
pub mod lifecycle;
pub mod policy;
pub mod state;
pub mod store;

pub use context::resolve_job_context;
pub use hash::hash_strings;
pub use key::{build_key, CacheKey, KeyEnvironment};
pub use kinds::{gradle_user_home, CacheKind, CacheOutput, DependenciesCache, WrapperCache};
pub use lifecycle::{CacheController, RestoreOutcome, SaveOutcome};
pub use policy::{CachePolicy, CachePolicyGate};
pub use state::{FileStateStore, JobStateStore, MemoryStateStore, PersistedCacheState};
pub use store::{BlobCacheStore, LocalDirStore, StoreError};
