pub mod fingerprint;
pub mod sweep;
pub mod ttl;

pub use fingerprint::fingerprint;
pub use sweep::{spawn_sweeper, PruneExpired};
pub use ttl::TtlCache;
