// Corrective writes applied after a rebind: namespace scrubbing and safe deletion

mod safe_delete;
mod scrub;

pub use safe_delete::{DeletionOutcome, SafeDeleter};
pub use scrub::ReferenceScrubber;
