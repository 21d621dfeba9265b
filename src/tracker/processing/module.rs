use anyhow::Result;

use crate::tracker::collection::session::Visit;

/// Represents a consumer of closed visits. Realistically this abstracts over local
/// aggregation, but could as well forward visits somewhere else.
pub trait EventProcessor {
    fn process_next(&mut self, visit: Visit) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
