use crate::errors::Result;
use crate::query::{ClosureQuery, CountQuery};
use crate::types::{DistilledMention, RawMentionRow, ResolveOptions};

/// Executes mention queries against a persistent store.
///
/// Implementations must evaluate the recursive closure to its fixpoint and
/// return one row per mentioning entry, in the order the query requests.
#[allow(async_fn_in_trait)]
pub trait MentionStore {
    async fn fetch_mention_rows(&self, query: &ClosureQuery) -> Result<Vec<RawMentionRow>>;

    async fn count_mentions(&self, query: &CountQuery) -> Result<u64>;
}

/// Produces generated mentions for requests flagged as examples.
pub trait ExampleSource {
    fn generate(&self, count: usize, options: &ResolveOptions) -> Result<Vec<DistilledMention>>;
}
