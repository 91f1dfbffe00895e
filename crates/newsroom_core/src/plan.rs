use std::collections::HashSet;

use crate::ledger::PublishLedger;
use crate::model::Post;

/// Outcome of sorting a batch of posts before any remote call is made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishPlan {
    /// At most one post per identity key, in batch order.
    pub queue: Vec<Post>,
    pub already_published: Vec<Post>,
    /// Later posts whose key already appears earlier in `queue`.
    pub duplicates: Vec<Post>,
}

/// Splits `posts` into the single-attempt-per-key queue for this run.
///
/// The first post for a key wins. The ledger is consulted here to skip known
/// keys early, but the caller must still check it again right before each
/// publish.
pub fn plan_publish(posts: Vec<Post>, ledger: &dyn PublishLedger) -> PublishPlan {
    let mut plan = PublishPlan::default();
    let mut queued = HashSet::new();

    for post in posts {
        if ledger.has(&post.identity_key) {
            plan.already_published.push(post);
        } else if queued.insert(post.identity_key.clone()) {
            plan.queue.push(post);
        } else {
            plan.duplicates.push(post);
        }
    }
    plan
}
