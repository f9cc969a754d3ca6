//! # Votes
//!
//! Balance aggregation and the per-user vote state machine.
//!
//! A user holds at most one vote per target. Casting the direction they
//! already hold toggles it off, casting the opposite direction flips it, and
//! casting with no vote in place creates one.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{UserId, VoteDirection, VoteTarget};
use crate::traits::VoteStore;

/// Computes net balances (`#up - #down`) straight from the store.
/// Nothing is cached; every call re-counts.
#[derive(Clone)]
pub struct VoteAggregator {
    store: Arc<dyn VoteStore>,
}

impl VoteAggregator {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    /// Zero for a target nobody voted on.
    pub async fn balance(&self, target: VoteTarget) -> Result<i64> {
        let up = self.store.count_by_direction(target, VoteDirection::Up).await?;
        let down = self.store.count_by_direction(target, VoteDirection::Down).await?;
        Ok(up - down)
    }
}

/// Where a single (voter, target) pair stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    NoVote,
    Upvoted,
    Downvoted,
}

impl From<Option<VoteDirection>> for VoteState {
    fn from(direction: Option<VoteDirection>) -> Self {
        match direction {
            None => VoteState::NoVote,
            Some(VoteDirection::Up) => VoteState::Upvoted,
            Some(VoteDirection::Down) => VoteState::Downvoted,
        }
    }
}

impl VoteState {
    /// The state reached by casting `requested`, and how it was reached.
    pub fn apply(self, requested: VoteDirection) -> (VoteState, VoteOutcome) {
        use VoteDirection::{Down, Up};
        use VoteState::{Downvoted, NoVote, Upvoted};

        match (self, requested) {
            (NoVote, Up) => (Upvoted, VoteOutcome::Created),
            (NoVote, Down) => (Downvoted, VoteOutcome::Created),
            (Upvoted, Up) | (Downvoted, Down) => (NoVote, VoteOutcome::Removed),
            (Upvoted, Down) => (Downvoted, VoteOutcome::Flipped),
            (Downvoted, Up) => (Upvoted, VoteOutcome::Flipped),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Created,
    Flipped,
    Removed,
}

impl VoteOutcome {
    /// User-facing confirmation for the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            VoteOutcome::Created | VoteOutcome::Flipped => "Vote recorded successfully.",
            VoteOutcome::Removed => "Vote removed successfully.",
        }
    }
}

/// Applies one cast against the store.
///
/// The target must already be known to exist; the mutator only sees the
/// (type, id) pair. Reading the held vote and writing the new state happen in
/// one `VoteStore::apply_cast` call, so concurrent casts on the same key
/// always resolve as some serial order.
#[derive(Clone)]
pub struct VoteMutator {
    store: Arc<dyn VoteStore>,
}

impl VoteMutator {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, target), fields(target = %target))]
    pub async fn cast(
        &self,
        voter: UserId,
        target: VoteTarget,
        requested: VoteDirection,
    ) -> Result<VoteOutcome> {
        let prior = self.apply_with_retry(voter, target, requested).await?;
        let state = VoteState::from(prior);
        let (next, outcome) = state.apply(requested);

        info!(?state, ?next, ?outcome, "vote applied");
        Ok(outcome)
    }

    /// A failed cast leaves nothing behind, so it may be repeated once.
    async fn apply_with_retry(
        &self,
        voter: UserId,
        target: VoteTarget,
        requested: VoteDirection,
    ) -> Result<Option<VoteDirection>> {
        let first = match self.store.apply_cast(voter, target, requested).await {
            Ok(prior) => return Ok(prior),
            Err(err) => err,
        };
        warn!(error = %format!("{first:#}"), "vote cast failed, retrying once");

        self.store
            .apply_cast(voter, target, requested)
            .await
            .map_err(|second| AppError::from(second.context("vote cast failed after retry")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockVoteStore;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use tokio_test::assert_ok;

    const VOTER: UserId = 7;
    const TARGET: VoteTarget = VoteTarget::Post(1);

    fn holding(direction: Option<VoteDirection>, requested: VoteDirection) -> MockVoteStore {
        let mut store = MockVoteStore::new();
        store
            .expect_apply_cast()
            .with(eq(VOTER), eq(TARGET), eq(requested))
            .times(1)
            .returning(move |_, _, _| Ok(direction));
        store.expect_find_vote().never();
        store.expect_upsert().never();
        store.expect_delete().never();
        store
    }

    #[test]
    fn transition_table() {
        use VoteDirection::{Down, Up};
        use VoteState::{Downvoted, NoVote, Upvoted};

        let table = [
            (NoVote, Up, Upvoted, VoteOutcome::Created),
            (NoVote, Down, Downvoted, VoteOutcome::Created),
            (Upvoted, Up, NoVote, VoteOutcome::Removed),
            (Upvoted, Down, Downvoted, VoteOutcome::Flipped),
            (Downvoted, Down, NoVote, VoteOutcome::Removed),
            (Downvoted, Up, Upvoted, VoteOutcome::Flipped),
        ];
        for (from, requested, to, outcome) in table {
            assert_eq!(from.apply(requested), (to, outcome), "{from:?} + {requested:?}");
        }
    }

    #[tokio::test]
    async fn first_cast_creates() {
        let mutator = VoteMutator::new(Arc::new(holding(None, VoteDirection::Down)));
        let outcome = assert_ok!(mutator.cast(VOTER, TARGET, VoteDirection::Down).await);
        assert_eq!(outcome, VoteOutcome::Created);
    }

    #[tokio::test]
    async fn same_direction_removes() {
        let store = holding(Some(VoteDirection::Up), VoteDirection::Up);
        let mutator = VoteMutator::new(Arc::new(store));
        let outcome = assert_ok!(mutator.cast(VOTER, TARGET, VoteDirection::Up).await);
        assert_eq!(outcome, VoteOutcome::Removed);
        assert_eq!(outcome.message(), "Vote removed successfully.");
    }

    #[tokio::test]
    async fn opposite_direction_flips() {
        let store = holding(Some(VoteDirection::Up), VoteDirection::Down);
        let mutator = VoteMutator::new(Arc::new(store));
        let outcome = assert_ok!(mutator.cast(VOTER, TARGET, VoteDirection::Down).await);
        assert_eq!(outcome, VoteOutcome::Flipped);
        assert_eq!(outcome.message(), "Vote recorded successfully.");
    }

    #[tokio::test]
    async fn failed_cast_is_retried_once() {
        let mut seq = Sequence::new();
        let mut store = MockVoteStore::new();
        store
            .expect_apply_cast()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(anyhow::anyhow!("database is locked")));
        store
            .expect_apply_cast()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(None));

        let mutator = VoteMutator::new(Arc::new(store));
        let outcome = assert_ok!(mutator.cast(VOTER, TARGET, VoteDirection::Up).await);
        assert_eq!(outcome, VoteOutcome::Created);
    }

    #[tokio::test]
    async fn persistent_failure_is_a_storage_error() {
        let mut store = MockVoteStore::new();
        store
            .expect_apply_cast()
            .times(2)
            .returning(|_, _, _| Err(anyhow::anyhow!("database is locked")));

        let mutator = VoteMutator::new(Arc::new(store));
        let err = mutator.cast(VOTER, TARGET, VoteDirection::Up).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(ref msg) if msg.contains("database is locked")));
        assert!(err.to_string().contains("vote cast failed after retry"));
    }

    #[tokio::test]
    async fn balance_is_ups_minus_downs() {
        let mut store = MockVoteStore::new();
        store
            .expect_count_by_direction()
            .returning(|target, direction| {
                Ok(match (target, direction) {
                    (VoteTarget::Comment(3), VoteDirection::Up) => 5,
                    (VoteTarget::Comment(3), VoteDirection::Down) => 2,
                    _ => 0,
                })
            });

        let aggregator = VoteAggregator::new(Arc::new(store));
        assert_eq!(assert_ok!(aggregator.balance(VoteTarget::Comment(3)).await), 3);
        assert_eq!(assert_ok!(aggregator.balance(VoteTarget::Post(3)).await), 0);
    }
}
