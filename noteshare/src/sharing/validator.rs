//! Checks a share request against user existence and current share state.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::Result;
use crate::database::repositories::{ShareRepository, UserRepository};

/// Why a share request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareRejection {
    /// The sharer listed themselves as a recipient.
    SelfShare,
    /// These ids do not belong to any user.
    InvalidRecipients { ids: Vec<i64> },
    /// These recipients already hold an active share of the note.
    AlreadyShared { usernames: Vec<String> },
}

impl ShareRejection {
    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::SelfShare => "self-share",
            Self::InvalidRecipients { .. } => "invalid recipients",
            Self::AlreadyShared { .. } => "already shared",
        }
    }
}

impl fmt::Display for ShareRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfShare => write!(f, "Cannot share a note with its creator"),
            Self::InvalidRecipients { ids } => {
                let ids: Vec<String> = ids.iter().map(i64::to_string).collect();
                write!(f, "Invalid recipients: no users with ids {}", ids.join(", "))
            }
            Self::AlreadyShared { usernames } => write!(
                f,
                "Recipients {} already have access to the note",
                usernames.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareDecision {
    Accepted,
    Rejected(ShareRejection),
}

/// Cheapest check first: no I/O.
pub fn check_self_share(sharer_id: i64, recipient_ids: &[i64]) -> Option<ShareRejection> {
    recipient_ids
        .contains(&sharer_id)
        .then_some(ShareRejection::SelfShare)
}

/// Requested ids missing from `existing`, first-seen order, without repeats.
pub fn unresolved_ids(requested: &[i64], existing: &[i64]) -> Vec<i64> {
    let existing: HashSet<i64> = existing.iter().copied().collect();
    let mut seen = HashSet::new();
    requested
        .iter()
        .copied()
        .filter(|id| !existing.contains(id) && seen.insert(*id))
        .collect()
}

pub struct ShareValidator {
    users: Arc<dyn UserRepository>,
    shares: Arc<dyn ShareRepository>,
}

impl ShareValidator {
    pub fn new(users: Arc<dyn UserRepository>, shares: Arc<dyn ShareRepository>) -> Self {
        Self { users, shares }
    }

    /// Runs self-share, existence and already-shared checks, in that order.
    ///
    /// `Err` is reserved for store failures; every refusal is a [`ShareDecision::Rejected`].
    pub async fn validate(
        &self,
        sharer_id: i64,
        note_id: i64,
        recipient_ids: &[i64],
    ) -> Result<ShareDecision> {
        if let Some(rejection) = check_self_share(sharer_id, recipient_ids) {
            return Ok(ShareDecision::Rejected(rejection));
        }

        let existing = self.users.existing_ids(recipient_ids).await?;
        let missing = unresolved_ids(recipient_ids, &existing);
        if !missing.is_empty() {
            debug!(note_id, ?missing, "Share rejected: unknown recipients");
            return Ok(ShareDecision::Rejected(ShareRejection::InvalidRecipients {
                ids: missing,
            }));
        }

        let active = self.shares.find_active_shares(note_id, recipient_ids).await?;
        if !active.is_empty() {
            return Ok(ShareDecision::Rejected(ShareRejection::AlreadyShared {
                usernames: active.into_iter().map(|share| share.username).collect(),
            }));
        }

        Ok(ShareDecision::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_share_detected() {
        assert_eq!(check_self_share(1, &[2, 1]), Some(ShareRejection::SelfShare));
        assert_eq!(check_self_share(1, &[2, 3]), None);
    }

    #[test]
    fn test_unresolved_ids_keeps_order_and_dedups() {
        assert_eq!(unresolved_ids(&[9, 2, 7, 9], &[2]), vec![9, 7]);
        assert!(unresolved_ids(&[2, 3], &[3, 2]).is_empty());
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            ShareRejection::SelfShare.to_string(),
            "Cannot share a note with its creator"
        );
        assert_eq!(
            ShareRejection::InvalidRecipients { ids: vec![8, 9] }.to_string(),
            "Invalid recipients: no users with ids 8, 9"
        );
        assert_eq!(
            ShareRejection::AlreadyShared {
                usernames: vec!["bob".into(), "carol".into()]
            }
            .to_string(),
            "Recipients bob, carol already have access to the note"
        );
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(ShareRejection::SelfShare.reason(), "self-share");
        assert_eq!(
            ShareRejection::InvalidRecipients { ids: vec![] }.reason(),
            "invalid recipients"
        );
        assert_eq!(
            ShareRejection::AlreadyShared { usernames: vec![] }.reason(),
            "already shared"
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_unresolved_ids_names_exactly_the_missing(
            requested in proptest::collection::vec(1i64..40, 0..20),
            existing in proptest::collection::vec(1i64..40, 0..20),
        ) {
            let missing = unresolved_ids(&requested, &existing);

            for id in &missing {
                proptest::prop_assert!(requested.contains(id));
                proptest::prop_assert!(!existing.contains(id));
            }
            for id in &requested {
                proptest::prop_assert_eq!(missing.contains(id), !existing.contains(id));
            }
            let unique: HashSet<i64> = missing.iter().copied().collect();
            proptest::prop_assert_eq!(unique.len(), missing.len());
        }
    }
}
