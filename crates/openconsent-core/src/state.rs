use crate::consent_type::{ConsentStatus, ConsentType};
use std::collections::{HashMap, HashSet};

/// Per-consent-type table of legal statuses and transitions.
///
/// Immutable value object, built once at startup and shared by reference
/// across every consent of the type. Revocation (soft delete) deliberately
/// bypasses this table; see the service layer.
#[derive(Debug, Clone)]
pub struct ConsentStateModel {
    initial: ConsentStatus,
    authorised: ConsentStatus,
    rejected: ConsentStatus,
    revoked: ConsentStatus,
    transitions: HashMap<ConsentStatus, HashSet<ConsentStatus>>,
}

impl ConsentStateModel {
    fn new(
        initial: ConsentStatus,
        transitions: &[(ConsentStatus, &[ConsentStatus])],
    ) -> Self {
        Self {
            initial,
            authorised: ConsentStatus::Authorised,
            rejected: ConsentStatus::Rejected,
            revoked: ConsentStatus::Revoked,
            transitions: transitions
                .iter()
                .map(|(from, targets)| (*from, targets.iter().copied().collect()))
                .collect(),
        }
    }

    /// Account-access shape: re-authorisation from Authorised is legal.
    pub fn account_access() -> Self {
        Self::new(
            ConsentStatus::AwaitingAuthorisation,
            &[
                (
                    ConsentStatus::AwaitingAuthorisation,
                    &[ConsentStatus::Authorised, ConsentStatus::Rejected],
                ),
                (
                    ConsentStatus::Authorised,
                    &[ConsentStatus::Authorised, ConsentStatus::Revoked],
                ),
            ],
        )
    }

    /// Customer-info shape: like account access, but single-shot authorisation.
    pub fn customer_info() -> Self {
        Self::new(
            ConsentStatus::AwaitingAuthorisation,
            &[
                (
                    ConsentStatus::AwaitingAuthorisation,
                    &[ConsentStatus::Authorised, ConsentStatus::Rejected],
                ),
                (ConsentStatus::Authorised, &[ConsentStatus::Revoked]),
            ],
        )
    }

    /// Payment shape: single-shot, Authorised ends in Consumed or Rejected.
    pub fn payment() -> Self {
        Self::new(
            ConsentStatus::AwaitingAuthorisation,
            &[
                (
                    ConsentStatus::AwaitingAuthorisation,
                    &[ConsentStatus::Authorised, ConsentStatus::Rejected],
                ),
                (
                    ConsentStatus::Authorised,
                    &[ConsentStatus::Consumed, ConsentStatus::Rejected],
                ),
            ],
        )
    }

    /// File-payment shape: an upload step precedes authorisation.
    pub fn file_payment() -> Self {
        Self::new(
            ConsentStatus::AwaitingUpload,
            &[
                (
                    ConsentStatus::AwaitingUpload,
                    &[ConsentStatus::AwaitingAuthorisation],
                ),
                (
                    ConsentStatus::AwaitingAuthorisation,
                    &[ConsentStatus::Authorised, ConsentStatus::Rejected],
                ),
                (ConsentStatus::Authorised, &[ConsentStatus::Consumed]),
            ],
        )
    }

    /// The state model shape for a consent type.
    pub fn for_type(consent_type: ConsentType) -> Self {
        match consent_type {
            ConsentType::AccountAccess => Self::account_access(),
            ConsentType::CustomerInfo => Self::customer_info(),
            ConsentType::FilePayment => Self::file_payment(),
            _ => Self::payment(),
        }
    }

    pub fn initial_status(&self) -> ConsentStatus {
        self.initial
    }

    pub fn authorised_status(&self) -> ConsentStatus {
        self.authorised
    }

    pub fn rejected_status(&self) -> ConsentStatus {
        self.rejected
    }

    pub fn revoked_status(&self) -> ConsentStatus {
        self.revoked
    }

    /// Whether `from -> to` appears in the transition table.
    pub fn is_valid_transition(&self, from: ConsentStatus, to: ConsentStatus) -> bool {
        self.transitions
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Whether the authorised status is reachable from `current`.
    pub fn can_transition_to_authorised(&self, current: ConsentStatus) -> bool {
        self.is_valid_transition(current, self.authorised)
    }
}
