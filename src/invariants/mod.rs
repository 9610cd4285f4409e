//! First-class invariants for board sessions.
//!
//! Invariants are properties the turn controller guarantees after every
//! committed move. They are checked in debug builds and can be tested on
//! their own.

mod capture_ledger;
mod turn_order;
mod unique_placement;

pub use capture_ledger::CaptureLedgerInvariant;
pub use turn_order::TurnOrderInvariant;
pub use unique_placement::UniquePlacementInvariant;

use crate::board::Rules;
use crate::session::GameSession;
use tracing::{error, instrument};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{}", description)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks every invariant in the set, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn violations_of(checks: &[(bool, &'static str)]) -> Result<(), Vec<InvariantViolation>> {
    let violations = checks
        .iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| InvariantViolation::new(*description))
        .collect::<Vec<_>>();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        violations_of(&[
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
        ])
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        violations_of(&[
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ])
    }
}

/// Every invariant a session maintains.
pub type SessionInvariants = (
    UniquePlacementInvariant,
    CaptureLedgerInvariant,
    TurnOrderInvariant,
);

/// Asserts that all session invariants hold (panics on violation in debug builds).
#[instrument(skip(session), fields(session_id = %session.id()))]
pub fn assert_invariants<R: Rules>(session: &GameSession<R>) {
    if let Err(violations) = SessionInvariants::check_all(session) {
        for violation in &violations {
            error!(%violation, "Session invariant violated");
        }
        debug_assert!(violations.is_empty(), "Session invariants violated: {:?}", violations);
    }
}
