//! # Ledger rules
//!
//! Pure evaluation of every state transition. Each function inspects the
//! pre-operation state plus the caller's arguments and either rejects the
//! transition or returns the deltas to apply. Nothing here touches storage
//! or moves tokens, so entry points can validate fully before writing.

use soroban_sdk::Bytes;

use crate::types::{ProjectState, SpendRequest};
use crate::Error;

/// Outcome of an accepted contribution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContributionPlan {
    /// Portion of the contributed value that stays in the project.
    pub credited: i128,
    /// Portion returned to the contributor because it overshoots the target.
    pub refund: i128,
    /// Raised amount after crediting.
    pub raised_after: i128,
    pub reaches_target: bool,
}

pub fn validate_project(
    title: &Bytes,
    description: &Bytes,
    min_contribution: i128,
    target_amount: i128,
) -> Result<(), Error> {
    if title.is_empty() {
        return Err(Error::InvalidTitle);
    }
    if description.is_empty() {
        return Err(Error::InvalidDescription);
    }
    if min_contribution <= 0 {
        return Err(Error::InvalidMinContribution);
    }
    if target_amount <= 0 {
        return Err(Error::InvalidTarget);
    }
    Ok(())
}

/// Split `value` into the credited part and the refund that keeps
/// `raised_amount` at or below `target_amount`.
pub fn plan_contribution(
    min_contribution: i128,
    target_amount: i128,
    state: &ProjectState,
    value: i128,
) -> Result<ContributionPlan, Error> {
    if state.target_reached {
        return Err(Error::TargetMet);
    }
    if value < min_contribution {
        return Err(Error::InsufficientContribution);
    }

    let new_raised = state
        .raised_amount
        .checked_add(value)
        .ok_or(Error::Overflow)?;

    if new_raised >= target_amount {
        let refund = new_raised - target_amount;
        Ok(ContributionPlan {
            credited: value - refund,
            refund,
            raised_after: target_amount,
            reaches_target: true,
        })
    } else {
        Ok(ContributionPlan {
            credited: value,
            refund: 0,
            raised_after: new_raised,
            reaches_target: false,
        })
    }
}

/// Check a withdrawal of `stake`, the caller's recorded contribution if any.
///
/// `Error::LedgerInconsistency` means a stake exceeds the project total,
/// which only a broken ledger can produce.
pub fn plan_withdrawal(state: &ProjectState, stake: Option<i128>) -> Result<i128, Error> {
    if state.target_reached {
        return Err(Error::TargetReached);
    }
    let stake = stake.ok_or(Error::NotAContributor)?;
    if stake > state.raised_amount {
        return Err(Error::LedgerInconsistency);
    }
    if stake == 0 {
        return Err(Error::AlreadyWithdrawn);
    }
    Ok(stake)
}

pub fn check_approval(
    request: &SpendRequest,
    is_contributor: bool,
    already_approved: bool,
) -> Result<(), Error> {
    if request.spent {
        return Err(Error::FundsAlreadySpent);
    }
    if !is_contributor {
        return Err(Error::NotAContributor);
    }
    if already_approved {
        return Err(Error::AlreadyApproved);
    }
    Ok(())
}

pub fn check_request(state: &ProjectState, amount: i128) -> Result<(), Error> {
    if !state.target_reached {
        return Err(Error::TargetNotMet);
    }
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    if amount > state.raised_amount {
        return Err(Error::Overspend);
    }
    Ok(())
}

/// Strict majority: exactly half of the contributors is not enough.
pub fn has_quorum(approvals: u32, contributor_count: u32) -> bool {
    approvals > contributor_count / 2
}

pub fn check_spend(state: &ProjectState, request: &SpendRequest) -> Result<(), Error> {
    if request.spent {
        return Err(Error::FundsAlreadySpent);
    }
    if state.raised_amount < request.amount {
        return Err(Error::Overspend);
    }
    if !has_quorum(request.approvers.len(), state.contributor_count) {
        return Err(Error::UnapprovedRequest);
    }
    Ok(())
}
