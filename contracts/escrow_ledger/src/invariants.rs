#![allow(dead_code)]

extern crate std;

use std::collections::BTreeSet;

use crate::types::ProjectDetails;

/// INV-1: the raised amount stays within `0..=target_amount`.
pub fn assert_raised_within_target(project: &ProjectDetails) {
    assert!(
        project.raised_amount >= 0 && project.raised_amount <= project.target_amount,
        "INV-1 violated: project {} raised {} outside 0..={}",
        project.index,
        project.raised_amount,
        project.target_amount
    );
}

/// INV-2: once set, `target_reached` never reverts.
pub fn assert_target_flag_sticky(before: &ProjectDetails, after: &ProjectDetails) {
    if before.target_reached {
        assert!(
            after.target_reached,
            "INV-2 violated: project {} lost its target_reached flag",
            after.index
        );
    }
}

/// INV-3: one contribution entry per contributor.
pub fn assert_unique_contributors(project: &ProjectDetails) {
    let mut seen = BTreeSet::new();
    for entry in project.contributions.iter() {
        assert!(
            seen.insert(entry.contributor.clone()),
            "INV-3 violated: project {} has duplicate contribution entries",
            project.index
        );
    }
}

/// INV-4: spend requests only exist on projects that reached their target.
pub fn assert_requests_require_target(project: &ProjectDetails) {
    if !project.spend_requests.is_empty() {
        assert!(
            project.target_reached,
            "INV-4 violated: project {} has requests but never reached its target",
            project.index
        );
    }
}

/// INV-5: approver sets hold no duplicates and never the creator.
pub fn assert_approvers_valid(project: &ProjectDetails) {
    for (i, request) in project.spend_requests.iter().enumerate() {
        let mut seen = BTreeSet::new();
        for approver in request.approvers.iter() {
            assert!(
                approver != project.creator,
                "INV-5 violated: creator approved request {i}"
            );
            assert!(
                seen.insert(approver.clone()),
                "INV-5 violated: request {i} has a duplicate approver"
            );
        }
    }
}

/// INV-6 and conservation: the raised amount equals the live stakes minus
/// every spent request, each counted once.
pub fn assert_conservation(project: &ProjectDetails) {
    let staked: i128 = project.contributions.iter().map(|c| c.amount).sum();
    let spent: i128 = project
        .spend_requests
        .iter()
        .filter(|r| r.spent)
        .map(|r| r.amount)
        .sum();
    assert_eq!(
        project.raised_amount,
        staked - spent,
        "conservation violated: raised {} != staked {} - spent {}",
        project.raised_amount,
        staked,
        spent
    );
}

/// Run all single-snapshot project invariants.
pub fn assert_all_project_invariants(project: &ProjectDetails) {
    assert_raised_within_target(project);
    assert_unique_contributors(project);
    assert_requests_require_target(project);
    assert_approvers_valid(project);
    assert_conservation(project);
}
