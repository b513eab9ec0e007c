//! Property tests: random operation sequences checked against the ledger
//! invariants after every call, successful or not.

extern crate std;

use proptest::prelude::*;
use soroban_sdk::{testutils::Address as _, token, Address, Bytes, Env};
use std::vec::Vec;

use crate::invariants::{assert_all_project_invariants, assert_target_flag_sticky};
use crate::{Error, EscrowLedger, EscrowLedgerClient};

const CONTRIBUTORS: usize = 4;

#[derive(Clone, Debug)]
enum Op {
    Contribute(usize, i128),
    Withdraw(usize),
    Request(i128),
    Approve(usize, u32),
    Spend(u32),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..CONTRIBUTORS, 1i64..800).prop_map(|(who, value)| Op::Contribute(who, value as i128)),
        1 => (0..CONTRIBUTORS).prop_map(Op::Withdraw),
        2 => (1i64..1_200).prop_map(|amount| Op::Request(amount as i128)),
        3 => (0..CONTRIBUTORS, 0u32..4).prop_map(|(who, request)| Op::Approve(who, request)),
        2 => (0u32..4).prop_map(Op::Spend),
    ]
}

/// Apply `ops` to a fresh 50 / 2_000 project and check every step.
fn run_sequence(ops: &[Op]) {
    let env = Env::default();
    env.mock_all_auths();
    let token_admin = Address::generate(&env);
    let sac = env.register_stellar_asset_contract_v2(token_admin);
    let token = token::Client::new(&env, &sac.address());
    let minter = token::StellarAssetClient::new(&env, &sac.address());
    let contract_id = env.register(EscrowLedger, (sac.address(),));
    let client = EscrowLedgerClient::new(&env, &contract_id);

    let creator = Address::generate(&env);
    client.create_project(
        &creator,
        &Bytes::from_slice(&env, b"Solar roof"),
        &Bytes::from_slice(&env, b"Panels for the clinic"),
        &50,
        &2_000,
    );

    let contributors: Vec<Address> = (0..CONTRIBUTORS)
        .map(|_| {
            let who = Address::generate(&env);
            minter.mint(&who, &100_000);
            who
        })
        .collect();
    let receiver = Address::generate(&env);
    let purpose = Bytes::from_slice(&env, b"Invoice");

    let mut before = client.get_project_details(&creator, &0);

    for op in ops {
        match op {
            Op::Contribute(who, value) => {
                let _ = client.try_contribute(&contributors[*who], &creator, &0, value);
            }
            Op::Withdraw(who) => {
                let _ = client.try_withdraw_contribution(&contributors[*who], &creator, &0);
            }
            Op::Request(amount) => {
                let _ = client.try_request_funds(&creator, &0, amount, &receiver, &purpose);
            }
            Op::Approve(who, request) => {
                let _ = client.try_approve(&contributors[*who], &creator, &0, request);
            }
            Op::Spend(request) => {
                let result = client.try_spend_funds(&creator, &0, request);
                match before.spend_requests.get(*request) {
                    Some(pending) => {
                        let quorum = pending.approvers.len() > before.contributions.len() / 2;
                        if result.is_ok() {
                            assert!(quorum, "spend succeeded without a strict majority");
                        } else if result == Err(Ok(Error::UnapprovedRequest)) {
                            assert!(!quorum, "spend refused despite a strict majority");
                        }
                    }
                    None => assert_eq!(result, Err(Ok(Error::RequestNotFound))),
                }
            }
        }

        let after = client.get_project_details(&creator, &0);
        assert_all_project_invariants(&after);
        assert_target_flag_sticky(&before, &after);

        // Custody always covers what the ledger says is raised.
        assert_eq!(token.balance(&client.address), after.raised_amount);
        before = after;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_across_operation_sequences(
        ops in prop::collection::vec(arb_op(), 1..60),
    ) {
        run_sequence(&ops);
    }
}
