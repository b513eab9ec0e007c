extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    token, vec, Address, Bytes, Env, IntoVal, Symbol, TryIntoVal, Val, Vec,
};

use crate::events::{
    Contributed, FundsRequested, FundsSpent, ProjectCreated, Refunded, RequestApproved, Withdrawn,
};
use crate::{EscrowLedger, EscrowLedgerClient};

fn setup() -> (Env, EscrowLedgerClient<'static>, token::Client<'static>) {
    let env = Env::default();
    env.mock_all_auths();
    let token_admin = Address::generate(&env);
    let addr = env.register_stellar_asset_contract_v2(token_admin);
    let token = token::Client::new(&env, &addr.address());
    let contract_id = env.register(EscrowLedger, (token.address.clone(),));
    let client = EscrowLedgerClient::new(&env, &contract_id);
    (env, client, token)
}

fn funded(env: &Env, token: &token::Client, amount: i128) -> Address {
    let who = Address::generate(env);
    token::StellarAssetClient::new(env, &token.address).mint(&who, &amount);
    who
}

/// Events published by the ledger itself during the last invocation,
/// token contract events filtered out.
fn ledger_events(env: &Env, client: &EscrowLedgerClient) -> std::vec::Vec<(Vec<Val>, Val)> {
    env.events()
        .all()
        .iter()
        .filter(|(contract, _, _)| *contract == client.address)
        .map(|(_, topics, data)| (topics, data))
        .collect()
}

fn topics(env: &Env, name: Symbol, creator: &Address, index: u32) -> Vec<Val> {
    vec![
        env,
        name.into_val(env),
        creator.into_val(env),
        index.into_val(env),
    ]
}

fn create(env: &Env, client: &EscrowLedgerClient, target: i128) -> Address {
    let creator = Address::generate(env);
    client.create_project(
        &creator,
        &Bytes::from_slice(env, b"Library"),
        &Bytes::from_slice(env, b"Books for the school"),
        &100,
        &target,
    );
    creator
}

#[test]
fn test_project_created_event() {
    let (env, client, _) = setup();
    let creator = create(&env, &client, 5_000);

    let (event_topics, data) = ledger_events(&env, &client).last().unwrap().clone();
    assert_eq!(event_topics, topics(&env, symbol_short!("created"), &creator, 0));

    let data: ProjectCreated = data.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        ProjectCreated {
            creator,
            index: 0,
            min_contribution: 100,
            target_amount: 5_000,
        }
    );
}

#[test]
fn test_contributed_and_refunded_events() {
    let (env, client, token) = setup();
    let creator = create(&env, &client, 1_000);
    let alice = funded(&env, &token, 1_500);

    client.contribute(&alice, &creator, &0, &1_500);

    let events = ledger_events(&env, &client);
    let n = events.len();
    assert!(n >= 2);

    let (refund_topics, refund_data) = events[n - 2].clone();
    assert_eq!(refund_topics, topics(&env, symbol_short!("refunded"), &creator, 0));
    let refund: Refunded = refund_data.try_into_val(&env).unwrap();
    assert_eq!(
        refund,
        Refunded {
            contributor: alice.clone(),
            amount: 500,
        }
    );

    let (contrib_topics, contrib_data) = events[n - 1].clone();
    assert_eq!(contrib_topics, topics(&env, symbol_short!("contrib"), &creator, 0));
    let contributed: Contributed = contrib_data.try_into_val(&env).unwrap();
    assert_eq!(
        contributed,
        Contributed {
            contributor: alice,
            amount: 1_000,
            raised_amount: 1_000,
            target_reached: true,
        }
    );
}

#[test]
fn test_contribution_without_excess_emits_no_refund() {
    let (env, client, token) = setup();
    let creator = create(&env, &client, 1_000);
    let alice = funded(&env, &token, 400);

    client.contribute(&alice, &creator, &0, &400);

    let refunded = topics(&env, symbol_short!("refunded"), &creator, 0);
    let events = ledger_events(&env, &client);
    assert_eq!(
        events.last().unwrap().0,
        topics(&env, symbol_short!("contrib"), &creator, 0)
    );
    assert!(events.iter().all(|(t, _)| *t != refunded));
}

#[test]
fn test_withdrawn_event() {
    let (env, client, token) = setup();
    let creator = create(&env, &client, 1_000);
    let alice = funded(&env, &token, 400);
    client.contribute(&alice, &creator, &0, &400);

    client.withdraw_contribution(&alice, &creator, &0);

    let events = ledger_events(&env, &client);
    let (event_topics, data) = events.last().unwrap().clone();
    assert_eq!(event_topics, topics(&env, symbol_short!("withdrawn"), &creator, 0));
    let data: Withdrawn = data.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        Withdrawn {
            contributor: alice,
            amount: 400,
            raised_amount: 0,
        }
    );
}

#[test]
fn test_request_approve_and_spend_events() {
    let (env, client, token) = setup();
    let creator = create(&env, &client, 1_000);
    let alice = funded(&env, &token, 1_000);
    let receiver = Address::generate(&env);
    client.contribute(&alice, &creator, &0, &1_000);

    client.request_funds(
        &creator,
        &0,
        &250,
        &receiver,
        &Bytes::from_slice(&env, b"Shelves"),
    );
    let (event_topics, data) = ledger_events(&env, &client).last().unwrap().clone();
    assert_eq!(event_topics, topics(&env, symbol_short!("requested"), &creator, 0));
    let data: FundsRequested = data.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        FundsRequested {
            request_index: 0,
            amount: 250,
            receiver: receiver.clone(),
        }
    );

    client.approve(&alice, &creator, &0, &0);
    let (event_topics, data) = ledger_events(&env, &client).last().unwrap().clone();
    assert_eq!(event_topics, topics(&env, symbol_short!("approved"), &creator, 0));
    let data: RequestApproved = data.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        RequestApproved {
            request_index: 0,
            approver: alice,
            approvals: 1,
        }
    );

    client.spend_funds(&creator, &0, &0);
    let (event_topics, data) = ledger_events(&env, &client).last().unwrap().clone();
    assert_eq!(event_topics, topics(&env, symbol_short!("spent"), &creator, 0));
    let data: FundsSpent = data.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        FundsSpent {
            request_index: 0,
            amount: 250,
            receiver,
            raised_amount: 750,
        }
    );
}
