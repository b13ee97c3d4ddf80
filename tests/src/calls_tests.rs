use crate::common::*;
use opguard_primitives::{constants::entry_point::DEPOSIT_TO_SELECTOR, EntityType};
use opguard_validator::{Rule, SimulationViolation};

fn deposit_to(beneficiary: u64) -> Vec<u8> {
    let mut input = DEPOSIT_TO_SELECTOR.to_vec();
    input.extend_from_slice(&[0u8; 12]);
    input.extend_from_slice(addr(beneficiary).as_bytes());
    input
}

#[test]
fn precompiles_are_callable() {
    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).call(0x04, 0, &[]).call(0x01, 0, &[]).call(0x100, 0, &[]);

    assert!(TestContext::new().validate(&trace.build()).is_ok());
}

#[test]
fn call_to_address_without_code() {
    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).call(0x50, 0, &[]);

    let err = TestContext::new().validate(&trace.build()).unwrap_err();
    assert_eq!(
        err,
        SimulationViolation::Policy {
            rule: Rule::CallWithoutCode,
            entity: EntityType::Account,
            contract: addr(ACCOUNT),
            label: "account".into(),
            target: Some(addr(0x50)),
        }
    );
}

#[test]
fn deposit_to_from_account_and_factory() {
    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).call(ENTRY_POINT, 1_000, &deposit_to(ACCOUNT));
    assert!(TestContext::new().validate(&trace.build()).is_ok());

    let mut trace = TraceBuilder::new();
    trace.phase(SENDER_CREATOR).enter(FACTORY).call(ENTRY_POINT, 1_000, &deposit_to(ACCOUNT));
    assert!(TestContext::new().with_factory(false).validate(&trace.build()).is_ok());
}

#[test]
fn paymaster_may_not_call_entry_point() {
    let mut trace = TraceBuilder::new();
    trace.phase(PAYMASTER).call(ENTRY_POINT, 0, &deposit_to(PAYMASTER));

    let err = TestContext::new().with_paymaster(true).validate(&trace.build()).unwrap_err();
    assert_eq!(err.rule(), Some(Rule::EntryPointCall));
    assert_eq!(err.entity(), EntityType::Paymaster);
}

#[test]
fn other_entry_point_methods_are_rejected() {
    // balanceOf(address)
    let mut input = vec![0x70, 0xa0, 0x82, 0x31];
    input.extend_from_slice(&[0u8; 32]);

    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).call(ENTRY_POINT, 0, &input);

    let err = TestContext::new().validate(&trace.build()).unwrap_err();
    assert_eq!(err.rule(), Some(Rule::EntryPointCall));
}

#[test]
fn value_transfers() {
    // fallback of the entry point with value
    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).call(ENTRY_POINT, 5, &[]);
    assert!(TestContext::new().validate(&trace.build()).is_ok());

    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).call(TOKEN, 5, &[]);
    let err = TestContext::new().validate(&trace.build()).unwrap_err();
    assert_eq!(err.rule(), Some(Rule::CallWithValue));
}

#[test]
fn outcome_lists_every_frame() {
    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).enter(TOKEN).leave().call(ENTRY_POINT, 7, &deposit_to(ACCOUNT));
    trace.phase(PAYMASTER);

    let outcome = TestContext::new().with_paymaster(false).validate(&trace.build()).unwrap();
    let targets: Vec<_> = outcome.accesses.iter().map(|a| (a.accessor, a.account)).collect();
    assert_eq!(
        targets,
        vec![
            (addr(ENTRY_POINT), addr(ACCOUNT)),
            (addr(ACCOUNT), addr(TOKEN)),
            (addr(ACCOUNT), addr(ENTRY_POINT)),
            (addr(ENTRY_POINT), addr(PAYMASTER)),
        ]
    );
    assert!(outcome.entities.paymaster.is_present());
    assert!(!outcome.entities.paymaster.is_staked);
}
