use crate::common::*;
use ethers::types::{H256, U256};
use opguard::fixture::{Fixture, MappingEntry, StakeEntry};
use opguard_primitives::{
    address_to_word, constants::validation::stake::MIN_UNSTAKE_DELAY, Opcode,
};
use opguard_validator::validate;
use std::{collections::HashMap, io::Write};

fn write(fixture: &Fixture) -> eyre::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(serde_json::to_string(fixture)?.as_bytes())?;
    Ok(file)
}

#[test]
fn fixture_matches_direct_validation() -> eyre::Result<()> {
    let ctx = TestContext::new().with_paymaster(true);
    let mut trace = TraceBuilder::new();
    trace.phase(PAYMASTER).op(Opcode::SELFBALANCE, &[]);

    let fixture = Fixture {
        user_operation: ctx.uo.clone(),
        entry_point: Some(addr(ENTRY_POINT)),
        steps: trace.build(),
        stakes: HashMap::from([(
            addr(PAYMASTER),
            StakeEntry {
                stake: ctx.val_config.min_stake,
                unstake_delay: U256::from(MIN_UNSTAKE_DELAY),
            },
        )]),
        code: vec![addr(ENTRY_POINT), addr(PAYMASTER)],
        labels: HashMap::new(),
        mappings: vec![],
    };

    let loaded = Fixture::load(write(&fixture)?.path())?;
    assert_eq!(loaded, fixture);

    let from_fixture = validate(
        &loaded.user_operation,
        &loaded.entry_point()?,
        &loaded.steps,
        &loaded.state(),
        ctx.val_config.clone(),
    );
    assert_eq!(from_fixture, ctx.validate(&fixture.steps));
    assert!(from_fixture.is_ok());

    Ok(())
}

#[test]
fn fixture_mapping_entries() -> eyre::Result<()> {
    let ctx = TestContext::new();
    let key = address_to_word(&addr(ACCOUNT));
    let parent_slot = H256::from_low_u64_be(3);
    let slot = opguard_validator::mapping::mapping_slot(&key, &parent_slot);

    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).enter(TOKEN).sstore(slot, 1);

    let mut fixture = Fixture {
        user_operation: ctx.uo.clone(),
        entry_point: Some(addr(ENTRY_POINT)),
        steps: trace.build(),
        code: vec![addr(ENTRY_POINT), addr(TOKEN)],
        mappings: vec![MappingEntry { contract: addr(TOKEN), key, parent_slot }],
        ..Default::default()
    };

    let loaded = Fixture::load(write(&fixture)?.path())?;
    let outcome = validate(
        &loaded.user_operation,
        &loaded.entry_point()?,
        &loaded.steps,
        &loaded.state(),
        ctx.val_config.clone(),
    );
    assert!(outcome.is_ok());

    // without the mapping entry the slot is not associated with the account
    fixture.mappings.clear();
    let loaded = Fixture::load(write(&fixture)?.path())?;
    let err = validate(
        &loaded.user_operation,
        &loaded.entry_point()?,
        &loaded.steps,
        &loaded.state(),
        ctx.val_config,
    )
    .unwrap_err();
    assert_eq!(err.rule(), None);

    Ok(())
}
