use crate::common::*;
use ethers::{
    types::{Bytes, H256, U256},
    utils::get_create2_address,
};
use opguard_primitives::{EntityType, Opcode, TraceStep};
use opguard_validator::{Rule, SimulationViolation};

#[test]
fn balance_of_staked_paymaster() {
    let mut trace = TraceBuilder::new();
    trace
        .phase(PAYMASTER)
        .op(Opcode::SELFBALANCE, &[])
        .op(Opcode::BALANCE, &[word(addr(TOKEN))]);
    let trace = trace.build();

    assert!(TestContext::new().with_paymaster(true).validate(&trace).is_ok());

    let err = TestContext::new().with_paymaster(false).validate(&trace).unwrap_err();
    assert!(matches!(
        err,
        SimulationViolation::InvalidOpcode {
            entity: EntityType::Paymaster,
            opcode: Opcode::SELFBALANCE,
            rule: Rule::UnstakedBalance,
            ..
        }
    ));
}

#[test]
fn gas_followed_by_call() {
    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).op(Opcode::GAS, &[]).call(TOKEN, 0, &[]);
    assert!(TestContext::new().validate(&trace.build()).is_ok());

    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).op(Opcode::GAS, &[]).op(Opcode::POP, &[U256::from(30_000)]);
    let err = TestContext::new().validate(&trace.build()).unwrap_err();
    assert_eq!(err.rule(), Some(Rule::GasNotFollowedByCall));
}

#[test]
fn banned_opcodes() {
    let banned =
        [Opcode::TIMESTAMP, Opcode::NUMBER, Opcode::ORIGIN, Opcode::CREATE, Opcode::COINBASE];
    for opcode in banned {
        let mut trace = TraceBuilder::new();
        trace.phase(ACCOUNT).op(opcode, &[]);

        let err = TestContext::new().validate(&trace.build()).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::ForbiddenOpcode), "{opcode}");
    }
}

#[test]
fn banned_opcode_in_entry_point_frame_is_ignored() {
    let mut trace = TraceBuilder::new();
    trace.op(Opcode::TIMESTAMP, &[]).phase(ACCOUNT).op(Opcode::PUSH1, &[]);

    assert!(TestContext::new().validate(&trace.build()).is_ok());
}

#[test]
fn out_of_gas() {
    let mut trace = TraceBuilder::new();
    trace.phase(ACCOUNT).op(Opcode::SLOAD, &[U256::one()]);
    let mut steps = trace.build();
    if let Some(step) = steps.last_mut() {
        step.is_out_of_gas = true;
    }

    let err = TestContext::new().validate(&steps).unwrap_err();
    assert_eq!(err.rule(), Some(Rule::OutOfGas));
    assert_eq!(err.entity(), EntityType::Account);
}

mod create2 {
    use super::*;

    const INIT_CODE: [u8; 6] = [0x60, 0x00, 0x60, 0x00, 0xf3, 0x00];

    fn salt() -> H256 {
        H256::from_low_u64_be(42)
    }

    /// Trace of the factory deploying through CREATE2 `count` times with `salt`
    fn deploy(count: usize, salt: H256) -> Vec<TraceStep> {
        let mut trace = TraceBuilder::new();
        trace.phase(SENDER_CREATOR).enter(FACTORY);
        for _ in 0..count {
            let stack = [slot_word(salt), U256::from(INIT_CODE.len()), U256::zero(), U256::zero()];
            trace.op(Opcode::CREATE2, &stack);
        }

        let mut steps = trace.build();
        for step in steps.iter_mut().filter(|s| s.opcode == Opcode::CREATE2) {
            step.memory_input = Bytes::from(INIT_CODE.to_vec());
        }
        steps
    }

    fn context() -> TestContext {
        let mut ctx = TestContext::new().with_factory(false);
        ctx.uo.sender = get_create2_address(addr(FACTORY), salt().to_fixed_bytes(), INIT_CODE);
        ctx.state.set_code(ctx.uo.sender);
        ctx
    }

    #[test]
    fn single_create2_of_sender() {
        assert!(context().validate(&deploy(1, salt())).is_ok());
    }

    #[test]
    fn second_create2_is_rejected() {
        let err = context().validate(&deploy(2, salt())).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::Create2));
        assert_eq!(err.entity(), EntityType::Factory);
    }

    #[test]
    fn create2_of_other_address_is_rejected() {
        let err = context().validate(&deploy(1, H256::from_low_u64_be(43))).unwrap_err();
        assert!(matches!(
            err,
            SimulationViolation::Policy { rule: Rule::Create2, target: Some(target), .. }
                if target != context().uo.sender
        ));
    }

    #[test]
    fn create2_without_init_code_is_rejected() {
        let mut ctx = context();
        ctx.uo.init_code = Bytes::default();
        // without init code there is no factory, the account deploys by itself
        let mut trace = TraceBuilder::new();
        trace.phase(ACCOUNT);
        let stack = [slot_word(salt()), U256::from(INIT_CODE.len()), U256::zero(), U256::zero()];
        trace.op(Opcode::CREATE2, &stack);

        let err = ctx.validate(&trace.build()).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::Create2));
    }
}
