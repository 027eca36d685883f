use super::operand::{MASK_1, MASK_2};
use super::*;
use crate::error::{ExecError, FaultCode, code_of};

fn countdown(from: f64) -> Program {
    Program::new(vec![
        Instruction::new(Opcode::LOAD, [4.0, from]),
        Instruction::new(Opcode::SUB, [4.0, 4.0, 1.0]).with_flags(MASK_2),
        Instruction::new(Opcode::PUSH, [4.0]).with_flags(MASK_1),
        // Falls through to the jump while r4 != 0, skips it once r4 == 0.
        Instruction::new(Opcode::EQ, [4.0, 0.0, 0.0]).with_flags(MASK_1),
        Instruction::new(Opcode::JUMP, [1.0]),
    ])
}

#[test]
fn test_run_countdown_loop() {
    let program = countdown(5.0);
    let mut th = Thread::new(16);
    let out = th.run(&program, 1000).unwrap();
    assert_eq!(out.outcome, StepOutcome::Halt);
    assert_eq!(out.steps, 20);
    assert_eq!(th.stack(), &[4.0, 3.0, 2.0, 1.0, 0.0]);
    assert_eq!(th.pc(), program.len() as f64);
}

#[test]
fn test_run_respects_step_budget() {
    let program = countdown(5.0);
    let mut th = Thread::new(16);
    let out = th.run(&program, 3).unwrap();
    assert_eq!(out.outcome, StepOutcome::Continue);
    assert_eq!(out.steps, 3);
    assert_eq!(th.pc(), 3.0);

    // Resumes where it stopped.
    let out = th.run(&program, 1000).unwrap();
    assert_eq!(out.outcome, StepOutcome::Halt);
    assert_eq!(out.steps, 17);
}

#[test]
fn test_empty_program_halts() {
    let mut th = Thread::new(8);
    assert_eq!(th.step(&Program::default()).unwrap(), StepOutcome::Halt);
}

#[test]
fn test_recoverable_fault_restores_pc() {
    let program = Program::new(vec![Instruction::new(Opcode::POP, [10.0])]);
    let mut th = Thread::new(16);
    let err = th.run(&program, 10).unwrap_err();
    assert_eq!(code_of(err.as_ref()), FaultCode::Underflow);
    assert!(err.to_string().contains("pc 0"));
    assert_eq!(th.pc(), 0.0);
    assert!(!th.is_poisoned());

    // Retry succeeds once the stack has something on it.
    th.push(6.0).unwrap();
    assert_eq!(th.step(&program).unwrap(), StepOutcome::Continue);
    assert_eq!(th.register(10), Some(6.0));
}

#[test]
fn test_fatal_fault_poisons_run() {
    let program = Program::new(vec![Instruction::new(Opcode::LOAD, [10.0, -3.0]).with_flags(MASK_2)]);
    let mut th = Thread::new(16);
    let err = th.run(&program, 10).unwrap_err();
    let exec = err.downcast_ref::<ExecError>().unwrap();
    assert!(exec.is_fatal());
    assert_eq!(exec.code(), FaultCode::BadAccess);
    assert!(th.is_poisoned());
    assert_eq!(th.pc(), 1.0);

    let again = th.step(&program).unwrap_err();
    assert!(again.is_fatal());
}

#[test]
fn test_program_counter_out_of_range() {
    let program = countdown(1.0);
    let mut th = Thread::new(16);

    th.set_pc(program.len() as f64 + 2.0);
    assert_eq!(th.step(&program).unwrap_err().code(), FaultCode::BadAccess);

    th.set_pc(0.5);
    assert_eq!(th.step(&program).unwrap_err().code(), FaultCode::BadAccess);

    th.set_pc(-1.0);
    assert_eq!(th.step(&program).unwrap_err().code(), FaultCode::BadAccess);

    th.set_pc(program.len() as f64);
    assert_eq!(th.step(&program).unwrap(), StepOutcome::Halt);
}

#[test]
fn test_program_from_json() {
    let src = r#"{
        "instructions": [
            { "op": "Load", "operands": [4, 9] },
            { "op": "mul", "operands": [4, 4, 2], "flags": 2 },
            { "op": "Push", "operands": [4], "flags": 1 }
        ]
    }"#;
    let program = Program::from_json_str(src).unwrap();
    assert_eq!(program.len(), 3);
    assert_eq!(program.get(1).map(|i| i.op), Some(Opcode::MUL));

    let mut th = Thread::new(8);
    th.run(&program, 10).unwrap();
    assert_eq!(th.stack(), &[18.0]);
}

#[test]
fn test_program_from_json_rejects_unknown_opcode() {
    let err = Program::from_json_str(r#"{ "instructions": [ { "op": "Halt" } ] }"#).unwrap_err();
    assert!(format!("{err:#}").contains("Unrecognized opcode mnemonic"));
}
