use anyhow::Context;

use crate::config::fault_traces_enabled;
use crate::error::*;

fn fail_here() -> Fault {
    Fault::new(FaultCode::BadAccess, "slot 9 missing")
}

#[test]
fn test_code_of_fault_and_exec_error() {
    let fault = fail_here();
    assert_eq!(code_of(&fault), FaultCode::BadAccess);
    assert!(is_bad_access(&fault));
    assert!(!is_bad_opcode(&fault));

    let err = ExecError::Fatal(Fault::new(FaultCode::BadOpcode, "Trap not implemented"));
    assert_eq!(code_of(&err), FaultCode::BadOpcode);
    assert!(is_bad_opcode(&err));
}

#[test]
fn test_code_of_through_anyhow_context() {
    let res: anyhow::Result<()> = Err(ExecError::Fault(Fault::underflow())).context("while popping");
    let err = res.unwrap_err();
    assert_eq!(code_of(err.as_ref()), FaultCode::Underflow);
}

#[test]
fn test_foreign_errors_have_no_code() {
    let io = std::io::Error::other("disk on fire");
    assert_eq!(code_of(&io), FaultCode::None);
    assert!(!is_bad_access(&io));
    assert!(!is_bad_opcode(&io));
}

#[test]
fn test_display() {
    let fault = Fault::overflow(16);
    assert_eq!(fault.to_string(), "Stack overflow (limit 16)");
    assert_eq!(fault.code.to_string(), "overflow");

    let fatal = ExecError::Fatal(fail_here());
    assert_eq!(fatal.to_string(), "fatal bad access fault (thread poisoned): slot 9 missing");
    let recoverable = ExecError::from(fail_here());
    assert_eq!(recoverable.to_string(), "bad access fault: slot 9 missing");
}

#[test]
fn test_trace_rendering() {
    let fault = fail_here();
    let trace = fault.trace();
    let lines = trace.lines();
    assert_eq!(lines.len(), trace.frames().len());
    assert_eq!(trace.to_string(), lines.join("\n"));
    if fault_traces_enabled() {
        assert!(!trace.is_empty());
        assert!(lines.iter().all(|l| l.contains(" pc=0x") && l.contains(" entry=0x")));
    }
}

#[test]
fn test_trace_frame_format() {
    let frame = TraceFrame {
        line: Some(42),
        ip: 0x1234,
        file: Some("src/vm/exec.rs".to_string()),
        function: Some("zorya_core::vm::exec".to_string()),
        entry: 0x1200,
    };
    assert_eq!(frame.to_string(), "src/vm/exec.rs:42 pc=0x1234 zorya_core::vm::exec entry=0x1200");

    let bare = TraceFrame {
        line: None,
        ip: 0x10,
        file: None,
        function: None,
        entry: 0,
    };
    assert_eq!(bare.to_string(), "<unknown>:? pc=0x10 <unknown> entry=0x0");
}

#[test]
fn test_fault_equality_ignores_trace() {
    assert_eq!(fail_here(), fail_here());
    assert_ne!(fail_here(), Fault::underflow());
}
