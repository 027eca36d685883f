//! Fault model for the execution core.
//!
//! A [`Fault`] is a classified error value carrying the call path that built
//! it. Recoverable faults and thread-poisoning failures are distinguished by
//! [`ExecError`].

use std::fmt;

use crate::config::fault_traces_enabled;

/// Classification of a [`Fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    /// Not a fault raised by this crate.
    None,
    Underflow,
    Overflow,
    BadArgument,
    BadAccess,
    BadOpcode,
}

impl FaultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::None => "no error",
            FaultCode::Underflow => "underflow",
            FaultCode::Overflow => "overflow",
            FaultCode::BadArgument => "bad argument",
            FaultCode::BadAccess => "bad access",
            FaultCode::BadOpcode => "bad opcode",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured call frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub line: Option<u32>,
    /// Instruction pointer of the frame.
    pub ip: usize,
    pub file: Option<String>,
    pub function: Option<String>,
    /// Start address of the enclosing symbol.
    pub entry: usize,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("<unknown>");
        let function = self.function.as_deref().unwrap_or("<unknown>");
        match self.line {
            Some(line) => write!(f, "{file}:{line}")?,
            None => write!(f, "{file}:?")?,
        }
        write!(f, " pc=0x{:x} {function} entry=0x{:x}", self.ip, self.entry)
    }
}

/// Call path recorded when a [`Fault`] is built. Immutable once captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    frames: Vec<TraceFrame>,
}

impl Trace {
    /// Capture the current call stack, skipping the capture machinery itself.
    pub fn capture() -> Self {
        if !fault_traces_enabled() {
            return Self::default();
        }
        let bt = backtrace::Backtrace::new();
        let mut frames = Vec::new();
        let mut in_prologue = true;
        for frame in bt.frames() {
            let symbol = frame.symbols().first();
            let function = symbol.and_then(|s| s.name()).map(|n| n.to_string());
            if in_prologue {
                if let Some(name) = function.as_deref()
                    && is_capture_frame(name)
                {
                    continue;
                }
                in_prologue = false;
            }
            frames.push(TraceFrame {
                line: symbol.and_then(|s| s.lineno()),
                ip: frame.ip() as usize,
                file: symbol.and_then(|s| s.filename()).map(|p| p.display().to_string()),
                function,
                entry: frame.symbol_address() as usize,
            });
        }
        Self { frames }
    }

    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// One rendered line per frame, innermost first.
    pub fn lines(&self) -> Vec<String> {
        self.frames.iter().map(ToString::to_string).collect()
    }
}

fn is_capture_frame(name: &str) -> bool {
    name.starts_with("backtrace::")
        || name.contains("Trace::capture")
        || name.contains("Fault::new")
        || name.contains("Fault::underflow")
        || name.contains("Fault::overflow")
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// A classified, recoverable failure.
#[derive(Debug, Clone)]
pub struct Fault {
    pub code: FaultCode,
    pub message: String,
    trace: Trace,
}

impl Fault {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace: Trace::capture(),
        }
    }

    pub fn underflow() -> Self {
        Self::new(FaultCode::Underflow, "Stack underflow")
    }

    pub fn overflow(limit: usize) -> Self {
        Self::new(FaultCode::Overflow, format!("Stack overflow (limit {limit})"))
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }
}

impl PartialEq for Fault {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Fault {}

/// Failure of a single dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecError {
    /// Raised before the thread was touched; the thread is still usable.
    Fault(Fault),
    /// Raised mid-instruction; the thread is poisoned until reset.
    Fatal(Fault),
}

impl ExecError {
    pub fn fault(&self) -> &Fault {
        match self {
            ExecError::Fault(fault) | ExecError::Fatal(fault) => fault,
        }
    }

    pub fn code(&self) -> FaultCode {
        self.fault().code
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecError::Fatal(_))
    }
}

impl From<Fault> for ExecError {
    fn from(fault: Fault) -> Self {
        ExecError::Fault(fault)
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Fault(fault) => write!(f, "{} fault: {}", fault.code, fault.message),
            ExecError::Fatal(fault) => write!(f, "fatal {} fault (thread poisoned): {}", fault.code, fault.message),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.fault())
    }
}

/// Code of the first [`Fault`] found in `err`'s source chain, or
/// [`FaultCode::None`] for foreign errors.
pub fn code_of(err: &(dyn std::error::Error + 'static)) -> FaultCode {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(fault) = e.downcast_ref::<Fault>() {
            return fault.code;
        }
        if let Some(exec) = e.downcast_ref::<ExecError>() {
            return exec.code();
        }
        cur = e.source();
    }
    FaultCode::None
}

pub fn is_bad_opcode(err: &(dyn std::error::Error + 'static)) -> bool {
    code_of(err) == FaultCode::BadOpcode
}

pub fn is_bad_access(err: &(dyn std::error::Error + 'static)) -> bool {
    code_of(err) == FaultCode::BadAccess
}
