//! Thread configuration and environment toggles.

use std::path::Path;
use std::sync::Once;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Fault, FaultCode};
use crate::vm::RESERVED_REGISTERS;

pub const DEFAULT_REGISTERS: usize = 256;

const DEFAULT_TRACE_FILTER: &str = "zorya::vm::exec=debug,zorya::vm::run=debug,zorya::config=info";

/// Sizing of a [`crate::vm::Thread`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    /// Register count, including the reserved registers.
    pub registers: usize,
    /// Backing capacity reserved for the stack up front.
    pub stack_capacity: usize,
    /// Maximum number of live stack slots; pushes beyond it overflow.
    pub stack_limit: Option<usize>,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            registers: DEFAULT_REGISTERS,
            stack_capacity: 0,
            stack_limit: None,
        }
    }
}

impl ThreadConfig {
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: ThreadConfig = toml::from_str(src).context("invalid thread config")?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&src).with_context(|| format!("in {}", path.display()))
    }

    /// Overlay `ZORYA_REGISTERS`, `ZORYA_STACK_CAPACITY` and `ZORYA_STACK_LIMIT`.
    pub fn from_env(self) -> Result<Self> {
        let config = self.overlay(|name| std::env::var(name).ok())?;
        debug!(target: "zorya::config", config = ?config, "thread config resolved from env");
        Ok(config)
    }

    /// Overlay the `ZORYA_*` settings found through `lookup`. Unset or blank
    /// values leave the field alone.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| -> Result<Option<usize>> {
            let Some(raw) = lookup(name) else {
                return Ok(None);
            };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let v = trimmed
                .parse::<usize>()
                .with_context(|| format!("{name} must be a non-negative integer, got '{raw}'"))?;
            Ok(Some(v))
        };
        if let Some(v) = read("ZORYA_REGISTERS")? {
            self.registers = v;
        }
        if let Some(v) = read("ZORYA_STACK_CAPACITY")? {
            self.stack_capacity = v;
        }
        if let Some(v) = read("ZORYA_STACK_LIMIT")? {
            self.stack_limit = Some(v);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), Fault> {
        if self.registers < RESERVED_REGISTERS {
            return Err(Fault::new(
                FaultCode::BadArgument,
                format!(
                    "Register count {} is below the {} reserved registers.",
                    self.registers, RESERVED_REGISTERS
                ),
            ));
        }
        Ok(())
    }
}

/// A `ZORYA_*` switch: `0`/`false`/`off` disable it, `1`/`true`/`on` enable
/// it, anything else enables it with that text as a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Switch {
    Off,
    On,
    With(String),
}

impl Switch {
    /// Parse a switch value; `None` (unset) and blank map to `unset`.
    pub(crate) fn parse(raw: Option<&str>, unset: Switch) -> Switch {
        let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return unset;
        };
        match value.to_ascii_lowercase().as_str() {
            "0" | "false" | "off" => Switch::Off,
            "1" | "true" | "on" => Switch::On,
            _ => Switch::With(value.to_string()),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        !matches!(self, Switch::Off)
    }
}

fn switch_from_env(name: &str, unset: Switch) -> Switch {
    Switch::parse(std::env::var(name).ok().as_deref(), unset)
}

static FAULT_TRACES: Lazy<bool> = Lazy::new(|| switch_from_env("ZORYA_FAULT_TRACE", Switch::On).enabled());

/// Whether faults capture a call trace. Read once from `ZORYA_FAULT_TRACE`.
pub fn fault_traces_enabled() -> bool {
    *FAULT_TRACES
}

static TRACING_INIT: Once = Once::new();

/// Install a stderr subscriber when `ZORYA_TRACE` asks for one.
///
/// `1`/`true`/`on` use `RUST_LOG` or the default filter, any other value is
/// taken as an `EnvFilter` expression, and unset or `0`/`false`/`off` leave
/// logging off.
pub fn init_tracing() {
    let filter_expr = match switch_from_env("ZORYA_TRACE", Switch::Off) {
        Switch::Off => return,
        Switch::On => std::env::var("RUST_LOG").ok(),
        Switch::With(expr) => Some(expr),
    };

    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter = filter_expr
            .and_then(|expr| EnvFilter::try_new(expr).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_TRACE_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init();
    });
}
