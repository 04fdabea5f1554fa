//! Signal names accepted by `kill`.

use std::fmt;
use std::str::FromStr;

use crate::error::InputValidationError;

const SIGNAL_NAMES: &[&str] = &[
    "HUP", "INT", "QUIT", "ILL", "TRAP", "ABRT", "BUS", "FPE", "KILL", "USR1", "SEGV", "USR2",
    "PIPE", "ALRM", "TERM", "STKFLT", "CHLD", "CONT", "STOP", "TSTP", "TTIN", "TTOU", "URG",
    "XCPU", "XFSZ", "VTALRM", "PROF", "WINCH", "IO", "PWR", "SYS",
];

/// Highest real-time signal number on Linux.
const MAX_SIGNAL_NUMBER: u8 = 64;

/// A validated signal, rendered as the runtime expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A named signal, stored in canonical `SIGNAME` form.
    Named(&'static str),
    /// A signal given by number.
    Number(u8),
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "SIG{name}"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl FromStr for Signal {
    type Err = InputValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unknown = || InputValidationError::UnknownSignal {
            signal: String::from(value),
        };
        let trimmed = value.trim();

        if let Ok(number) = trimmed.parse::<u8>() {
            return if (1..=MAX_SIGNAL_NUMBER).contains(&number) {
                Ok(Self::Number(number))
            } else {
                Err(unknown())
            };
        }

        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        SIGNAL_NAMES
            .iter()
            .copied()
            .find(|name| *name == bare)
            .map(Self::Named)
            .ok_or_else(unknown)
    }
}
