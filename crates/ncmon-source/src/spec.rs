//! Command-line source strings
//!
//! - `-` reads stdin
//! - `cmd:<program> <args...>` runs a child process
//! - anything else is a serial port path (`/dev/ttyUSB0`, `COM9`)

use std::fmt;

use ncmon_core::prelude::*;

use crate::line::LineSource;
use crate::process::ProcessSource;
use crate::serial::{SerialOptions, SerialSource};
use crate::stdin::{StdinSource, STDIN_LABEL};

const COMMAND_PREFIX: &str = "cmd:";

/// Where one peer's log lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Serial { path: String },
    Process { program: String, args: Vec<String> },
    Stdin,
}

impl SourceSpec {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::invalid_source(raw));
        }
        if raw == "-" {
            return Ok(SourceSpec::Stdin);
        }
        if let Some(command) = raw.strip_prefix(COMMAND_PREFIX) {
            let mut parts = command.split_whitespace().map(str::to_string);
            let program = parts.next().ok_or_else(|| Error::invalid_source(raw))?;
            return Ok(SourceSpec::Process {
                program,
                args: parts.collect(),
            });
        }
        Ok(SourceSpec::Serial {
            path: raw.to_string(),
        })
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, SourceSpec::Stdin)
    }

    /// Open the source. Failure here is fatal at startup.
    ///
    /// Process sources need a running tokio runtime.
    pub fn open(&self, serial: SerialOptions) -> Result<Box<dyn LineSource>> {
        let source: Box<dyn LineSource> = match self {
            SourceSpec::Serial { path } => Box::new(SerialSource::open(path, serial)?),
            SourceSpec::Process { program, args } => Box::new(ProcessSource::spawn(program, args)?),
            SourceSpec::Stdin => Box::new(StdinSource::open()?),
        };
        Ok(source)
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Serial { path } => write!(f, "{}", path),
            SourceSpec::Process { program, args } if args.is_empty() => {
                write!(f, "{}{}", COMMAND_PREFIX, program)
            }
            SourceSpec::Process { program, args } => {
                write!(f, "{}{} {}", COMMAND_PREFIX, program, args.join(" "))
            }
            SourceSpec::Stdin => write!(f, "{}", STDIN_LABEL),
        }
    }
}

impl std::str::FromStr for SourceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serial_paths() {
        assert_eq!(
            SourceSpec::parse("/dev/ttyUSB0").unwrap(),
            SourceSpec::Serial {
                path: "/dev/ttyUSB0".to_string()
            }
        );
        assert_eq!(
            SourceSpec::parse("COM9").unwrap(),
            SourceSpec::Serial {
                path: "COM9".to_string()
            }
        );
    }

    #[test]
    fn test_parse_stdin() {
        assert!(SourceSpec::parse("-").unwrap().is_stdin());
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            SourceSpec::parse("cmd:idf.py -p /dev/ttyUSB1 monitor").unwrap(),
            SourceSpec::Process {
                program: "idf.py".to_string(),
                args: vec![
                    "-p".to_string(),
                    "/dev/ttyUSB1".to_string(),
                    "monitor".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            SourceSpec::parse(""),
            Err(Error::InvalidSource { .. })
        ));
        assert!(matches!(
            SourceSpec::parse("cmd:   "),
            Err(Error::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_display_round_trips_command() {
        let spec: SourceSpec = "cmd:pio device monitor".parse().unwrap();
        assert_eq!(spec.to_string(), "cmd:pio device monitor");
        assert_eq!(SourceSpec::Stdin.to_string(), "stdin");
    }

    #[tokio::test]
    async fn test_open_unknown_program_is_fatal() {
        let spec = SourceSpec::parse("cmd:ncmon-no-such-monitor").unwrap();
        let err = spec.open(SerialOptions::default()).err().unwrap();
        assert!(err.is_fatal());
    }
}
