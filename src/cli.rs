//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ncmon_source::SourceSpec;

/// ncmon - serial log monitor for network-coding and clock-sync experiments
#[derive(Parser, Debug)]
#[command(name = "ncmon", version)]
#[command(about = "Live charts from the serial logs of network-coding boards", long_about = None)]
pub struct Cli {
    /// Settings file (default: .ncmon/config.toml in the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Serial baud rate, overriding the settings file
    #[arg(long, global = true, value_name = "RATE")]
    pub baud: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Monitor a relay and its native peers
    Coding(CodingArgs),
    /// Monitor clock synchronisation through an edge observer
    Sync(SyncArgs),
    /// Show coding runs saved with `coding --save`
    Replay(ReplayArgs),
    /// List serial ports
    Ports,
}

/// Source strings: a serial port path, `-` for stdin or `cmd:<program> <args>`.
#[derive(Args, Debug)]
pub struct CodingArgs {
    /// Relay source followed by one source per native peer
    #[arg(
        short = 'p',
        long = "ports",
        required = true,
        num_args = 1..,
        value_name = "SOURCE",
        value_parser = SourceSpec::parse
    )]
    pub ports: Vec<SourceSpec>,

    /// Samples kept per measured quantity
    #[arg(short, long, value_name = "N")]
    pub window: Option<usize>,

    /// Save the coding-gain series to the export file when the run ends
    #[arg(short, long)]
    pub save: bool,

    /// Print JSON lines instead of drawing charts
    #[arg(long)]
    pub headless: bool,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Edge observer source
    #[arg(long, value_name = "SOURCE", value_parser = SourceSpec::parse)]
    pub observer: SourceSpec,

    /// First sync peer
    #[arg(long, value_name = "SOURCE", value_parser = SourceSpec::parse)]
    pub peer1: Option<SourceSpec>,

    /// Second sync peer
    #[arg(long, value_name = "SOURCE", value_parser = SourceSpec::parse)]
    pub peer2: Option<SourceSpec>,

    /// Samples kept per measured quantity
    #[arg(short, long, value_name = "N", default_value_t = 100)]
    pub measure: usize,

    /// Save the final sync statistics as JSON when the run ends
    #[arg(short, long)]
    pub save: bool,

    /// Print JSON lines instead of drawing charts
    #[arg(long)]
    pub headless: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Export file (default: the configured export path)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Values shown per series
    #[arg(short, long, value_name = "N", default_value_t = 150)]
    pub range: usize,

    /// Print the blocks as JSON instead of drawing charts
    #[arg(long)]
    pub headless: bool,
}

impl SyncArgs {
    pub fn peers(&self) -> Vec<SourceSpec> {
        self.peer1.iter().chain(self.peer2.iter()).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_coding_ports_relay_first() {
        let cli = Cli::parse_from([
            "ncmon", "coding", "-p", "/dev/ttyUSB0", "/dev/ttyUSB1", "cmd:cat log.txt", "--save",
        ]);
        let Command::Coding(args) = cli.command else {
            panic!("expected coding");
        };
        assert_eq!(args.ports.len(), 3);
        assert_eq!(
            args.ports[0],
            SourceSpec::Serial {
                path: "/dev/ttyUSB0".to_string()
            }
        );
        assert_eq!(
            args.ports[2],
            SourceSpec::Process {
                program: "cat".to_string(),
                args: vec!["log.txt".to_string()]
            }
        );
        assert!(args.save);
        assert!(!args.headless);
    }

    #[test]
    fn test_sync_defaults() {
        let cli = Cli::parse_from(["ncmon", "--baud", "115200", "sync", "--observer", "-"]);
        assert_eq!(cli.baud, Some(115200));
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert!(args.observer.is_stdin());
        assert_eq!(args.measure, 100);
        assert!(!args.save);
        assert!(args.peers().is_empty());
    }

    #[test]
    fn test_sync_save_flag() {
        let cli = Cli::parse_from([
            "ncmon", "sync", "--observer", "/dev/ttyUSB0", "--peer1", "-", "-s",
        ]);
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert!(args.save);
        assert_eq!(args.peers(), vec![SourceSpec::Stdin]);
    }

    #[test]
    fn test_replay_defaults() {
        let cli = Cli::parse_from(["ncmon", "replay"]);
        let Command::Replay(args) = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(args.range, 150);
        assert!(args.file.is_none());
    }

    #[test]
    fn test_coding_requires_ports() {
        assert!(Cli::try_parse_from(["ncmon", "coding"]).is_err());
    }

    #[test]
    fn test_empty_source_is_rejected() {
        assert!(Cli::try_parse_from(["ncmon", "sync", "--observer", ""]).is_err());
    }
}
