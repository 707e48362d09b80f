//! CLI argument parsing using clap

use clap::{Parser, Subcommand, ValueEnum};

/// minivol - mini volume and media control for Windows
///
/// Mirror and control the default audio endpoint and the active media
/// session from the command line or as a long-running applet loop
#[derive(Parser, Debug)]
#[command(name = "minivol")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show current volume, mute and playback state
    Status,

    /// Set the master volume (percent, clamped to 0-100)
    Volume {
        /// Target volume percent
        percent: u32,
    },

    /// Change the mute state
    Mute {
        /// Desired state
        #[arg(value_enum, default_value_t = MuteAction::Toggle)]
        action: MuteAction,
    },

    /// Toggle playback of the active media session
    PlayPause,

    /// Skip to the next track
    Next,

    /// Skip to the previous track
    Previous,

    /// Show title and artist of the current track
    MediaInfo,

    /// Run the applet loop, reconciling volume and playback state
    /// periodically until interrupted
    Run {
        /// Reconciliation interval in milliseconds (overrides settings)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Disable the media subsystem for this run
        #[arg(long)]
        no_media: bool,
    },

    /// Manage the run-on-startup registry entry
    Startup {
        /// Desired startup state
        #[arg(value_enum)]
        action: StartupAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuteAction {
    On,
    Off,
    Toggle,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartupAction {
    Enable,
    Disable,
    Status,
}

impl Args {
    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Run {
            interval: None,
            no_media: false,
        }
    }
}
