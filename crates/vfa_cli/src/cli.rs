use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vfa_core::config::Settings;
use vfa_core::models::TieBreakMode;

#[derive(Parser)]
#[command(name = "vfa")]
#[command(author, version, about = "Align a recorded capture with its original frame sequence")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = ".config/vfa.toml")]
    pub config: PathBuf,

    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find scene-change keyframes in both sequences
    Detect {
        #[command(flatten)]
        paths: PathArgs,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Pair original keyframes with recorded keyframes
    Match {
        #[command(flatten)]
        paths: PathArgs,

        #[command(flatten)]
        matching: MatchingArgs,
    },

    /// Refine every frame between matched keyframes
    Refine {
        #[command(flatten)]
        paths: PathArgs,

        #[command(flatten)]
        refinement: RefinementArgs,
    },

    /// Detect, match and refine in one go
    Run {
        #[command(flatten)]
        paths: PathArgs,

        #[command(flatten)]
        detection: DetectionArgs,

        #[command(flatten)]
        matching: MatchingArgs,

        #[command(flatten)]
        refinement: RefinementArgs,
    },

    /// Inspect or edit the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Set one value, e.g. `matching.window_radius 120`
    Set {
        /// Dotted key: <section>.<key>
        key: String,
        /// New value
        value: String,
    },
}

/// Locations that override `[paths]` for one invocation.
#[derive(Args)]
pub struct PathArgs {
    /// Directory of original frames
    #[arg(long)]
    pub original: Option<PathBuf>,

    /// Directory of recorded frames
    #[arg(long)]
    pub recorded: Option<PathBuf>,

    /// Folder for artifacts
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Name used for the run log file
    #[arg(long, default_value = "align")]
    pub run_name: String,
}

#[derive(Args)]
pub struct DetectionArgs {
    /// Keyframe when similarity to the previous frame drops below this
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Args)]
pub struct MatchingArgs {
    /// Maximum index distance of candidate keyframes
    #[arg(long)]
    pub window_radius: Option<usize>,

    /// Minimum score for an accepted match
    #[arg(long)]
    pub accept_threshold: Option<f64>,

    /// Canonical choice among equally scored candidates
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreakArg>,
}

#[derive(Args)]
pub struct RefinementArgs {
    /// Recorded frames checked on each side of the implied index
    #[arg(long)]
    pub look_around: Option<usize>,

    /// Worker threads (0 = one per CPU)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TieBreakArg {
    FirstSeen,
    NearestIndex,
}

impl From<TieBreakArg> for TieBreakMode {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::FirstSeen => TieBreakMode::FirstSeen,
            TieBreakArg::NearestIndex => TieBreakMode::NearestIndex,
        }
    }
}

/// Command-line values that take precedence over the config file.
pub trait ApplyOverrides {
    fn apply(&self, settings: &mut Settings);
}

impl ApplyOverrides for PathArgs {
    fn apply(&self, settings: &mut Settings) {
        let paths = &mut settings.paths;
        if let Some(ref dir) = self.original {
            paths.original_frames = dir.to_string_lossy().into_owned();
        }
        if let Some(ref dir) = self.recorded {
            paths.recorded_frames = dir.to_string_lossy().into_owned();
        }
        if let Some(ref dir) = self.output {
            paths.output_folder = dir.to_string_lossy().into_owned();
        }
    }
}

impl ApplyOverrides for DetectionArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(threshold) = self.threshold {
            settings.detection.threshold = threshold;
        }
    }
}

impl ApplyOverrides for MatchingArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(radius) = self.window_radius {
            settings.matching.window_radius = radius;
        }
        if let Some(accept) = self.accept_threshold {
            settings.matching.accept_threshold = accept;
        }
        if let Some(tie_break) = self.tie_break {
            settings.matching.tie_break = tie_break.into();
        }
    }
}

impl ApplyOverrides for RefinementArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(look_around) = self.look_around {
            settings.refinement.look_around = look_around;
        }
        if let Some(workers) = self.workers {
            settings.refinement.workers = workers;
        }
    }
}
