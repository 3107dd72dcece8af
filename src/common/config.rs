use clap::Parser;
use serde::Serialize;

/// # Context
/// - Run parameters of one harness invocation; every component reads its
///   constants from here instead of compile-time defines
#[derive(Debug, Clone, Serialize)]
pub struct HarnessConfig {
    /// Total run length in ticks
    pub run_cycles: u64,

    /// Clock half-period: ticks between clock toggles
    pub clock_period: u64,

    /// Reset window end; reset is asserted while 1 < tick < reset_time
    pub reset_time: u64,

    /// Pipeline depth K of the accumulation group
    pub pipeline_depth: u64,

    /// Fraction of the run after which exhausted sources trigger flush
    pub flush_fraction: f64,

    /// Stimulus seed; None draws one from OS entropy
    pub seed: Option<u64>,

    /// Row channel offers valid one time in N (1 = every cycle)
    pub row_offer_one_in: u32,

    /// Column channel offers valid one time in N (1 = every cycle)
    pub col_offer_one_in: u32,

    /// Output ready is asserted one time in N
    pub out_ready_one_in: u32,

    /// Show a progress bar while the loop runs
    pub progress: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            run_cycles: 10_000_000,
            clock_period: 2,
            reset_time: 10,
            pipeline_depth: 4,
            flush_fraction: 0.25,
            seed: None,
            row_offer_one_in: 1,
            col_offer_one_in: 1,
            out_ready_one_in: 3,
            progress: false,
        }
    }
}

impl HarnessConfig {
    /// First tick at which exhausted sources may raise flush.
    pub fn quiescence_tick(self: &Self) -> u64 {
        (self.run_cycles as f64 * self.flush_fraction) as u64
    }

    /// Number of sampled rising edges a full run produces.
    pub fn expected_cycles(self: &Self) -> u64 {
        self.run_cycles / (2 * self.clock_period)
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Directory holding the source and golden streams
    #[arg(short, long, default_value = ".")]
    pub data_dir: String,

    /// Verify against previously captured streams instead of generating
    #[arg(long, default_value_t = false)]
    pub verify: bool,

    /// Total run length in ticks
    #[arg(long, default_value_t = 10_000_000)]
    pub run_cycles: u64,

    /// Clock half-period in ticks
    #[arg(long, default_value_t = 2)]
    pub clock_period: u64,

    /// Reset window end in ticks
    #[arg(long, default_value_t = 10)]
    pub reset_time: u64,

    /// Pipeline depth K
    #[arg(long, default_value_t = 4)]
    pub pipeline_depth: u64,

    /// Fraction of the run after which exhausted sources raise flush
    #[arg(long, default_value_t = 0.25)]
    pub flush_fraction: f64,

    /// Stimulus seed; omit for an OS-entropy seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Row channel offers valid one time in N
    #[arg(long, default_value_t = 1)]
    pub row_offer_one_in: u32,

    /// Column channel offers valid one time in N
    #[arg(long, default_value_t = 1)]
    pub col_offer_one_in: u32,

    /// Output ready asserted one time in N
    #[arg(long, default_value_t = 3)]
    pub out_ready_one_in: u32,

    /// Rows of the systolic array (also the row record width in bytes)
    #[arg(long, default_value_t = 4)]
    pub rows: u32,

    /// Columns of the systolic array (also the column record width in bytes)
    #[arg(long, default_value_t = 4)]
    pub cols: u32,

    /// Suppress the progress bar
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

impl Args {
    pub fn harness_config(self: &Self) -> HarnessConfig {
        HarnessConfig {
            run_cycles: self.run_cycles,
            clock_period: self.clock_period,
            reset_time: self.reset_time,
            pipeline_depth: self.pipeline_depth,
            flush_fraction: self.flush_fraction,
            seed: self.seed,
            row_offer_one_in: self.row_offer_one_in,
            col_offer_one_in: self.col_offer_one_in,
            out_ready_one_in: self.out_ready_one_in,
            progress: !self.quiet,
        }
    }
}
