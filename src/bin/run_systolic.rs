use clap::Parser;
use sah::common::config::Args;
use sah::testing::run_systolic;

fn main() {
    env_logger::init();
    let args = Args::parse();
    match run_systolic(&args) {
        Ok(stats) => {
            println!(
                "systolic harness done: {} cycles, {} primary transfers, {} golden records",
                stats.cycles, stats.primary_transfers, stats.golden_records
            );
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
