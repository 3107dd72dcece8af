use clap::Parser;
use sah::common::config::Args;
use sah::testing::run_ctrl;

fn main() {
    env_logger::init();
    let args = Args::parse();
    match run_ctrl(&args) {
        Ok(stats) => {
            println!(
                "ctrl harness done: {} cycles, {} golden records",
                stats.cycles, stats.golden_records
            );
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
