use clap::Parser;
use sah::common::config::Args;
use sah::testing::run_mac;

fn main() {
    env_logger::init();
    let args = Args::parse();
    match run_mac(&args) {
        Ok(stats) => {
            println!(
                "mac harness done: {} cycles, {} golden records",
                stats.cycles, stats.golden_records
            );
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
