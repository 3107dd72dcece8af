use crate::common::config::Args;
use crate::common::stream::{RecordReader, RecordWriter};
use crate::errors::Result;
use crate::fsim::array::SystolicArray;
use crate::fsim::ctrl::CtrlUnit;
use crate::fsim::mac::MacUnit;
use crate::harness::golden::{GoldenComparator, Qualify};
use crate::harness::scheduler::ControlScheduler;
use crate::harness::simloop::{RunStats, SimulationLoop};
use crate::harness::stimulus::StimulusGenerator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

fn stream_path(dir: &str, file: &str) -> PathBuf {
    Path::new(dir).join(file)
}

/// Writes `records` random fixed-width records to `path`, the seeded
/// counterpart of the original matrix generator script.
pub fn generate_source_stream<P: AsRef<Path>>(
    path: P,
    width: u32,
    records: u64,
    seed: u64,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut writer = RecordWriter::create(path, width)?;
    let bits = width.min(63);
    for _ in 0..records {
        writer.append(rng.gen_range(0..(1u64 << bits)))?;
    }
    writer.finish()
}

/// MAC harness: unconstrained stimulus on three byte-wide data ports plus
/// the fixed-cycle control pulses, outputs captured or verified on every
/// sampled edge.
pub fn run_mac(args: &Args) -> Result<RunStats> {
    let cfg = args.harness_config();
    let dir = &args.data_dir;

    let mut stim = StimulusGenerator::new(cfg.seed, cfg.reset_time, cfg.quiescence_tick());
    let mut golden = GoldenComparator::new();

    let data_ports = ["col_data_in", "row_data_in", "bypass_data_in"];
    let out_ports = ["row_data_out", "col_data_out", "psum_out"];

    if args.verify {
        for port in data_ports {
            let path = stream_path(dir, &format!("{}.bins", port));
            stim.add_replay_port(port, 8, RecordReader::open(path, 8)?);
        }
        for port in out_ports {
            let path = stream_path(dir, &format!("{}_gold.bins", port));
            golden.verify(port, Qualify::EveryCycle, RecordReader::open(path, 8)?);
        }
    } else {
        for port in data_ports {
            let path = stream_path(dir, &format!("{}.bins", port));
            stim.add_draw_port(port, 8, RecordWriter::create(path, 8)?);
        }
        for port in out_ports {
            let path = stream_path(dir, &format!("{}_gold.bins", port));
            golden.record(port, Qualify::EveryCycle, RecordWriter::create(path, 8)?);
        }
    }

    // accumulator restart and bypass walk a fixed 12-tick schedule
    stim.add_pulse("rst_accumulator", 12, 0);
    stim.add_pulse("bypass_en", 12, 1);

    let mut duv = MacUnit::new();
    let mut sim = SimulationLoop::new(&cfg, stim, None, golden);
    sim.run(&mut duv)
}

/// Control-unit harness: no stimulus beyond clock and reset; the two
/// strobe outputs are captured or verified on every sampled edge.
pub fn run_ctrl(args: &Args) -> Result<RunStats> {
    let cfg = args.harness_config();
    let dir = &args.data_dir;

    let stim = StimulusGenerator::new(cfg.seed, cfg.reset_time, cfg.quiescence_tick());
    let mut golden = GoldenComparator::new();

    for port in ["bypass_en", "rst_accumulator"] {
        let path = stream_path(dir, &format!("{}_gold.bins", port));
        if args.verify {
            golden.verify(port, Qualify::EveryCycle, RecordReader::open(path, 8)?);
        } else {
            golden.record(port, Qualify::EveryCycle, RecordWriter::create(path, 8)?);
        }
    }

    let mut duv = CtrlUnit::new(cfg.pipeline_depth);
    let mut sim = SimulationLoop::new(&cfg, stim, None, golden);
    sim.run(&mut duv)
}

/// Systolic-array harness: handshake-gated row/column channels with the
/// transfer-counter strobe schedule, randomized output backpressure, sticky
/// flush, and gated result capture or verification.
pub fn run_systolic(args: &Args) -> Result<RunStats> {
    let cfg = args.harness_config();
    let dir = &args.data_dir;
    let row_width = args.rows * 8;
    let col_width = args.cols * 8;

    let mut stim = StimulusGenerator::new(cfg.seed, cfg.reset_time, cfg.quiescence_tick());
    stim.add_input_channel(
        "row_data_in_vld",
        "row_data_in_rdy",
        "row_data_in",
        RecordReader::open(stream_path(dir, "a_matrix.bin"), row_width)?,
        cfg.row_offer_one_in,
        true,
    );
    stim.add_input_channel(
        "col_data_in_vld",
        "col_data_in_rdy",
        "col_data_in",
        RecordReader::open(stream_path(dir, "b_matrix.bin"), col_width)?,
        cfg.col_offer_one_in,
        false,
    );
    stim.add_output_channel(
        "row_data_out_vld",
        "row_data_out_rdy",
        "row_data_out",
        cfg.out_ready_one_in,
    );
    stim.set_flush_port("flush");

    let scheduler = ControlScheduler::new(cfg.pipeline_depth, "rst_accumulator", "stream_out");

    let gated = || Qualify::OutputTransfer {
        valid_port: "row_data_out_vld".to_string(),
        ready_port: "row_data_out_rdy".to_string(),
    };
    let mut golden = GoldenComparator::new();
    if args.verify {
        let path = stream_path(dir, "c_matrix.bin");
        golden.verify("row_data_out", gated(), RecordReader::open(path, row_width)?);
    } else {
        let path = stream_path(dir, "results.bin");
        golden.record("row_data_out", gated(), RecordWriter::create(path, row_width)?);
    }

    let mut duv = SystolicArray::new(args.rows as usize);
    let mut sim = SimulationLoop::new(&cfg, stim, Some(scheduler), golden);
    sim.run(&mut duv)
}
