use crate::common::config::HarnessConfig;
use crate::duv::{poke_bool, Duv, SimContext};
use crate::errors::Result;
use crate::harness::golden::GoldenComparator;
use crate::harness::scheduler::ControlScheduler;
use crate::harness::sequencer::ClockResetSequencer;
use crate::harness::stimulus::StimulusGenerator;
use indicatif::ProgressBar;
use serde::Serialize;

/// Phase of the run, for observability only; the loop itself is driven by
/// the tick counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Init,
    Reset,
    Run,
    /// Sources drained and flush raised; overlaps the tail of the run.
    Drain,
    Done,
}

/// Summary the drivers print after a run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub ticks: u64,
    pub cycles: u64,
    pub primary_transfers: u64,
    pub golden_records: u64,
}

/// Optional per-cycle observer, sampled once per rising edge after the
/// comparator. Waveform mechanics live behind this seam.
pub trait Tracer {
    fn sample(&mut self, duv: &dyn Duv, ctx: &SimContext);
}

/// Owns every component and the streams for the duration of one run and
/// advances the DUV tick by tick.
pub struct SimulationLoop {
    cfg: HarnessConfig,
    sequencer: ClockResetSequencer,
    stimulus: StimulusGenerator,
    scheduler: Option<ControlScheduler>,
    golden: GoldenComparator,
    tracer: Option<Box<dyn Tracer>>,
}

impl SimulationLoop {
    pub fn new(
        cfg: &HarnessConfig,
        stimulus: StimulusGenerator,
        scheduler: Option<ControlScheduler>,
        golden: GoldenComparator,
    ) -> Self {
        SimulationLoop {
            cfg: cfg.clone(),
            sequencer: ClockResetSequencer::new(cfg.clock_period, cfg.reset_time),
            stimulus: stimulus,
            scheduler: scheduler,
            golden: golden,
            tracer: None,
        }
    }

    pub fn set_tracer(self: &mut Self, tracer: Box<dyn Tracer>) {
        self.tracer = Some(tracer);
    }

    fn phase(self: &Self, tick: u64) -> Phase {
        if tick == 0 {
            Phase::Init
        } else if tick < self.cfg.reset_time {
            Phase::Reset
        } else if self.stimulus.flushing() {
            Phase::Drain
        } else {
            Phase::Run
        }
    }

    /// Drives the whole run. Terminates after the configured tick count;
    /// the only early exit is a fatal error. Streams are flushed and the
    /// DUV finalized on both paths.
    pub fn run(self: &mut Self, duv: &mut dyn Duv) -> Result<RunStats> {
        let result = self.run_ticks(duv);

        // close exactly once, fatal path included
        let src_flush = self.stimulus.finish();
        let gold_flush = self.golden.finish();
        duv.finalize();

        let stats = result?;
        src_flush?;
        gold_flush?;
        log::info!(
            "run done: {} ticks, {} cycles, {} primary transfers, {} golden records",
            stats.ticks,
            stats.cycles,
            stats.primary_transfers,
            stats.golden_records
        );
        Ok(stats)
    }

    fn run_ticks(self: &mut Self, duv: &mut dyn Duv) -> Result<RunStats> {
        let mut ctx = SimContext::default();
        let mut phase = Phase::Init;

        let bar = if self.cfg.progress {
            Some(ProgressBar::new(self.cfg.run_cycles))
        } else {
            None
        };

        for tick in 0..self.cfg.run_cycles {
            ctx.tick = tick;
            if let Some(b) = &bar {
                b.inc(1);
            }

            let next = self.phase(tick);
            if next != phase {
                log::debug!("tick {}: {:?} -> {:?}", tick, phase, next);
                phase = next;
            }

            let edge = self.sequencer.advance(tick);
            poke_bool(duv, "clk", edge.clk);
            poke_bool(duv, "rst", edge.rst);

            // inputs poked on the previous edge settle here
            duv.eval();

            if !edge.rising {
                continue;
            }
            ctx.cycle += 1;

            let activity = self.stimulus.on_edge(duv, &ctx)?;
            if let Some(sched) = &mut self.scheduler {
                sched.on_edge(duv, activity.primary_transfer);
            }
            self.golden.on_edge(duv, &ctx, &activity)?;

            if let Some(tracer) = &mut self.tracer {
                tracer.sample(duv, &ctx);
            }
        }

        if let Some(b) = &bar {
            b.finish();
        }
        phase = Phase::Done;
        log::debug!("final phase: {:?}", phase);

        Ok(RunStats {
            ticks: self.cfg.run_cycles,
            cycles: ctx.cycle,
            primary_transfers: self.scheduler.as_ref().map_or(0, |s| s.transfers()),
            golden_records: self.golden.records(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::stream::RecordWriter;
    use crate::fsim::TableDuv;
    use crate::harness::golden::Qualify;

    // Scenario: all-zero golden records against a DUV held at zero outputs.
    #[test]
    fn zero_golden_zero_duv_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero_gold.bins");
        let mut w = RecordWriter::create(&path, 8).unwrap();
        for _ in 0..250 {
            w.append(0).unwrap();
        }
        w.finish().unwrap();

        let cfg = HarnessConfig {
            run_cycles: 1000,
            clock_period: 2,
            reset_time: 10,
            progress: false,
            ..Default::default()
        };

        let stim = StimulusGenerator::new(Some(1), cfg.reset_time, cfg.quiescence_tick());
        let mut golden = GoldenComparator::new();
        golden.verify(
            "psum_out",
            Qualify::EveryCycle,
            crate::common::stream::RecordReader::open(&path, 8).unwrap(),
        );

        let mut sim = SimulationLoop::new(&cfg, stim, None, golden);
        let mut duv = TableDuv::default();
        let stats = sim.run(&mut duv).unwrap();
        assert_eq!(stats.ticks, 1000);
        assert_eq!(stats.cycles, 250);
        assert_eq!(stats.golden_records, 250);
    }

    // Scenario: golden stream shorter than the qualifying cycles.
    #[test]
    fn short_golden_stream_completes_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short_gold.bins");
        let mut w = RecordWriter::create(&path, 8).unwrap();
        for _ in 0..10 {
            w.append(0).unwrap();
        }
        w.finish().unwrap();

        let cfg = HarnessConfig {
            run_cycles: 1000,
            clock_period: 2,
            reset_time: 10,
            progress: false,
            ..Default::default()
        };

        let stim = StimulusGenerator::new(Some(1), cfg.reset_time, cfg.quiescence_tick());
        let mut golden = GoldenComparator::new();
        golden.verify(
            "psum_out",
            Qualify::EveryCycle,
            crate::common::stream::RecordReader::open(&path, 8).unwrap(),
        );

        let mut sim = SimulationLoop::new(&cfg, stim, None, golden);
        let mut duv = TableDuv::default();
        let stats = sim.run(&mut duv).unwrap();
        assert_eq!(stats.golden_records, 10);
    }

    #[test]
    fn mismatch_stops_the_run_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_gold.bins");
        let mut w = RecordWriter::create(&path, 8).unwrap();
        w.append(0).unwrap();
        w.append(7).unwrap();
        w.finish().unwrap();

        let cfg = HarnessConfig {
            run_cycles: 1000,
            clock_period: 2,
            reset_time: 10,
            progress: false,
            ..Default::default()
        };

        let stim = StimulusGenerator::new(Some(1), cfg.reset_time, cfg.quiescence_tick());
        let mut golden = GoldenComparator::new();
        golden.verify(
            "psum_out",
            Qualify::EveryCycle,
            crate::common::stream::RecordReader::open(&path, 8).unwrap(),
        );

        let mut sim = SimulationLoop::new(&cfg, stim, None, golden);
        let mut duv = TableDuv::default();
        let err = sim.run(&mut duv).unwrap_err();
        match err {
            crate::errors::HarnessError::GoldenMismatch { tick, expected, actual, .. } => {
                // second sampled rising edge, one record in
                assert_eq!(tick, 4);
                assert_eq!(expected, 7);
                assert_eq!(actual, 0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
