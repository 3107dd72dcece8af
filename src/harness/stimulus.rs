use crate::common::stream::{RecordReader, RecordWriter};
use crate::duv::{poke_bool, Duv, SimContext};
use crate::errors::Result;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Where an unconstrained port takes its per-cycle values from.
#[derive(Debug)]
pub enum SourceMode {
    /// Draw a fresh value each cycle and persist it for later replay.
    Draw { writer: RecordWriter },
    /// Replay a previously persisted stream; once exhausted the port holds
    /// its last driven value.
    Replay { reader: RecordReader },
}

/// Input port driven every sampled rising edge with no flow control. Once a
/// replay source is exhausted the port is simply not poked again, so it
/// holds its last driven value.
#[derive(Debug)]
pub struct UnconstrainedPort {
    pub port: String,
    pub width: u32,
    pub mode: SourceMode,
}

/// Control line pulsed on a fixed tick schedule, active after the reset
/// window. Reproduces the fixed-cycle harness schedule
/// (`tick % period == phase`).
#[derive(Debug, Clone)]
pub struct PulseSpec {
    pub port: String,
    pub period: u64,
    pub phase: u64,
}

/// Valid/ready input channel fed from a source stream.
#[derive(Debug)]
pub struct HandshakeInput {
    pub valid_port: String,
    pub ready_port: String,
    pub data_port: String,
    reader: RecordReader,
    /// Offer valid one time in N when data remains; N = 1 offers every cycle.
    offer_one_in: u32,
    /// Primary channel transfers advance the transfer counter schedule.
    primary: bool,
    started: bool,
}

/// DUV output channel whose `ready` the harness drives as a randomized,
/// stall-tolerant consumer.
#[derive(Debug)]
pub struct OutputChannel {
    pub valid_port: String,
    pub ready_port: String,
    pub data_port: String,
    ready_one_in: u32,
}

/// What happened on one sampled rising edge; consumed by the scheduler and
/// the golden comparator so they see the same coin flips and transfers.
#[derive(Debug, Default)]
pub struct EdgeActivity {
    pub primary_transfer: bool,
    /// Ready value driven on each output channel this edge, keyed by the
    /// ready port name.
    pub out_ready: IndexMap<String, bool>,
}

/// Produces or replays per-cycle input values, honoring the valid/ready
/// discipline on handshake channels and raising the sticky flush line once
/// every source has drained.
pub struct StimulusGenerator {
    rng: StdRng,
    seed: u64,
    /// Handshake activity (valids, pulses, backpressure, flush) starts
    /// after this tick; unconstrained ports run from the first edge.
    active_after: u64,
    quiescence_tick: u64,
    unconstrained: Vec<UnconstrainedPort>,
    pulses: Vec<PulseSpec>,
    inputs: Vec<HandshakeInput>,
    outputs: Vec<OutputChannel>,
    flush_port: Option<String>,
    flush: bool,
}

impl std::fmt::Debug for StimulusGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StimulusGenerator")
            .field("seed", &self.seed)
            .field("unconstrained", &self.unconstrained.len())
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("flush", &self.flush)
            .finish()
    }
}

fn random_value(rng: &mut StdRng, bits: u32) -> u64 {
    if bits >= 64 {
        rng.gen()
    } else {
        rng.gen_range(0..(1u64 << bits))
    }
}

impl StimulusGenerator {
    /// `seed` of None draws one from OS entropy; the drawn seed is logged so
    /// an exploratory run can still be reproduced.
    pub fn new(seed: Option<u64>, active_after: u64, quiescence_tick: u64) -> Self {
        let seed = match seed {
            Some(s) => s,
            None => rand::rngs::OsRng.gen(),
        };
        log::info!("stimulus seed: {}", seed);
        StimulusGenerator {
            rng: StdRng::seed_from_u64(seed),
            seed: seed,
            active_after: active_after,
            quiescence_tick: quiescence_tick,
            unconstrained: vec![],
            pulses: vec![],
            inputs: vec![],
            outputs: vec![],
            flush_port: None,
            flush: false,
        }
    }

    pub fn add_draw_port(self: &mut Self, port: &str, width: u32, writer: RecordWriter) {
        self.unconstrained.push(UnconstrainedPort {
            port: port.to_string(),
            width: width,
            mode: SourceMode::Draw { writer: writer },
        });
    }

    pub fn add_replay_port(self: &mut Self, port: &str, width: u32, reader: RecordReader) {
        self.unconstrained.push(UnconstrainedPort {
            port: port.to_string(),
            width: width,
            mode: SourceMode::Replay { reader: reader },
        });
    }

    pub fn add_pulse(self: &mut Self, port: &str, period: u64, phase: u64) {
        self.pulses.push(PulseSpec {
            port: port.to_string(),
            period: period,
            phase: phase,
        });
    }

    pub fn add_input_channel(
        self: &mut Self,
        valid_port: &str,
        ready_port: &str,
        data_port: &str,
        reader: RecordReader,
        offer_one_in: u32,
        primary: bool,
    ) {
        assert!(offer_one_in >= 1);
        self.inputs.push(HandshakeInput {
            valid_port: valid_port.to_string(),
            ready_port: ready_port.to_string(),
            data_port: data_port.to_string(),
            reader: reader,
            offer_one_in: offer_one_in,
            primary: primary,
            started: false,
        });
    }

    pub fn add_output_channel(
        self: &mut Self,
        valid_port: &str,
        ready_port: &str,
        data_port: &str,
        ready_one_in: u32,
    ) {
        assert!(ready_one_in >= 1);
        self.outputs.push(OutputChannel {
            valid_port: valid_port.to_string(),
            ready_port: ready_port.to_string(),
            data_port: data_port.to_string(),
            ready_one_in: ready_one_in,
        });
    }

    pub fn set_flush_port(self: &mut Self, port: &str) {
        self.flush_port = Some(port.to_string());
    }

    pub fn seed(self: &Self) -> u64 {
        self.seed
    }

    /// Sticky once raised; monotone through the rest of the run.
    pub fn flushing(self: &Self) -> bool {
        self.flush
    }

    fn one_in(self: &mut Self, n: u32) -> bool {
        self.rng.gen_range(0..n) == 0
    }

    /// Runs once per sampled rising edge, after the DUV evaluation for this
    /// tick. Values poked here settle at the next evaluation.
    pub fn on_edge(self: &mut Self, duv: &mut dyn Duv, ctx: &SimContext) -> Result<EdgeActivity> {
        let mut activity = EdgeActivity::default();

        self.drive_unconstrained(duv)?;

        if ctx.tick <= self.active_after {
            return Ok(activity);
        }

        self.drive_pulses(duv, ctx);
        self.drive_flush(duv, ctx);
        activity.primary_transfer = self.drive_inputs(duv)?;
        self.drive_outputs(duv, &mut activity);

        Ok(activity)
    }

    fn drive_unconstrained(self: &mut Self, duv: &mut dyn Duv) -> Result<()> {
        for up in self.unconstrained.iter_mut() {
            match &mut up.mode {
                SourceMode::Draw { writer } => {
                    let val = random_value(&mut self.rng, up.width);
                    duv.poke(&up.port, val);
                    writer.append(val)?;
                }
                SourceMode::Replay { reader } => {
                    // exhausted stream: the port keeps its last driven value
                    if let Some(val) = reader.next()? {
                        duv.poke(&up.port, val);
                    }
                }
            }
        }
        Ok(())
    }

    fn drive_pulses(self: &mut Self, duv: &mut dyn Duv, ctx: &SimContext) {
        for p in self.pulses.iter() {
            poke_bool(duv, &p.port, ctx.tick % p.period == p.phase);
        }
    }

    fn drive_flush(self: &mut Self, duv: &mut dyn Duv, ctx: &SimContext) {
        if let Some(port) = &self.flush_port {
            if !self.flush
                && ctx.tick > self.quiescence_tick
                && self.inputs.iter().all(|i| i.reader.exhausted())
            {
                log::info!("all sources drained at tick {}, raising flush", ctx.tick);
                self.flush = true;
            }
            poke_bool(duv, port, self.flush);
        }
    }

    fn drive_inputs(self: &mut Self, duv: &mut dyn Duv) -> Result<bool> {
        let mut primary_transfer = false;
        for i in 0..self.inputs.len() {
            let offer = {
                let ch = &self.inputs[i];
                !ch.started || (!ch.reader.exhausted() && {
                    let n = ch.offer_one_in;
                    self.rng.gen_range(0..n) == 0
                })
            };
            let ch = &mut self.inputs[i];
            poke_bool(duv, &ch.valid_port, offer);

            // the first beat is pushed unconditionally so the pipeline
            // always receives data; afterwards a transfer needs the DUV's
            // ready in the same cycle
            if !ch.started || (offer && duv.peek(&ch.ready_port) != 0) {
                if let Some(val) = ch.reader.next()? {
                    duv.poke(&ch.data_port, val);
                    if ch.primary {
                        primary_transfer = true;
                    }
                }
                ch.started = true;
            }
        }
        Ok(primary_transfer)
    }

    fn drive_outputs(self: &mut Self, duv: &mut dyn Duv, activity: &mut EdgeActivity) {
        for i in 0..self.outputs.len() {
            let ready = {
                let n = self.outputs[i].ready_one_in;
                self.one_in(n)
            };
            let ch = &self.outputs[i];
            poke_bool(duv, &ch.ready_port, ready);
            activity.out_ready.insert(ch.ready_port.clone(), ready);
        }
    }

    /// Flushes every generation-mode source stream. Runs on both the normal
    /// and the fatal path.
    pub fn finish(self: &mut Self) -> Result<()> {
        for up in self.unconstrained.iter_mut() {
            if let SourceMode::Draw { writer } = &mut up.mode {
                writer.finish()?;
            }
        }
        Ok(())
    }
}
