use crate::common::stream::{RecordReader, RecordWriter};
use crate::duv::{Duv, SimContext};
use crate::errors::{HarnessError, Result};
use crate::harness::stimulus::EdgeActivity;

/// When a monitored port produces a record.
#[derive(Debug)]
pub enum Qualify {
    /// Every sampled rising edge.
    EveryCycle,
    /// Only on an actual output transfer of the named channel.
    OutputTransfer {
        valid_port: String,
        ready_port: String,
    },
}

#[derive(Debug)]
enum GoldenStream {
    Generate(RecordWriter),
    Verify(RecordReader),
}

#[derive(Debug)]
struct GoldenPort {
    port: String,
    qualify: Qualify,
    stream: GoldenStream,
}

/// Records or verifies observed output values against golden streams, one
/// record per qualifying rising edge per port, in strict lock-step.
#[derive(Debug, Default)]
pub struct GoldenComparator {
    ports: Vec<GoldenPort>,
    records: u64,
}

impl GoldenComparator {
    pub fn new() -> Self {
        GoldenComparator::default()
    }

    pub fn record(self: &mut Self, port: &str, qualify: Qualify, writer: RecordWriter) {
        self.ports.push(GoldenPort {
            port: port.to_string(),
            qualify: qualify,
            stream: GoldenStream::Generate(writer),
        });
    }

    pub fn verify(self: &mut Self, port: &str, qualify: Qualify, reader: RecordReader) {
        self.ports.push(GoldenPort {
            port: port.to_string(),
            qualify: qualify,
            stream: GoldenStream::Verify(reader),
        });
    }

    /// Total records written plus records compared so far.
    pub fn records(self: &Self) -> u64 {
        self.records
    }

    fn qualifies(q: &Qualify, duv: &dyn Duv, activity: &EdgeActivity) -> bool {
        match q {
            Qualify::EveryCycle => true,
            Qualify::OutputTransfer {
                valid_port,
                ready_port,
            } => {
                let ready = activity.out_ready.get(ready_port).copied().unwrap_or(false);
                ready && duv.peek(valid_port) != 0
            }
        }
    }

    /// Runs last on each sampled rising edge, reading outputs produced by
    /// this tick's evaluation. A mismatch is fatal; the run must not
    /// continue past it.
    pub fn on_edge(
        self: &mut Self,
        duv: &dyn Duv,
        ctx: &SimContext,
        activity: &EdgeActivity,
    ) -> Result<()> {
        for gp in self.ports.iter_mut() {
            if !Self::qualifies(&gp.qualify, duv, activity) {
                continue;
            }
            let actual = duv.peek(&gp.port);
            match &mut gp.stream {
                GoldenStream::Generate(writer) => {
                    writer.append(actual)?;
                    self.records += 1;
                }
                GoldenStream::Verify(reader) => {
                    // exhausted golden: checking simply stops for this port
                    if let Some(expected) = reader.next()? {
                        self.records += 1;
                        if expected != actual {
                            return Err(HarnessError::GoldenMismatch {
                                port: gp.port.clone(),
                                tick: ctx.tick,
                                expected: expected,
                                actual: actual,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Flushes every generation-mode golden stream. Runs on both the normal
    /// and the fatal path.
    pub fn finish(self: &mut Self) -> Result<()> {
        for gp in self.ports.iter_mut() {
            if let GoldenStream::Generate(writer) = &mut gp.stream {
                writer.finish()?;
            }
        }
        Ok(())
    }
}
