use crate::duv::{poke_bool, Duv};

/// Derives the accumulator-reset and stream-out strobes from the transfer
/// counter. The strobes are gated by actual data movement: a cycle with no
/// primary transfer drives both low, so the accumulator schedule can never
/// run ahead of the input stream.
#[derive(Debug)]
pub struct ControlScheduler {
    depth: u64,
    transfers: u64,
    acc_reset_port: String,
    stream_out_port: String,
}

impl ControlScheduler {
    pub fn new(depth: u64, acc_reset_port: &str, stream_out_port: &str) -> Self {
        assert!(depth >= 1, "pipeline depth K must be at least 1");
        ControlScheduler {
            depth: depth,
            transfers: 0,
            acc_reset_port: acc_reset_port.to_string(),
            stream_out_port: stream_out_port.to_string(),
        }
    }

    /// Strobe values for the transfer with counter value `c`: the first
    /// element of a K-group clears the accumulator, the last drains it.
    pub fn strobes(self: &Self, c: u64) -> (bool, bool) {
        (c % self.depth == 0, c % self.depth == self.depth - 1)
    }

    /// Runs once per sampled rising edge, after the stimulus has latched
    /// this edge's inputs.
    pub fn on_edge(self: &mut Self, duv: &mut dyn Duv, primary_transfer: bool) {
        let (acc_reset, stream_out) = if primary_transfer {
            let s = self.strobes(self.transfers);
            self.transfers += 1;
            s
        } else {
            (false, false)
        };
        poke_bool(duv, &self.acc_reset_port, acc_reset);
        poke_bool(duv, &self.stream_out_port, stream_out);
    }

    pub fn transfers(self: &Self) -> u64 {
        self.transfers
    }
}
