use crate::duv::Duv;
use crate::fsim::EdgeDetect;
use std::collections::VecDeque;

const OUT_FIFO_DEPTH: usize = 16;

/// Software model of the systolic array under its handshake discipline.
///
/// Row and column beats arrive on independent valid/ready channels, packed
/// one 8-bit lane per byte. Each row beat multiplies lane-wise into the
/// accumulators against the most recent column beat; the co-scheduled
/// `rst_accumulator` strobe restarts a group and `stream_out` pushes the
/// completed partial sums into the output queue, drained through the
/// `row_data_out` channel under consumer backpressure. `flush` stops intake
/// so the queue can drain.
#[derive(Debug)]
pub struct SystolicArray {
    lanes: usize,
    edge: EdgeDetect,

    // input ports, as last poked
    rst: bool,
    flush: bool,
    row_vld: bool,
    col_vld: bool,
    out_rdy: bool,
    rst_accumulator: bool,
    stream_out: bool,
    row_data: u64,
    col_data: u64,
    clk: bool,

    // state
    col_reg: Vec<u8>,
    acc: Vec<u8>,
    out_fifo: VecDeque<u64>,
}

impl SystolicArray {
    pub fn new(lanes: usize) -> Self {
        assert!(lanes >= 1 && lanes <= 8, "lanes pack into one 64-bit record");
        SystolicArray {
            lanes: lanes,
            edge: EdgeDetect::default(),
            rst: false,
            flush: false,
            row_vld: false,
            col_vld: false,
            out_rdy: false,
            rst_accumulator: false,
            stream_out: false,
            row_data: 0,
            col_data: 0,
            clk: false,
            col_reg: vec![0; lanes],
            acc: vec![0; lanes],
            out_fifo: VecDeque::new(),
        }
    }

    fn in_ready(self: &Self) -> bool {
        !self.flush && self.out_fifo.len() < OUT_FIFO_DEPTH
    }

    fn lane(value: u64, i: usize) -> u8 {
        (value >> (8 * i)) as u8
    }

    fn pack(lanes: &[u8]) -> u64 {
        let mut v = 0u64;
        for (i, b) in lanes.iter().enumerate() {
            v |= (*b as u64) << (8 * i);
        }
        v
    }

    fn clocked_update(self: &mut Self) {
        if self.rst {
            self.col_reg = vec![0; self.lanes];
            self.acc = vec![0; self.lanes];
            self.out_fifo.clear();
            return;
        }

        if self.out_rdy && !self.out_fifo.is_empty() {
            self.out_fifo.pop_front();
        }

        let ready = self.in_ready();

        if self.col_vld && ready {
            for i in 0..self.lanes {
                self.col_reg[i] = Self::lane(self.col_data, i);
            }
        }

        if self.row_vld && ready {
            for i in 0..self.lanes {
                let product = Self::lane(self.row_data, i).wrapping_mul(self.col_reg[i]);
                self.acc[i] = if self.rst_accumulator {
                    product
                } else {
                    self.acc[i].wrapping_add(product)
                };
            }
            if self.stream_out {
                self.out_fifo.push_back(Self::pack(&self.acc));
            }
        }
    }
}

impl Duv for SystolicArray {
    fn poke(&mut self, port: &str, value: u64) {
        let bit = value != 0;
        match port {
            "clk" => self.clk = bit,
            "rst" => self.rst = bit,
            "flush" => self.flush = bit,
            "row_data_in" => self.row_data = value,
            "row_data_in_vld" => self.row_vld = bit,
            "col_data_in" => self.col_data = value,
            "col_data_in_vld" => self.col_vld = bit,
            "row_data_out_rdy" => self.out_rdy = bit,
            "rst_accumulator" => self.rst_accumulator = bit,
            "stream_out" => self.stream_out = bit,
            _ => {}
        }
    }

    fn peek(&self, port: &str) -> u64 {
        match port {
            "row_data_in_rdy" => self.in_ready() as u64,
            "col_data_in_rdy" => self.in_ready() as u64,
            "row_data_out_vld" => (!self.out_fifo.is_empty()) as u64,
            "row_data_out" => self.out_fifo.front().copied().unwrap_or(0),
            // input pins read back, the way a Verilated model allows
            "flush" => self.flush as u64,
            "rst" => self.rst as u64,
            _ => 0,
        }
    }

    fn eval(&mut self) {
        let clk = self.clk;
        if self.edge.rising(clk) {
            self.clocked_update();
        }
    }

    fn finalize(&mut self) {}
}
