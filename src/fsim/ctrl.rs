use crate::duv::Duv;
use crate::fsim::EdgeDetect;

/// Software model of the accumulation control unit: a free-running beat
/// counter that raises `rst_accumulator` on the first beat of every K-group
/// and `bypass_en` on the following beat.
#[derive(Debug)]
pub struct CtrlUnit {
    depth: u64,
    clk: bool,
    rst: bool,
    edge: EdgeDetect,
    count: u64,
    rst_accumulator: bool,
    bypass_en: bool,
}

impl CtrlUnit {
    pub fn new(depth: u64) -> Self {
        assert!(depth >= 2);
        CtrlUnit {
            depth: depth,
            clk: false,
            rst: false,
            edge: EdgeDetect::default(),
            count: 0,
            rst_accumulator: false,
            bypass_en: false,
        }
    }
}

impl Duv for CtrlUnit {
    fn poke(&mut self, port: &str, value: u64) {
        match port {
            "clk" => self.clk = value != 0,
            "rst" => self.rst = value != 0,
            _ => {}
        }
    }

    fn peek(&self, port: &str) -> u64 {
        match port {
            "rst_accumulator" => self.rst_accumulator as u64,
            "bypass_en" => self.bypass_en as u64,
            _ => 0,
        }
    }

    fn eval(&mut self) {
        let clk = self.clk;
        if !self.edge.rising(clk) {
            return;
        }
        if self.rst {
            self.count = 0;
            self.rst_accumulator = false;
            self.bypass_en = false;
            return;
        }
        self.rst_accumulator = self.count % self.depth == 0;
        self.bypass_en = self.count % self.depth == 1;
        self.count += 1;
    }

    fn finalize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(ctrl: &mut CtrlUnit) {
        ctrl.poke("clk", 0);
        ctrl.eval();
        ctrl.poke("clk", 1);
        ctrl.eval();
    }

    #[test]
    fn strobes_walk_the_group() {
        let mut ctrl = CtrlUnit::new(4);
        ctrl.poke("rst", 0);

        let mut acc = vec![];
        let mut byp = vec![];
        for _ in 0..8 {
            step(&mut ctrl);
            acc.push(ctrl.peek("rst_accumulator"));
            byp.push(ctrl.peek("bypass_en"));
        }
        assert_eq!(acc, vec![1, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(byp, vec![0, 1, 0, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn reset_restarts_the_count() {
        let mut ctrl = CtrlUnit::new(4);
        ctrl.poke("rst", 0);
        for _ in 0..3 {
            step(&mut ctrl);
        }
        ctrl.poke("rst", 1);
        step(&mut ctrl);
        ctrl.poke("rst", 0);
        step(&mut ctrl);
        assert_eq!(ctrl.peek("rst_accumulator"), 1);
    }
}
