use crate::duv::Duv;
use crate::fsim::EdgeDetect;
use indexmap::IndexMap;

/// Software model of one multiply-accumulate cell.
///
/// Inputs: `clk`, `rst`, `row_data_in`, `col_data_in`, `bypass_data_in`,
/// `rst_accumulator`, `bypass_en`. Outputs: `row_data_out`, `col_data_out`,
/// `psum_out`. Row and column beats are registered through; the partial sum
/// accumulates `row * col` per cycle, restarting when `rst_accumulator` is
/// high, and `bypass_en` substitutes the bypass input on the sum output.
/// All lanes are 8 bits with wrapping arithmetic.
#[derive(Debug, Default)]
pub struct MacUnit {
    inputs: IndexMap<String, u64>,
    edge: EdgeDetect,
    row_reg: u8,
    col_reg: u8,
    acc: u8,
    psum_out: u8,
}

impl MacUnit {
    pub fn new() -> Self {
        MacUnit::default()
    }

    fn input(self: &Self, port: &str) -> u64 {
        self.inputs.get(port).copied().unwrap_or(0)
    }

    fn clocked_update(self: &mut Self) {
        if self.input("rst") != 0 {
            self.row_reg = 0;
            self.col_reg = 0;
            self.acc = 0;
            self.psum_out = 0;
            return;
        }

        let row = self.input("row_data_in") as u8;
        let col = self.input("col_data_in") as u8;
        let product = row.wrapping_mul(col);

        self.acc = if self.input("rst_accumulator") != 0 {
            product
        } else {
            self.acc.wrapping_add(product)
        };

        self.psum_out = if self.input("bypass_en") != 0 {
            self.input("bypass_data_in") as u8
        } else {
            self.acc
        };

        self.row_reg = row;
        self.col_reg = col;
    }
}

impl Duv for MacUnit {
    fn poke(&mut self, port: &str, value: u64) {
        self.inputs.insert(port.to_string(), value);
    }

    fn peek(&self, port: &str) -> u64 {
        match port {
            "row_data_out" => self.row_reg as u64,
            "col_data_out" => self.col_reg as u64,
            "psum_out" => self.psum_out as u64,
            _ => 0,
        }
    }

    fn eval(&mut self) {
        let clk = self.input("clk") != 0;
        if self.edge.rising(clk) {
            self.clocked_update();
        }
    }

    fn finalize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(mac: &mut MacUnit) {
        mac.poke("clk", 0);
        mac.eval();
        mac.poke("clk", 1);
        mac.eval();
    }

    #[test]
    fn accumulates_and_registers_beats() {
        let mut mac = MacUnit::new();
        mac.poke("rst", 0);

        mac.poke("row_data_in", 3);
        mac.poke("col_data_in", 5);
        mac.poke("rst_accumulator", 1);
        step(&mut mac);
        assert_eq!(mac.peek("psum_out"), 15);
        assert_eq!(mac.peek("row_data_out"), 3);
        assert_eq!(mac.peek("col_data_out"), 5);

        mac.poke("rst_accumulator", 0);
        mac.poke("row_data_in", 2);
        mac.poke("col_data_in", 4);
        step(&mut mac);
        assert_eq!(mac.peek("psum_out"), 23);
    }

    #[test]
    fn bypass_overrides_sum_output() {
        let mut mac = MacUnit::new();
        mac.poke("rst", 0);
        mac.poke("row_data_in", 1);
        mac.poke("col_data_in", 1);
        mac.poke("bypass_data_in", 0x5a);
        mac.poke("bypass_en", 1);
        step(&mut mac);
        assert_eq!(mac.peek("psum_out"), 0x5a);
    }

    #[test]
    fn reset_clears_state() {
        let mut mac = MacUnit::new();
        mac.poke("rst", 0);
        mac.poke("row_data_in", 7);
        mac.poke("col_data_in", 7);
        step(&mut mac);
        assert_ne!(mac.peek("psum_out"), 0);

        mac.poke("rst", 1);
        step(&mut mac);
        assert_eq!(mac.peek("psum_out"), 0);
        assert_eq!(mac.peek("row_data_out"), 0);
    }
}
