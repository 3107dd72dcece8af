/// Clock and reset values for one tick, as seen after the toggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockEdge {
    pub clk: bool,
    pub rst: bool,
    /// True exactly when this tick's toggle entered the high phase. This is
    /// the single sampling point per cycle every other component keys on.
    pub rising: bool,
}

/// Generates the clock square wave and the reset window. The clock toggles
/// whenever `tick % half_period == 0`; reset is asserted while
/// `1 < tick < reset_time`, leaving tick 0 and 1 for the initial DUV state
/// to settle.
#[derive(Debug)]
pub struct ClockResetSequencer {
    half_period: u64,
    reset_time: u64,
    clk: bool,
}

impl ClockResetSequencer {
    pub fn new(half_period: u64, reset_time: u64) -> Self {
        assert!(half_period >= 1, "clock half-period must be at least 1 tick");
        ClockResetSequencer {
            half_period: half_period,
            reset_time: reset_time,
            clk: false,
        }
    }

    pub fn advance(self: &mut Self, tick: u64) -> ClockEdge {
        let toggle = tick % self.half_period == 0;
        if toggle {
            self.clk = !self.clk;
        }
        ClockEdge {
            clk: self.clk,
            rst: tick > 1 && tick < self.reset_time,
            rising: toggle && self.clk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1000, 2, 10; "run 1000 period 2 reset 10")]
    #[test_case(1000, 1, 10; "run 1000 period 1 reset 10")]
    #[test_case(400, 5, 8; "run 400 period 5 reset 8")]
    fn clock_is_square_and_reset_window_exact(run: u64, period: u64, reset_time: u64) {
        let mut seq = ClockResetSequencer::new(period, reset_time);
        let mut prev_clk = false;
        let mut rising = 0u64;
        let mut reset_ticks = 0u64;

        for tick in 0..run {
            let edge = seq.advance(tick);
            let toggled = edge.clk != prev_clk;
            assert_eq!(toggled, tick % period == 0, "toggle iff tick % PERIOD == 0");
            assert_eq!(edge.rising, toggled && edge.clk);
            assert_eq!(edge.rst, tick > 1 && tick < reset_time);
            if edge.rising {
                rising += 1;
            }
            if edge.rst {
                reset_ticks += 1;
            }
            prev_clk = edge.clk;
        }

        // total rising edges equal RUN / (2 * PERIOD) within rounding
        let expected = run / (2 * period);
        assert!(rising >= expected && rising <= expected + 1);
        assert_eq!(reset_ticks, reset_time - 2);
    }

    #[test]
    fn first_rising_edge_is_tick_zero() {
        let mut seq = ClockResetSequencer::new(2, 10);
        let edge = seq.advance(0);
        assert!(edge.clk && edge.rising && !edge.rst);
    }
}
