/// Explicit simulation context handed to every component each tick, in
/// place of any global time counter. `tick` counts loop iterations from 0;
/// `cycle` counts sampled rising edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimContext {
    pub tick: u64,
    pub cycle: u64,
}

/// Named-port capability the harness drives. The DUV's in-memory layout is
/// opaque; `clk` and `rst` are ordinary input ports.
///
/// `eval` performs one delta step: inputs poked since the previous call
/// settle, and outputs become observable through `peek`.
pub trait Duv {
    fn poke(&mut self, port: &str, value: u64);
    fn peek(&self, port: &str) -> u64;
    fn eval(&mut self);
    fn finalize(&mut self);
}

pub fn poke_bool(duv: &mut dyn Duv, port: &str, value: bool) {
    duv.poke(port, value as u64);
}
