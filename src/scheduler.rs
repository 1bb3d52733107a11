use rand::Rng;
use rand::seq::SliceRandom;
use tracing::trace;

/// One agent slot in a tick, indexing into the world's populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
	Scout(usize),
	Picker(usize),
	Cluster(usize),
}

/// Random activation: every agent once per tick, in a fresh order each tick.
#[derive(Debug, Default)]
pub struct Scheduler {
	passes: u64,
}

impl Scheduler {
	pub fn new() -> Self {
		Self { passes: 0 }
	}

	pub fn passes(&self) -> u64 {
		self.passes
	}

	pub fn plan<R: Rng + ?Sized>(&mut self, scouts: usize, pickers: usize, clusters: usize, rng: &mut R) -> Vec<Activation> {
		let mut order = Vec::with_capacity(scouts + pickers + clusters);
		order.extend((0..scouts).map(Activation::Scout));
		order.extend((0..pickers).map(Activation::Picker));
		order.extend((0..clusters).map(Activation::Cluster));
		order.shuffle(rng);
		self.passes += 1;
		trace!(pass = self.passes, agents = order.len(), "activation order planned");
		order
	}
}
