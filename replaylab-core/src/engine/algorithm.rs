use crate::engine::{BarContext, RunOutcome, SimError};

/// A strategy driven by `Simulation::run`.
///
/// `on_bar` is called once per exposed timestamp, after the bar's orders have
/// executed and NAV has been marked. Orders submitted there execute on the
/// next bar.
pub trait Algorithm {
    fn on_bar(&mut self, ctx: &mut BarContext<'_>) -> Result<(), SimError>;

    /// Called once after the last bar.
    fn on_finish(&mut self, _outcome: &RunOutcome) {}

    /// Score used to rank runs in a sweep. Higher is better.
    fn fitness(&self, outcome: &RunOutcome) -> f64 {
        outcome.total_return()
    }

    /// Free-form payload returned alongside the run result.
    fn report(&self) -> Option<serde_json::Value> {
        None
    }
}

impl<A: Algorithm + ?Sized> Algorithm for Box<A> {
    fn on_bar(&mut self, ctx: &mut BarContext<'_>) -> Result<(), SimError> {
        (**self).on_bar(ctx)
    }

    fn on_finish(&mut self, outcome: &RunOutcome) {
        (**self).on_finish(outcome)
    }

    fn fitness(&self, outcome: &RunOutcome) -> f64 {
        (**self).fitness(outcome)
    }

    fn report(&self) -> Option<serde_json::Value> {
        (**self).report()
    }
}
