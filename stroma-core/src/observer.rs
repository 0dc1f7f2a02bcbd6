/// A hook called after each tick of a simulation loop.
///
/// The loop hands every tick event `E` to the observer, which may answer with
/// an action `A` such as a stop request. Returning `None` leaves the loop
/// running. Charts, progress reports, and stop conditions ("halt once net
/// production falls below 1") are all written as observers.
pub trait Observer<E, A> {
    /// Inspects one tick event and optionally requests an action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

/// Any `FnMut(&E) -> Option<A>` closure is an observer.
impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

/// `()` watches nothing and never acts.
impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
