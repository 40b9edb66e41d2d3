//! Table-driven finite state machine engine.
//!
//! Every controller in this crate is a [`Fsm`] over its own state enum and a
//! private context type. The engine owns the ordered transition table and the
//! current state; the context owns everything the guards and actions touch. A
//! concrete machine holds both and fires the engine with a mutable borrow of its
//! context, so there is no aliasing between the table and the data it drives.

/// Side-effect-free predicate deciding whether a transition may fire.
pub type Guard<C> = fn(&C) -> bool;

/// Side-effecting function executed when a transition commits.
pub type Action<C> = fn(&mut C);

/// One row of a transition table.
pub struct Transition<S, C> {
    /// State the transition leaves from.
    pub origin: S,
    /// Predicate over the context.
    pub guard: Guard<C>,
    /// State committed after the action runs.
    pub destination: S,
    /// Optional output function.
    pub action: Option<Action<C>>,
}

impl<S: Copy, C> Clone for Transition<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Copy, C> Copy for Transition<S, C> {}

impl<S, C> Transition<S, C> {
    /// Creates a transition row.
    #[inline]
    pub const fn new(origin: S, guard: Guard<C>, destination: S, action: Option<Action<C>>) -> Self {
        Self {
            origin,
            guard,
            destination,
            action,
        }
    }
}

/// Generic state machine: current state plus an ordered transition table.
///
/// The table length is the end-of-table marker. Rows are evaluated in declared
/// order, so when several rows share an origin the earlier row has priority.
///
/// # Type Parameters
/// * `S` - State identifier type
/// * `C` - Context type passed to guards and actions
/// * `N` - Number of rows in the table
pub struct Fsm<S, C, const N: usize> {
    current_state: S,
    transitions: [Transition<S, C>; N],
}

impl<S: Copy + PartialEq, C, const N: usize> Fsm<S, C, N> {
    /// Creates a machine whose initial state is the origin of the first row.
    pub fn new(transitions: [Transition<S, C>; N]) -> Self {
        const { assert!(N > 0, "transition table must not be empty") };

        Self {
            current_state: transitions[0].origin,
            transitions,
        }
    }

    /// Evaluates the table once.
    ///
    /// The first row whose origin matches the current state and whose guard holds
    /// runs its action, then commits its destination. At most one transition is
    /// taken per call. Returns false when no row matched, in which case neither the
    /// state nor the context has been touched.
    pub fn fire(&mut self, ctx: &mut C) -> bool {
        for transition in &self.transitions {
            if transition.origin == self.current_state && (transition.guard)(ctx) {
                if let Some(action) = transition.action {
                    action(ctx);
                }
                self.current_state = transition.destination;
                return true;
            }
        }

        false
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> S {
        self.current_state
    }

    /// Forces the current state without running any action.
    #[inline]
    pub fn set_state(&mut self, state: S) {
        self.current_state = state;
    }

    /// Returns the transition table in priority order.
    #[inline]
    pub fn transitions(&self) -> &[Transition<S, C>] {
        &self.transitions
    }
}

/// Common interface of every controller built on [`Fsm`].
pub trait StateMachine {
    /// State identifier type.
    type State: Copy + PartialEq;

    /// Evaluates the machine once. Returns true if a transition fired.
    fn fire(&mut self) -> bool;

    /// Returns the current state.
    fn state(&self) -> Self::State;

    /// Forces the current state.
    fn set_state(&mut self, state: Self::State);
}
