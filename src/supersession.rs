//! In-flight request supersession
//!
//! Each concern has at most one request whose result may be applied. Starting
//! a new request cancels the previous one, and a result that comes back under
//! a stale or cancelled ticket is discarded.

use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What a request fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concern {
    Items,
    RecipeTree,
    ShoppingList,
}

impl Concern {
    pub const ALL: [Concern; 3] = [Concern::Items, Concern::RecipeTree, Concern::ShoppingList];

    fn index(self) -> usize {
        match self {
            Concern::Items => 0,
            Concern::RecipeTree => 1,
            Concern::ShoppingList => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Concern::Items => "items",
            Concern::RecipeTree => "recipe_tree",
            Concern::ShoppingList => "shopping_list",
        }
    }
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct Slot {
    is_loading: bool,
    cancel_token: Option<CancellationToken>,
    generation: u64,
}

/// Per-concern loading flags and cancellation handles
#[derive(Debug, Default)]
pub struct Supersession {
    slots: [Slot; 3],
}

/// Handle for one started request
#[derive(Debug, Clone)]
pub struct Ticket {
    concern: Concern,
    generation: u64,
    token: CancellationToken,
}

/// How a request's work ended
#[derive(Debug)]
pub enum Completion<T> {
    Completed(T),
    Cancelled,
}

impl Supersession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `concern`, cancelling any request still in flight
    pub fn begin(&mut self, concern: Concern) -> Ticket {
        let slot = &mut self.slots[concern.index()];

        if slot.is_loading {
            if let Some(token) = slot.cancel_token.take() {
                debug!(%concern, generation = slot.generation, "cancelling superseded request");
                token.cancel();
            }
        }

        slot.generation += 1;
        let token = CancellationToken::new();
        slot.cancel_token = Some(token.clone());
        slot.is_loading = true;

        Ticket {
            concern,
            generation: slot.generation,
            token,
        }
    }

    /// Settle a request. Returns `true` if its result may be applied.
    ///
    /// Only the current, uncancelled ticket clears the loading flag; a stale
    /// ticket leaves the newer request's state alone.
    pub fn finish(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) {
            debug!(
                concern = %ticket.concern,
                generation = ticket.generation,
                current = self.slots[ticket.concern.index()].generation,
                "discarding superseded result"
            );
            return false;
        }

        let slot = &mut self.slots[ticket.concern.index()];
        slot.is_loading = false;
        slot.cancel_token = None;
        true
    }

    /// Cancel whatever is in flight for `concern` without starting anything
    pub fn cancel(&mut self, concern: Concern) {
        let slot = &mut self.slots[concern.index()];
        if let Some(token) = slot.cancel_token.take() {
            debug!(%concern, generation = slot.generation, "cancelling request");
            token.cancel();
        }
        slot.is_loading = false;
    }

    pub fn cancel_all(&mut self) {
        for concern in Concern::ALL {
            self.cancel(concern);
        }
    }

    pub fn is_loading(&self, concern: Concern) -> bool {
        self.slots[concern.index()].is_loading
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        let slot = &self.slots[ticket.concern.index()];
        slot.generation == ticket.generation && !ticket.token.is_cancelled()
    }
}

impl Ticket {
    pub fn concern(&self) -> Concern {
        self.concern
    }

    #[cfg(test)]
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `work` until it finishes or this ticket is cancelled
    ///
    /// On cancellation the work future is dropped, which aborts the
    /// underlying transport call.
    pub async fn run<F>(&self, work: F) -> Completion<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Completion::Cancelled,
            output = work => Completion::Completed(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn begin_marks_loading_and_finish_clears_it() {
        let mut requests = Supersession::new();
        let ticket = requests.begin(Concern::RecipeTree);

        assert!(requests.is_loading(Concern::RecipeTree));
        assert!(!requests.is_loading(Concern::ShoppingList));
        assert!(requests.finish(&ticket));
        assert!(!requests.is_loading(Concern::RecipeTree));
    }

    #[test]
    fn newer_request_supersedes_older_one() {
        let mut requests = Supersession::new();
        let first = requests.begin(Concern::ShoppingList);
        let second = requests.begin(Concern::ShoppingList);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!requests.is_current(&first));

        assert!(!requests.finish(&first));
        assert!(requests.is_loading(Concern::ShoppingList));
        assert!(requests.finish(&second));
        assert!(!requests.is_loading(Concern::ShoppingList));
    }

    #[test]
    fn concerns_are_independent() {
        let mut requests = Supersession::new();
        let tree = requests.begin(Concern::RecipeTree);
        let list = requests.begin(Concern::ShoppingList);

        assert!(!tree.is_cancelled());
        assert!(requests.finish(&list));
        assert!(requests.finish(&tree));
    }

    #[test]
    fn cancel_clears_loading_and_discards_result() {
        let mut requests = Supersession::new();
        let ticket = requests.begin(Concern::Items);

        requests.cancel(Concern::Items);
        assert!(!requests.is_loading(Concern::Items));
        assert!(ticket.is_cancelled());
        assert!(!requests.finish(&ticket));
    }

    #[tokio::test]
    async fn run_returns_work_output() {
        let mut requests = Supersession::new();
        let ticket = requests.begin(Concern::Items);

        match ticket.run(async { 7 }).await {
            Completion::Completed(value) => assert_eq!(value, 7),
            Completion::Cancelled => panic!("work should complete"),
        }
    }

    #[tokio::test]
    async fn run_stops_when_superseded() {
        let mut requests = Supersession::new();
        let first = requests.begin(Concern::RecipeTree);
        let (_release, gate) = oneshot::channel::<()>();

        let pending = tokio::spawn({
            let first = first.clone();
            async move { first.run(gate).await }
        });

        let _second = requests.begin(Concern::RecipeTree);
        let completion = pending.await.expect("join");
        assert!(matches!(completion, Completion::Cancelled));
        assert!(!requests.finish(&first));
    }
}
