use std::time::Duration;

use tracing::trace;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  scheduler::Scheduler,
  subscription::SharedSubscription,
};

#[derive(Debug, Clone)]
pub struct DelaySubscriptionOp<S, SD> {
  pub(crate) source: S,
  pub(crate) delay: Duration,
  pub(crate) scheduler: SD,
}

impl<Item, Err, O, S, SD> Observable<Item, Err, O> for DelaySubscriptionOp<S, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  S: Observable<Item, Err, O> + Send + 'static,
  S::Unsub: Send + 'static,
  SD: Scheduler,
{
  type Unsub = SharedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Self { source, delay, scheduler } = self;
    let subscription = SharedSubscription::default();
    let c_subscription = subscription.clone();
    let handle = scheduler.schedule_after(delay, move || {
      trace!("delayed subscribe");
      // Disposed meanwhile: `add` releases the fresh subscription at once.
      c_subscription.add(source.actual_subscribe(observer));
    });
    subscription.add(handle);
    subscription
  }
}

impl<Item, Err, S, SD> ObservableExt<Item, Err> for DelaySubscriptionOp<S, SD> where
  S: ObservableExt<Item, Err>
{
}
