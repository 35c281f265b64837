use std::marker::PhantomData;

use crate::{
  observable::{ItemMarker, Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, RcDerefMut},
  subscription::{SharedSubscription, Subscription},
};

/// Samples the source each time the sampler emits.
///
/// `P` decides what a sampler tick emits: [`OnChange`] for `sample`,
/// [`Latest`] for `sample_latest`. `NItem` is the sampler's item type.
pub struct SampleOp<S, N, P, NItem> {
  pub(crate) source: S,
  pub(crate) sampler: N,
  pub(crate) policy: P,
  _sampler_item: ItemMarker<NItem>,
}

impl<S, N, P, NItem> SampleOp<S, N, P, NItem> {
  pub(crate) fn new(source: S, sampler: N, policy: P) -> Self {
    SampleOp { source, sampler, policy, _sampler_item: PhantomData }
  }
}

impl<S: Clone, N: Clone, P: Clone, NItem> Clone for SampleOp<S, N, P, NItem> {
  fn clone(&self) -> Self {
    SampleOp::new(self.source.clone(), self.sampler.clone(), self.policy.clone())
  }
}

pub struct SampleState<Item> {
  value: Option<Item>,
  has_new: bool,
  source_done: bool,
}

mod sealed {
  pub trait Sealed {}

  impl Sealed for super::OnChange {}
  impl Sealed for super::Latest {}
}

/// What a sampler notification takes out of the sampling state. Implemented
/// by [`OnChange`] and [`Latest`] only.
pub trait SamplePolicy<Item>: Clone + sealed::Sealed {
  /// Value to emit on a sampler `next`.
  fn on_tick(&self, state: &mut SampleState<Item>) -> Option<Item>;

  /// Value to emit right before completing, when the sampler completes.
  fn on_sampler_complete(&self, state: &mut SampleState<Item>) -> Option<Item>;
}

/// Emit only values that arrived since the previous sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct OnChange;

/// Emit the latest value on every tick, repeats included.
#[derive(Clone, Copy, Debug, Default)]
pub struct Latest;

impl<Item> SamplePolicy<Item> for OnChange {
  fn on_tick(&self, state: &mut SampleState<Item>) -> Option<Item> {
    if state.has_new {
      state.has_new = false;
      state.value.take()
    } else {
      None
    }
  }

  fn on_sampler_complete(&self, state: &mut SampleState<Item>) -> Option<Item> {
    if state.source_done {
      self.on_tick(state)
    } else {
      None
    }
  }
}

impl<Item: Clone> SamplePolicy<Item> for Latest {
  fn on_tick(&self, state: &mut SampleState<Item>) -> Option<Item> {
    state.has_new = false;
    state.value.clone()
  }

  fn on_sampler_complete(&self, state: &mut SampleState<Item>) -> Option<Item> {
    state.has_new = false;
    state.value.take()
  }
}

impl<Item, Err, O, S, N, P, NItem> Observable<Item, Err, O> for SampleOp<S, N, P, NItem>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, SampleSourceObserver<O, Item, P>>,
  S::Unsub: Send + 'static,
  N: Observable<NItem, Err, SamplerObserver<O, Item, P>>,
  N::Unsub: Send + 'static,
  P: SamplePolicy<Item>,
{
  type Unsub = SharedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Self { source, sampler, policy, .. } = self;
    let subscription = SharedSubscription::default();
    let core = SampleCore {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(SampleState { value: None, has_new: false, source_done: false }),
      subscription: subscription.clone(),
      policy,
    };

    // Source first, so a source value and a sampler tick on the same instant
    // are seen in that order.
    subscription.add(source.actual_subscribe(SampleSourceObserver(core.clone())));
    subscription.add(sampler.actual_subscribe(SamplerObserver(core)));
    subscription
  }
}

impl<Item, Err, S, N, P, NItem> ObservableExt<Item, Err> for SampleOp<S, N, P, NItem> where
  S: ObservableExt<Item, Err>
{
}

struct SampleCore<O, Item, P> {
  observer: MutArc<Option<O>>,
  state: MutArc<SampleState<Item>>,
  subscription: SharedSubscription,
  policy: P,
}

impl<O, Item, P: Clone> Clone for SampleCore<O, Item, P> {
  fn clone(&self) -> Self {
    SampleCore {
      observer: self.observer.clone(),
      state: self.state.clone(),
      subscription: self.subscription.clone(),
      policy: self.policy.clone(),
    }
  }
}

impl<O, Item, P> SampleCore<O, Item, P> {
  fn error<Err>(self, err: Err)
  where
    O: Observer<Item, Err>,
  {
    {
      let mut state = self.state.rc_deref_mut();
      state.value = None;
      state.has_new = false;
    }
    self.observer.error(err);
    self.subscription.unsubscribe();
  }

  fn emit_and_complete<Err>(mut self, value: Option<Item>)
  where
    O: Observer<Item, Err>,
  {
    if let Some(value) = value {
      self.observer.next(value);
    }
    self.observer.complete();
    self.subscription.unsubscribe();
  }
}

pub struct SampleSourceObserver<O, Item, P>(SampleCore<O, Item, P>);

impl<O, Item, Err, P> Observer<Item, Err> for SampleSourceObserver<O, Item, P>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let mut state = self.0.state.rc_deref_mut();
    state.value = Some(value);
    state.has_new = true;
  }

  fn error(self, err: Err) { self.0.error(err); }

  fn complete(self) { self.0.state.rc_deref_mut().source_done = true; }

  #[inline]
  fn is_finished(&self) -> bool { self.0.observer.is_finished() }
}

pub struct SamplerObserver<O, Item, P>(SampleCore<O, Item, P>);

impl<O, Item, Err, NItem, P> Observer<NItem, Err> for SamplerObserver<O, Item, P>
where
  O: Observer<Item, Err>,
  P: SamplePolicy<Item>,
{
  fn next(&mut self, _: NItem) {
    let (value, source_done) = {
      let mut state = self.0.state.rc_deref_mut();
      let value = self.0.policy.on_tick(&mut state);
      (value, state.source_done)
    };
    if source_done {
      self.0.clone().emit_and_complete::<Err>(value);
    } else if let Some(value) = value {
      self.0.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.0.error(err); }

  fn complete(self) {
    let value = self.0.policy.on_sampler_complete(&mut self.0.state.rc_deref_mut());
    self.0.emit_and_complete::<Err>(value);
  }

  #[inline]
  fn is_finished(&self) -> bool { self.0.observer.is_finished() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn sampler_completion_ends_a_live_source() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot::<i32, ()>(vec![next(210, 1), next(260, 2)]);
    let ys = scheduler.hot::<(), ()>(vec![next(220, ()), next(250, ()), completed(300)]);
    let (c_xs, c_ys) = (xs.clone(), ys.clone());
    let res = scheduler.start(move || c_xs.sample(c_ys));

    // 2 arrived after the last tick but the source never completed
    assert_eq!(res, vec![next(220, 1), completed(300)]);
    assert_eq!(xs.subscriptions(), vec![SubscriptionInterval::new(200, 300)]);
    assert_eq!(ys.subscriptions(), vec![SubscriptionInterval::new(200, 300)]);
  }

  #[test]
  fn latest_repeats_on_sampler_completion() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot::<i32, ()>(vec![next(210, 1)]);
    let ys = scheduler.hot::<u8, ()>(vec![next(220, 0), next(230, 0), completed(300)]);
    let res = scheduler.start(move || xs.sample_latest(ys));

    assert_eq!(res, vec![next(220, 1), next(230, 1), next(300, 1), completed(300)]);
  }

  #[test]
  fn nothing_to_sample() {
    let scheduler = TestScheduler::default();
    let xs = scheduler.hot::<i32, ()>(vec![completed(250)]);
    let ys = scheduler.hot::<u8, ()>(vec![next(220, 0), next(260, 0)]);
    let res = scheduler.start(move || xs.sample_latest(ys));

    assert_eq!(res, vec![completed(260)]);
  }
}
