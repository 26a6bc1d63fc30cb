use packstate_holder::{
    AtomicHolder, ChangeListener, CurrentState, HolderError, SerialExecutor, SharedListener,
    asynchronous, asynchronous_on_runtime, chain, listener_fn,
};
use packstate_state::{PackedState, StateType, packed_state};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

packed_state! {
    pub struct Gauge with change_support {
        level: i16,
        alarm: bool,
    }
}

type Seen = Arc<Mutex<Vec<(i16, i16)>>>;

fn recording(seen: &Seen) -> SharedListener {
    let seen = Arc::clone(seen);
    listener_fn(move |previous, changed_to, _| {
        let previous = Gauge::from_state(previous.clone())?;
        let changed_to = Gauge::from_state(changed_to.clone())?;
        seen.lock().unwrap().push((previous.level(), changed_to.level()));
        Ok(())
    })
}

fn holder_with(listener: SharedListener) -> AtomicHolder {
    AtomicHolder::builder(Arc::clone(Gauge::layout()))
        .listener(listener)
        .build()
        .unwrap()
}

fn set_level(holder: &AtomicHolder, level: i16) -> PackedState {
    holder.update_and_get(|s| s.with("level", level)).unwrap()
}

// ── synchronous dispatch ────────────────────────────────────────

#[test]
fn fires_with_previous_and_new() {
    let seen = Seen::default();
    let holder = holder_with(recording(&seen));
    set_level(&holder, 3);
    set_level(&holder, -8);
    assert_eq!(*seen.lock().unwrap(), vec![(0, 3), (3, -8)]);
}

#[test]
fn never_fires_for_no_op() {
    let seen = Seen::default();
    let holder = holder_with(recording(&seen));
    set_level(&holder, 0);
    holder.update_and_get(|s| Ok(s.clone())).unwrap();
    assert!(!holder.set(holder.state()).unwrap());
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn current_state_is_live_inside_listener() {
    let observed = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&observed);
    let holder = holder_with(listener_fn(move |_, _, current: &CurrentState| {
        *slot.lock().unwrap() = Some(current.get());
        Ok(())
    }));
    let committed = set_level(&holder, 12);
    assert_eq!(observed.lock().unwrap().clone(), Some(committed));
}

#[test]
fn failing_listener_does_not_affect_commit() {
    let holder = holder_with(listener_fn(|_, _, _| anyhow::bail!("listener refused")));
    let committed = set_level(&holder, 4);
    assert_eq!(holder.state(), committed);
}

#[test]
fn panicking_listener_does_not_affect_commit() {
    let holder = holder_with(listener_fn(|_, _, _| panic!("listener exploded")));
    let committed = set_level(&holder, 9);
    assert_eq!(holder.state(), committed);
    // the holder keeps working afterwards
    set_level(&holder, 10);
    assert_eq!(Gauge::from_state(holder.state()).unwrap().level(), 10);
}

// ── chain ───────────────────────────────────────────────────────

#[test]
fn chain_calls_both_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = (Arc::clone(&order), Arc::clone(&order));
    let first = listener_fn(move |_, _, _| {
        a.lock().unwrap().push("first");
        Ok(())
    });
    let then = listener_fn(move |_, _, _| {
        b.lock().unwrap().push("then");
        Ok(())
    });
    let holder = holder_with(chain(first, then).unwrap());
    set_level(&holder, 1);
    assert_eq!(*order.lock().unwrap(), vec!["first", "then"]);
}

#[test]
fn chain_runs_second_after_first_fails() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let failing = listener_fn(|_, _, _| panic!("first listener failed"));
    let counting = listener_fn(move |_, _, _| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let holder = holder_with(chain(failing, counting).unwrap());
    set_level(&holder, 1);
    set_level(&holder, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn chain_reports_first_failure() {
    let holder = AtomicHolder::new(Arc::clone(Gauge::layout()));
    let first = listener_fn(|_, _, _| anyhow::bail!("first"));
    let then = listener_fn(|_, _, _| anyhow::bail!("then"));
    let chained = chain(first, then).unwrap();
    let state = holder.state();
    let err = chained.on_change(&state, &state, &holder.current()).unwrap_err();
    assert_eq!(err.to_string(), "first");
}

#[test]
fn chain_with_itself_is_misuse() {
    let seen = Seen::default();
    let listener = recording(&seen);
    let err = chain(Arc::clone(&listener), listener).err().unwrap();
    assert!(matches!(err, HolderError::SelfChain));
}

// ── asynchronous dispatch ───────────────────────────────────────

#[test]
fn serial_executor_preserves_commit_order() {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let delegate = listener_fn(move |previous, changed_to, _| {
        tx.lock().unwrap().send((previous.value(), changed_to.value()))?;
        Ok(())
    });
    let executor = SerialExecutor::new("gauge-listener").unwrap();
    let holder = holder_with(asynchronous(executor, delegate));

    for level in 1..=50i16 {
        set_level(&holder, level);
    }

    let received: Vec<_> = (0..50)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    let expected: Vec<_> = (1..=50u64).map(|level| (level - 1, level)).collect();
    assert_eq!(received, expected);
}

#[test]
fn asynchronous_returns_before_delegate_runs() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (done_tx, done_rx) = mpsc::channel();
    let release_rx = Mutex::new(release_rx);
    let done_tx = Mutex::new(done_tx);
    let delegate = listener_fn(move |_, changed_to, _| {
        release_rx.lock().unwrap().recv()?;
        done_tx.lock().unwrap().send(changed_to.value())?;
        Ok(())
    });
    let holder = holder_with(asynchronous(SerialExecutor::new("blocked").unwrap(), delegate));

    // the commit completes while the delegate is still blocked
    let committed = set_level(&holder, 5);
    assert_eq!(holder.state(), committed);

    release_tx.send(()).unwrap();
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runtime_handle_dispatches_every_change() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let delegate = listener_fn(move |_, changed_to, current| {
        tx.send((changed_to.value(), current.get().value()))?;
        Ok(())
    });
    let holder = holder_with(asynchronous(tokio::runtime::Handle::current(), delegate));

    for level in 1..=10i16 {
        set_level(&holder, level);
    }

    let mut values = Vec::new();
    for _ in 0..10 {
        let (changed_to, _) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        values.push(changed_to);
    }
    values.sort_unstable();
    assert_eq!(values, (1..=10u64).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn current_runtime_dispatches_changes() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let delegate = listener_fn(move |previous, changed_to, _| {
        tx.send((previous.value(), changed_to.value()))?;
        Ok(())
    });
    let holder = holder_with(asynchronous_on_runtime(delegate).unwrap());

    set_level(&holder, 4);

    let change = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change, (0, 4));
}
