#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use web_time::{Duration, Instant};

    use crate::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Records every published value together with the runtime time.
    fn record<T: Clone + 'static>(rt: &Runtime, sig: &Signal<T>) -> Rc<RefCell<Vec<(T, Instant)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (rt, log2) = (rt.clone(), log.clone());
        sig.subscribe(move |v: &T| log2.borrow_mut().push((v.clone(), rt.now())));
        log
    }

    #[test]
    fn test_signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| v + 1);
        assert_eq!(sig.get(), 101);
        assert_eq!(sig.version(), 2);
    }

    #[test]
    fn test_signal_subscription() {
        let sig = signal(0);
        let called = Rc::new(Cell::new(0));

        let called_clone = called.clone();
        let id = sig.subscribe(move |_| called_clone.set(called_clone.get() + 1));

        sig.set(42);
        assert_eq!(called.get(), 1);

        assert!(sig.unsubscribe(id));
        assert!(!sig.unsubscribe(id));
        sig.set(43);
        assert_eq!(called.get(), 1);
        assert_eq!(sig.subscriber_count(), 0);
    }

    #[test]
    fn test_signal_subscriber_may_write_back() {
        let sig = signal(0);
        let s2 = sig.clone();
        sig.subscribe(move |v| {
            if *v < 3 {
                s2.set(v + 1);
            }
        });
        sig.set(1);
        assert_eq!(sig.get(), 3);
    }

    #[test]
    fn test_snapshots_are_replaced_not_mutated() {
        let sig = signal(vec![1, 2]);
        let before = sig.snapshot();
        sig.update(|v| {
            let mut next = v.clone();
            next.push(3);
            next
        });
        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*sig.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_set_if_changed() {
        let sig = signal("a");
        assert!(!sig.set_if_changed("a"));
        assert!(sig.set_if_changed("b"));
        assert_eq!(sig.version(), 1);
    }

    #[test]
    fn test_dispose_runs_once() {
        let n = Rc::new(Cell::new(0));
        let n2 = n.clone();
        let d = Dispose::new(move || n2.set(n2.get() + 1));
        let d2 = d.clone();
        d.run();
        d2.run();
        d.run();
        assert_eq!(n.get(), 1);
        assert!(d2.is_disposed());
        Dispose::noop().run();
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let order = Rc::new(RefCell::new(Vec::new()));

        let scope = Scope::new();
        let child = scope.child();
        for (s, name) in [(&scope, "first"), (&scope, "second"), (&child, "child")] {
            let order = order.clone();
            s.add_disposer(move || order.borrow_mut().push(name));
        }

        assert!(order.borrow().is_empty());
        scope.dispose();
        scope.dispose();
        assert_eq!(*order.borrow(), vec!["child", "second", "first"]);
        assert!(child.is_disposed());
    }

    #[test]
    fn test_scope_late_disposer_runs_immediately() {
        let scope = Scope::new();
        scope.dispose();
        let ran = Rc::new(Cell::new(false));
        let ran2 = ran.clone();
        scope.add_disposer(move || ran2.set(true));
        assert!(ran.get());
    }

    #[test]
    fn test_scope_drop_runs_disposers() {
        let ran = Rc::new(Cell::new(false));
        {
            let scope = Scope::new();
            let ran2 = ran.clone();
            scope.add_disposer(move || ran2.set(true));
        }
        assert!(ran.get());
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let (rt, clock) = Runtime::with_test_clock();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(30, "c"), (10, "a"), (20, "b"), (10, "a2")] {
            let order = order.clone();
            rt.set_timeout(ms(delay), move || order.borrow_mut().push(tag));
        }
        assert_eq!(rt.run_due(), 0);
        assert_eq!(rt.advance(&clock, ms(30)), 4);
        assert_eq!(*order.borrow(), vec!["a", "a2", "b", "c"]);
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn test_timer_cancel_is_idempotent() {
        let (rt, clock) = Runtime::with_test_clock();
        let fired = Rc::new(Cell::new(false));
        let f2 = fired.clone();
        let id = rt.set_timeout(ms(5), move || f2.set(true));
        assert!(rt.cancel(id));
        assert!(!rt.cancel(id));
        rt.advance(&clock, ms(10));
        assert!(!fired.get());
    }

    #[test]
    fn test_interval_repeats_until_cancelled() {
        let (rt, clock) = Runtime::with_test_clock();
        let ticks = Rc::new(Cell::new(0));
        let t2 = ticks.clone();
        let id = rt.set_interval(ms(100), move || t2.set(t2.get() + 1));
        rt.advance(&clock, ms(350));
        assert_eq!(ticks.get(), 3);
        rt.cancel(id);
        rt.advance(&clock, ms(500));
        assert_eq!(ticks.get(), 3);
    }

    #[test]
    fn test_timer_callback_can_schedule() {
        let (rt, clock) = Runtime::with_test_clock();
        let hits = Rc::new(Cell::new(0));
        let (rt2, h2) = (rt.clone(), hits.clone());
        rt.set_timeout(ms(10), move || {
            h2.set(h2.get() + 1);
            let h3 = h2.clone();
            rt2.set_timeout(Duration::ZERO, move || h3.set(h3.get() + 1));
        });
        rt.advance(&clock, ms(10));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_event_target_order_and_removal() {
        let target: EventTarget<i32> = EventTarget::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s1 = seen.clone();
        let a = target.add_listener("tick", move |v| s1.borrow_mut().push(("a", *v)));
        let s2 = seen.clone();
        target.add_listener("tick", move |v| s2.borrow_mut().push(("b", *v)));
        target.add_listener("other", |_| panic!("wrong event"));

        assert_eq!(target.dispatch("tick", &1), 2);
        assert!(target.remove_listener(a));
        assert!(!target.remove_listener(a));
        target.dispatch("tick", &2);
        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("b", 2)]);
        assert_eq!(target.listener_count_for("tick"), 1);
    }

    #[test]
    fn test_subscription_reconfigure_detaches_first() {
        let target: EventTarget<i32> = EventTarget::new();
        let fold = |_: &i32, _: &str, e: &i32| Some(*e);

        let mut sub = Subscription::new(EventSource::new(&target, ["a"], 0, fold));
        assert_eq!(target.listener_count_for("a"), 1);

        assert!(!sub.reconfigure(EventSource::new(&target, ["a"], 0, fold)));
        assert_eq!(target.listener_count(), 1);

        assert!(sub.reconfigure(EventSource::new(&target, ["b"], -1, fold)));
        assert_eq!(target.listener_count_for("a"), 0);
        assert_eq!(target.listener_count_for("b"), 1);
        assert_eq!(sub.get(), -1);

        target.dispatch("a", &5);
        assert_eq!(sub.get(), -1);
        target.dispatch("b", &7);
        assert_eq!(sub.get(), 7);

        sub.dispose();
        sub.dispose();
        assert_eq!(target.listener_count(), 0);
    }

    #[test]
    fn test_emitter_discards_after_teardown() {
        struct Deferred(Rc<RefCell<Option<Emitter<u8>>>>);
        impl Source for Deferred {
            type Value = u8;
            type Key = ();
            fn key(&self) -> Self::Key {}
            fn initial(&self) -> u8 {
                0
            }
            fn attach(&self, emit: Emitter<u8>) -> Dispose {
                *self.0.borrow_mut() = Some(emit);
                Dispose::noop()
            }
        }

        let parked = Rc::new(RefCell::new(None));
        let sub = Subscription::new(Deferred(parked.clone()));
        let value = sub.value();
        let emit = parked.borrow_mut().take().unwrap();
        assert!(emit.emit(1));
        drop(sub);
        assert!(!emit.emit(2));
        assert_eq!(value.get(), 1);
    }

    #[test]
    fn test_no_listener_leak_across_mount_cycles() {
        let (rt, _clock) = Runtime::with_test_clock();
        let window: EventTarget<u32> = EventTarget::new();

        for _ in 0..25 {
            let instance = Instance::new(&rt);
            instance.compose(|cx| {
                use_source(
                    cx,
                    EventSource::new(&window, ["resize", "scroll"], 0u32, |_, _, e| Some(*e)),
                );
            });
            assert_eq!(window.listener_count(), 2);
            instance.unmount();
        }
        assert_eq!(window.listener_count(), 0);

        // Drop without explicit unmount releases too.
        {
            let instance = Instance::new(&rt);
            instance.compose(|cx| {
                use_source(cx, EventSource::new(&window, ["resize"], 0u32, |_, _, e| Some(*e)));
            });
        }
        assert_eq!(window.listener_count(), 0);
    }

    #[test]
    fn test_use_source_follows_key_changes() {
        let (rt, _clock) = Runtime::with_test_clock();
        let target: EventTarget<u32> = EventTarget::new();
        let instance = Instance::new(&rt);
        let render = |event: &'static str| {
            instance.compose(|cx| {
                use_source(cx, EventSource::new(&target, [event], 0u32, |_, _, e| Some(*e)))
            })
        };

        let v = render("a");
        target.dispatch("a", &3);
        assert_eq!(v.get(), 3);

        let v2 = render("a");
        assert!(v.ptr_eq(&v2));
        assert_eq!(target.listener_count(), 1);

        render("b");
        assert_eq!(target.listener_count_for("a"), 0);
        assert_eq!(target.listener_count_for("b"), 1);
    }

    #[test]
    fn test_debounce_trailing_edge() {
        let (rt, clock) = Runtime::with_test_clock();
        let start = rt.now();
        let gate = Debounced::new(&rt, 0, ms(500));
        let log = record(&rt, &gate.value());

        gate.set(1);
        rt.advance(&clock, ms(50));
        gate.set(2);
        rt.advance(&clock, ms(50));
        gate.set(3);

        rt.advance(&clock, ms(499));
        assert!(log.borrow().is_empty());
        assert!(gate.is_pending());

        rt.advance(&clock, ms(1));
        assert_eq!(*log.borrow(), vec![(3, start + ms(600))]);
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn test_debounce_zero_delay_passthrough() {
        let (rt, _clock) = Runtime::with_test_clock();
        let gate = Debounced::new(&rt, "x", Duration::ZERO);
        gate.set("y");
        assert_eq!(gate.get(), "y");
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn test_debounce_dispose_blocks_stale_update() {
        let (rt, clock) = Runtime::with_test_clock();
        let gate = Debounced::new(&rt, 0, ms(100));
        gate.set(9);
        gate.dispose();
        gate.set(10);
        rt.advance(&clock, ms(200));
        assert_eq!(gate.get(), 0);

        let dropped = Debounced::new(&rt, 0, ms(100));
        let value = dropped.value();
        dropped.set(1);
        drop(dropped);
        assert_eq!(rt.pending_timers(), 0);
        rt.advance(&clock, ms(200));
        assert_eq!(value.get(), 0);
    }

    #[test]
    fn test_debounce_flush_and_cancel() {
        let (rt, clock) = Runtime::with_test_clock();
        let gate = Debounced::new(&rt, 0, ms(100));
        gate.set(1);
        gate.flush();
        assert_eq!(gate.get(), 1);
        gate.set(2);
        gate.cancel();
        rt.advance(&clock, ms(200));
        assert_eq!(gate.get(), 1);
    }

    #[test]
    fn test_throttle_bounds_update_rate() {
        let (rt, clock) = Runtime::with_test_clock();
        let interval = ms(300);
        let gate = Throttled::new(&rt, -1, interval);
        let log = record(&rt, &gate.value());

        // Continuous input for 1000ms, one value every 10ms.
        for i in 0..100 {
            gate.set(i);
            rt.advance(&clock, ms(10));
        }
        rt.advance(&clock, interval);

        let log = log.borrow();
        let bound = 1000_u64.div_ceil(300) as usize + 1;
        assert!(log.len() <= bound, "{} updates", log.len());
        for pair in log.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= interval);
        }
        assert_eq!(log.last().map(|(v, _)| *v), Some(99));
        assert_eq!(log.first().map(|(v, _)| *v), Some(0));
    }

    #[test]
    fn test_throttle_coalesces_to_one_timer() {
        let (rt, clock) = Runtime::with_test_clock();
        let gate = Throttled::new(&rt, 0, ms(100));
        gate.set(1);
        assert_eq!(gate.get(), 1);
        gate.set(2);
        gate.set(3);
        gate.set(4);
        assert_eq!(rt.pending_timers(), 1);
        assert_eq!(gate.get(), 1);
        rt.advance(&clock, ms(100));
        assert_eq!(gate.get(), 4);
        rt.advance(&clock, ms(100));
        gate.set(5);
        assert_eq!(gate.get(), 5);
    }

    #[test]
    fn test_throttle_zero_interval_passthrough() {
        let (rt, _clock) = Runtime::with_test_clock();
        let gate = Throttled::new(&rt, 0, Duration::ZERO);
        for i in 1..=5 {
            gate.set(i);
            assert_eq!(gate.get(), i);
        }
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn test_map_state_snapshots() {
        let map = MapState::new([("a", 1)]);
        let s0 = map.snapshot();

        let s1 = map.set("b", 2);
        assert!(map.has(&"b"));
        assert!(!Rc::ptr_eq(&s0, &s1));
        assert!(!s0.contains_key("b"));

        let s2 = map.remove(&"b");
        assert!(!map.has(&"b"));
        assert!(!Rc::ptr_eq(&s1, &s2));

        let s3 = map.remove(&"missing");
        assert!(!Rc::ptr_eq(&s2, &s3));

        let s4 = map.clear();
        assert_eq!(s4.len(), 0);
        assert!(map.is_empty());

        map.reset();
        assert_eq!(map.get(&"a"), Some(1));
    }

    #[test]
    fn test_map_reads_do_not_publish() {
        let map: MapState<u8, u8> = MapState::new([]);
        let sig = map.signal();
        map.has(&1);
        map.get(&1);
        map.len();
        assert_eq!(sig.version(), 0);
    }

    #[test]
    fn test_set_state_toggle() {
        let set = SetState::new(["x"]);
        let s0 = set.snapshot();
        let s1 = set.add("y");
        assert!(set.has(&"y"));
        assert!(!Rc::ptr_eq(&s0, &s1));

        set.toggle("y");
        assert!(!set.has(&"y"));
        set.toggle("y");
        assert!(set.has(&"y"));

        set.remove(&"x");
        assert!(!set.has(&"x"));
        assert_eq!(set.clear().len(), 0);
        set.reset();
        assert!(set.has(&"x") && set.len() == 1);
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Act {
        Add(i32),
        Reset,
    }

    fn counter_reducer(s: &i32, a: &Act) -> i32 {
        match a {
            Act::Add(n) => s + n,
            Act::Reset => 0,
        }
    }

    #[test]
    fn test_middleware_runs_in_order_before_reducer() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let (t1, t2, t3) = (trace.clone(), trace.clone(), trace.clone());
        let store = ReducerStore::builder(0, move |s: &i32, a: &Act| {
            t3.borrow_mut().push("reducer");
            counter_reducer(s, a)
        })
        .middleware_fn("m1", move |_, a, next| {
            t1.borrow_mut().push("m1");
            next.run(a)
        })
        .middleware_fn("m2", move |_, a, next| {
            t2.borrow_mut().push("m2");
            next.run(a)
        })
        .build();

        for _ in 0..3 {
            store.dispatch(Act::Add(1)).unwrap();
        }
        assert_eq!(*store.state(), 3);
        assert_eq!(*trace.borrow(), ["m1", "m2", "reducer"].repeat(3));
        assert_eq!(store.middleware_names(), vec!["m1", "m2"]);
    }

    #[test]
    fn test_middleware_substitute_and_short_circuit() {
        let store = ReducerStore::builder(0, counter_reducer)
            .middleware_fn("cap", |_, a, next| match a {
                Act::Add(n) if n > 10 => next.run(Act::Add(10)),
                Act::Reset => Ok(()),
                other => next.run(other),
            })
            .build();

        store.dispatch(Act::Add(50)).unwrap();
        assert_eq!(*store.state(), 10);
        store.dispatch(Act::Reset).unwrap();
        assert_eq!(*store.state(), 10);
    }

    #[test]
    fn test_middleware_error_leaves_state_untouched() {
        let reached = Rc::new(Cell::new(false));
        let r2 = reached.clone();
        let store = ReducerStore::builder(5, counter_reducer)
            .middleware_fn("guard", |_, a, next| {
                if a == Act::Reset {
                    return Err(DispatchError::rejected("guard", "reset is not allowed"));
                }
                next.run(a)
            })
            .middleware_fn("after-guard", move |_, a, next| {
                r2.set(true);
                next.run(a)
            })
            .build();

        let err = store.dispatch(Act::Reset).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Rejected { ref middleware, .. } if middleware == "guard"
        ));
        assert!(err.to_string().contains("reset is not allowed"));
        assert_eq!(*store.state(), 5);
        assert!(!reached.get());
        assert_eq!(store.signal().version(), 0);
    }

    #[test]
    fn test_middleware_can_dispatch_more_actions() {
        let store = ReducerStore::builder(0, counter_reducer)
            .middleware_fn("echo", |store, a, next| {
                let extra = matches!(a, Act::Add(1));
                next.run(a)?;
                if extra {
                    store.dispatch(Act::Add(100))?;
                }
                Ok(())
            })
            .build();
        store.dispatch(Act::Add(1)).unwrap();
        assert_eq!(*store.state(), 101);
    }

    #[test]
    fn test_runaway_dispatch_is_bounded() {
        let store = ReducerStore::builder(0, counter_reducer)
            .middleware_fn("loop", |store, a, next| {
                next.run(a.clone())?;
                store.dispatch(a)
            })
            .build();
        let err = store.dispatch(Act::Add(1)).unwrap_err();
        assert!(matches!(err, DispatchError::TooDeep(MAX_DISPATCH_DEPTH)));
        // Every completed reducer step before the limit stays committed.
        assert_eq!(*store.state(), MAX_DISPATCH_DEPTH as i32);
    }

    #[test]
    fn test_afterware_sees_committed_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s2 = seen.clone();
        let store = ReducerStore::builder(1, counter_reducer)
            .middleware(LoggingMiddleware::new("counter"))
            .afterware(move |a: &Act, s: &i32| s2.borrow_mut().push((a.clone(), *s)))
            .build();
        store.dispatch(Act::Add(2)).unwrap();
        store.dispatch(Act::Reset).unwrap();
        assert_eq!(*seen.borrow(), vec![(Act::Add(2), 3), (Act::Reset, 0)]);
    }

    #[test]
    fn test_remember_is_order_based() {
        let (rt, _clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let inits = Rc::new(Cell::new(0));
        for _ in 0..3 {
            instance.compose(|cx| {
                let a = cx.remember(|| {
                    inits.set(inits.get() + 1);
                    1
                });
                let b = cx.remember_with_key("b", || "b");
                assert_eq!((*a, *b), (1, "b"));
            });
        }
        assert_eq!(inits.get(), 1);
        assert_eq!(instance.compositions(), 3);
    }

    #[test]
    fn test_disposable_effect_reruns_on_key_change() {
        let (rt, _clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let log = Rc::new(RefCell::new(Vec::new()));
        let render = |key: u8| {
            instance.compose(|cx| {
                let log = log.clone();
                cx.disposable_effect(key, move || {
                    log.borrow_mut().push(format!("start {key}"));
                    on_unmount(move || log.borrow_mut().push(format!("stop {key}")))
                });
            })
        };
        render(1);
        render(1);
        render(2);
        instance.unmount();
        instance.unmount();
        assert_eq!(*log.borrow(), vec!["start 1", "stop 1", "start 2", "stop 2"]);
    }

    #[test]
    fn test_remount_starts_fresh() {
        let (rt, _clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let counter = instance.compose(|cx| use_counter(cx, 0, None));
        counter.increment();
        instance.unmount();
        assert!(!instance.is_mounted());
        let counter = instance.compose(|cx| use_counter(cx, 0, None));
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_use_debounce_across_passes() {
        let (rt, clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let render = |q: &str| {
            let q = q.to_string();
            instance.compose(move |cx| use_debounce(cx, q, ms(200)))
        };
        assert_eq!(render("a"), "a");
        assert_eq!(render("ab"), "a");
        rt.advance(&clock, ms(100));
        assert_eq!(render("abc"), "a");
        rt.advance(&clock, ms(200));
        assert_eq!(render("abc"), "abc");

        render("abcd");
        instance.unmount();
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn test_use_throttle_across_passes() {
        let (rt, clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let render = |v: u32| instance.compose(|cx| use_throttle(cx, v, ms(100)));
        assert_eq!(render(0), 0);
        rt.advance(&clock, ms(100));
        assert_eq!(render(1), 1);
        assert_eq!(render(2), 1);
        rt.advance(&clock, ms(100));
        assert_eq!(render(2), 2);
    }

    #[test]
    fn test_use_previous_and_toggle() {
        let (rt, _clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let prev = |v: u8| instance.compose(|cx| use_previous(cx, v));
        assert_eq!(prev(1), None);
        assert_eq!(prev(2), Some(1));
        assert_eq!(prev(3), Some(2));

        let other = Instance::new(&rt);
        let toggle = other.compose(|cx| use_toggle(cx, false));
        toggle.toggle();
        assert!(other.compose(|cx| use_toggle(cx, false)).get());
    }

    #[test]
    fn test_counter_respects_bounds() {
        let (rt, _clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let counter = instance.compose(|cx| use_counter(cx, 12, Some(0..=10)));
        assert_eq!(counter.get(), 10);
        counter.increment();
        assert_eq!(counter.get(), 10);
        counter.set(-4);
        assert_eq!(counter.get(), 0);
        counter.add(3);
        counter.decrement();
        assert_eq!(counter.get(), 2);
        counter.reset();
        assert_eq!(counter.get(), 10);
    }

    #[test]
    fn test_counter_with_reversed_bounds_clamps_to_normalised_range() {
        let (rt, _clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        let counter = instance.compose(|cx| use_counter(cx, 0, Some(5..=1)));
        assert_eq!(counter.get(), 1);
        counter.set(9);
        assert_eq!(counter.get(), 5);
        counter.add(-20);
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_use_collections_and_reducer_persist_across_passes() {
        let (rt, _clock) = Runtime::with_test_clock();
        let instance = Instance::new(&rt);
        instance.compose(|cx| {
            use_map(cx, || [(1u8, "one")]).set(2, "two");
            use_set(cx, Vec::<u8>::new).add(7);
            use_reducer_with_middleware(cx, || ReducerStore::new(0, counter_reducer))
                .dispatch(Act::Add(4))
                .unwrap();
        });
        instance.compose(|cx| {
            assert_eq!(use_map(cx, || [(1u8, "one")]).len(), 2);
            assert!(use_set(cx, Vec::<u8>::new).has(&7));
            let store = use_reducer_with_middleware(cx, || ReducerStore::new(0, counter_reducer));
            assert_eq!(*store.state(), 4);
        });
    }
}
