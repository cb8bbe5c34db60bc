//! Whole-engine tests for the shortcut matching pipeline

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::config::EngineConfig;

fn engine() -> Engine {
    Engine::new(&EngineConfig::default()).with_target(Target::new("test"))
}

fn counter() -> (Rc<Cell<usize>>, impl Fn(&KeyEvent) + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, move |_: &KeyEvent| inner.set(inner.get() + 1))
}

fn press(key: &str) -> RawKeyEvent {
    RawKeyEvent::press(key, Modifiers::NONE)
}

fn release(key: &str) -> RawKeyEvent {
    RawKeyEvent::release(key, Modifiers::NONE)
}

#[test]
fn test_meta_s_fires_once() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(
        vec![Command::new("save", Predicate::chord("s", Modifiers::META), handler).with_priority(1)],
        None,
    );

    engine.handle_event(&RawKeyEvent::press("Meta", Modifiers::META), 0);
    engine.handle_event(&RawKeyEvent::press("s", Modifiers::META), 0);
    assert_eq!(engine.poll(1), Some(Resolution::Fired { uuid: "save".into(), priority: 1 }));
    assert_eq!(count.get(), 1);

    engine.handle_event(&RawKeyEvent::release("s", Modifiers::META), 50);
    engine.handle_event(&RawKeyEvent::release("Meta", Modifiers::NONE), 60);
    engine.poll(5_000);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_sequence_aligns_with_snapshots() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(
        vec![Command::new(
            "copy",
            Predicate::sequence(vec![Predicate::key("Control"), Predicate::key("c")]),
            handler,
        )
        .with_priority(1)],
        None,
    );

    engine.handle_event(&press("Control"), 0);
    engine.handle_event(&press("c"), 10);
    assert_eq!(count.get(), 0, "resolution waits for the batch window");

    assert_eq!(engine.poll(11).as_ref().and_then(Resolution::fired), Some("copy"));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_second_snapshot_carries_held_keys() {
    let engine = engine();
    engine.handle_event(&press("Control"), 0);
    engine.handle_event(&press("c"), 10);
    engine.poll(11);

    engine.inspect(|_, snapshots| {
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].keys().collect::<Vec<_>>(), vec!["Control"]);
        assert_eq!(snapshots[1].keys().collect::<Vec<_>>(), vec!["Control", "c"]);
    });
}

#[test]
fn test_lowest_priority_wins() {
    let engine = engine();
    let (low, low_handler) = counter();
    let (high, high_handler) = counter();
    engine.register_commands(
        vec![
            Command::new("five", Predicate::key("Escape"), high_handler).with_priority(5),
            Command::new("two", Predicate::key("Escape"), low_handler).with_priority(2),
        ],
        None,
    );

    engine.handle_event(&press("Escape"), 0);
    engine.poll(1);

    assert_eq!(low.get(), 1);
    assert_eq!(high.get(), 0);
}

#[test]
fn test_equal_priority_first_registered_wins() {
    let engine = engine();
    let (first, first_handler) = counter();
    let (second, second_handler) = counter();
    engine.register_commands(
        vec![
            Command::new("first", Predicate::key("x"), first_handler),
            Command::new("second", Predicate::key("x"), second_handler),
        ],
        None,
    );

    engine.handle_event(&press("x"), 0);
    engine.poll(1);

    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 0);
}

#[test]
fn test_simultaneous_events_share_a_snapshot() {
    let engine = engine();
    engine.handle_event(&press("a"), 100);
    engine.handle_event(&press("b"), 100);
    engine.handle_event(&press("c"), 100);
    engine.handle_event(&press("d"), 101);
    engine.poll(102);

    engine.inspect(|_, snapshots| {
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].events().len(), 3);
        // `d` lands one window later; the first three are still held
        assert_eq!(snapshots[1].events().len(), 4);
    });
}

#[test]
fn test_no_resolution_inside_batch_window() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], None);

    engine.handle_event(&press("a"), 0);
    assert_eq!(engine.poll(0), None);
    assert_eq!(engine.next_deadline(), Some(1));
    assert_eq!(count.get(), 0);

    engine.poll(1);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_idle_timeout_purges_state() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(
        vec![Command::new(
            "ab",
            Predicate::sequence(vec![Predicate::key("a"), Predicate::key("b")]),
            handler,
        )],
        None,
    );

    engine.handle_event(&press("a"), 0);
    engine.handle_event(&release("a"), 10);
    // Idle deadline is 1010
    engine.handle_event(&press("b"), 1200);
    engine.poll(1201);

    assert_eq!(count.get(), 0);
    engine.inspect(|history, snapshots| {
        assert!(!history.contains(KeyEventKind::Press, "a"));
        assert_eq!(snapshots.len(), 1);
    });
}

#[test]
fn test_sequence_within_idle_timeout() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(
        vec![Command::new(
            "ab",
            Predicate::sequence(vec![Predicate::key("a"), Predicate::key("b")]),
            handler,
        )],
        None,
    );

    engine.handle_event(&press("a"), 0);
    engine.handle_event(&release("a"), 10);
    engine.handle_event(&press("b"), 500);
    engine.poll(501);

    assert_eq!(count.get(), 1);
}

#[test]
fn test_presses_do_not_arm_idle_timer() {
    let engine = engine();
    engine.handle_event(&press("Shift"), 0);
    engine.poll(1);
    assert_eq!(engine.next_deadline(), None);

    engine.poll(10_000);
    engine.inspect(|history, _| assert!(history.contains(KeyEventKind::Press, "Shift")));
}

#[test]
fn test_idle_clear_deferred_while_keys_held() {
    let engine = engine();
    engine.handle_event(&press("a"), 0);
    engine.handle_event(&press("b"), 5);
    engine.handle_event(&release("b"), 10);

    // Idle fires at 1010 with `a` still down
    engine.poll(2_000);
    assert_eq!(engine.held_keys(), vec!["a".to_string()]);
    engine.inspect(|history, _| assert!(history.contains(KeyEventKind::Press, "a")));

    // The next release clears and is not recorded itself
    engine.handle_event(&release("a"), 2_100);
    engine.inspect(|history, snapshots| {
        assert!(history.is_empty());
        assert!(snapshots.is_empty());
    });
    assert!(engine.held_keys().is_empty());
}

#[test]
fn test_losing_target_completes_deferred_clear() {
    let engine = engine();
    engine.handle_event(&press("a"), 0);
    engine.handle_event(&press("b"), 5);
    engine.handle_event(&release("b"), 10);
    engine.poll(2_000);
    assert_eq!(engine.held_keys(), vec!["a".to_string()]);

    // The release of `a` will never be seen, so the clear happens now
    engine.set_target(None);
    assert!(engine.held_keys().is_empty());
    engine.inspect(|history, snapshots| {
        assert!(history.is_empty());
        assert!(snapshots.is_empty());
    });
    assert_eq!(engine.phase(), Phase::Idle);
}

#[test]
fn test_no_target_drops_events() {
    let engine = Engine::new(&EngineConfig::default());
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], None);

    engine.handle_event(&press("a"), 0);
    engine.poll(10);

    assert_eq!(count.get(), 0);
    assert_eq!(engine.phase(), Phase::Idle);
    engine.inspect(|history, _| assert!(history.is_empty()));
}

#[test]
fn test_target_can_be_restored() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], None);

    engine.set_target(None);
    engine.handle_event(&press("a"), 0);
    engine.poll(5);
    assert_eq!(count.get(), 0);

    engine.set_target(Some(Target::new("editor")));
    engine.handle_event(&press("a"), 10);
    engine.poll(11);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_deregister_prevents_firing() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], Some("panel"));
    assert_eq!(engine.command_count(), 1);

    engine.deregister_commands();
    assert_eq!(engine.command_count(), 0);

    engine.handle_event(&press("a"), 0);
    assert_eq!(engine.poll(1), Some(Resolution::NoMatch));
    assert_eq!(count.get(), 0);
}

#[test]
fn test_register_replaces_previous_set() {
    let engine = engine();
    let (old, old_handler) = counter();
    let (new, new_handler) = counter();
    engine.register_commands(vec![Command::new("old", Predicate::key("a"), old_handler)], None);
    engine.register_commands(vec![Command::new("new", Predicate::key("b"), new_handler)], None);

    engine.handle_event(&press("a"), 0);
    engine.poll(1);
    engine.handle_event(&press("b"), 2);
    engine.poll(3);

    assert_eq!(old.get(), 0);
    assert_eq!(new.get(), 1);
}

#[test]
fn test_inert_commands_are_skipped() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(
        vec![
            Command::unbound("no-handler").with_predicate(Predicate::key("a")),
            Command::unbound("no-predicate").with_handler(|_| panic!("inert command ran")),
            Command::new("live", Predicate::key("a"), handler).with_priority(10),
        ],
        None,
    );

    engine.handle_event(&press("a"), 0);
    assert_eq!(engine.poll(1).as_ref().and_then(Resolution::fired), Some("live"));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_state_resets_after_fire() {
    let engine = engine();
    let (_, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], None);

    engine.handle_event(&press("a"), 0);
    engine.poll(1);

    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.next_deadline(), None);
}

#[test]
fn test_next_press_after_fire_is_matched_fresh() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], None);

    for t in [0, 100, 200] {
        engine.handle_event(&press("a"), t);
        engine.poll(t + 1);
        engine.handle_event(&release("a"), t + 20);
    }

    assert_eq!(count.get(), 3);
}

#[test]
fn test_release_predicate() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(
        vec![Command::new("tap", Predicate::released("Shift", Modifiers::NONE), handler)],
        None,
    );

    engine.handle_event(&RawKeyEvent::press("Shift", Modifiers::SHIFT), 0);
    engine.poll(1);
    assert_eq!(count.get(), 0);

    engine.handle_event(&release("Shift"), 80);
    engine.poll(81);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_presence_predicate_uses_history() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("g", Predicate::present("g"), handler)], None);

    engine.handle_event(&RawKeyEvent::press("g", Modifiers::ALT), 0);
    engine.poll(1);

    assert_eq!(count.get(), 1);
}

#[test]
fn test_handler_receives_trigger() {
    let engine = engine();
    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    engine.register_commands(
        vec![Command::new("save", Predicate::chord("s", Modifiers::CTRL), move |e: &KeyEvent| {
            sink.replace(Some(e.clone()));
        })],
        None,
    );

    engine.handle_event(&RawKeyEvent::press("s", Modifiers::CTRL), 42);
    engine.poll(43);

    let event = seen.borrow().clone().expect("handler should run");
    assert_eq!(event.key, "s");
    assert!(event.ctrl_key());
    assert_eq!(event.timestamp, 42);
}

#[test]
fn test_handler_may_reregister() {
    let engine = engine();
    let handle = engine.handle();
    let (second, second_handler) = counter();
    let next = Rc::new(RefCell::new(Some(second_handler)));

    engine.register_commands(
        vec![Command::new("enter-mode", Predicate::key("g"), move |_: &KeyEvent| {
            if let Some(h) = next.borrow_mut().take() {
                handle.register_commands(vec![Command::new("in-mode", Predicate::key("d"), h)], Some("mode"));
            }
        })],
        None,
    );

    engine.handle_event(&press("g"), 0);
    engine.poll(1);
    engine.handle_event(&press("d"), 10);
    engine.poll(11);

    assert_eq!(second.get(), 1);
    assert_eq!(engine.command_count(), 1);
}

#[test]
fn test_handler_may_clear_target() {
    let engine = engine();
    let handle = engine.handle();
    engine.register_commands(
        vec![Command::new("modal", Predicate::key("m"), move |_: &KeyEvent| {
            handle.set_target(None);
        })],
        None,
    );

    engine.handle_event(&press("m"), 0);
    engine.poll(1);

    assert_eq!(engine.target(), None);
}

#[test]
fn test_explicit_batch() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(
        vec![Command::new("chord", Predicate::chord("k", Modifiers::CTRL), handler)],
        None,
    );

    engine.begin_batch();
    engine.handle_event(&RawKeyEvent::press("Control", Modifiers::CTRL), 0);
    engine.handle_event(&RawKeyEvent::press("k", Modifiers::CTRL), 30);
    // No batch deadline while the host holds the batch open
    assert_eq!(engine.poll(100), None);
    engine.inspect(|_, snapshots| assert!(snapshots.is_empty()));

    assert_eq!(engine.flush_batch().fired(), Some("chord"));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_flush_batch_with_nothing_pending() {
    let engine = engine();
    assert_eq!(engine.flush_batch(), Resolution::Empty);
}

#[test]
fn test_event_fires_expired_deadline_first() {
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], None);

    engine.handle_event(&press("a"), 0);
    // No poll; the next event resolves the earlier batch before being recorded
    engine.handle_event(&press("b"), 50);

    assert_eq!(count.get(), 1);
    engine.inspect(|history, _| {
        assert!(history.contains(KeyEventKind::Press, "b"));
        assert!(!history.contains(KeyEventKind::Press, "a"));
    });
}

#[test]
fn test_dispose_detaches_and_cancels() {
    let hub = InputHub::new();
    let engine = engine();
    let (count, handler) = counter();
    engine.register_commands(vec![Command::new("a", Predicate::key("a"), handler)], None);
    engine.attach(&hub);
    assert!(engine.is_attached());
    assert_eq!(hub.listener_count(), 1);

    hub.dispatch(&press("a"), 0);
    engine.dispose();

    assert!(engine.is_disposed());
    assert!(!engine.is_attached());
    assert_eq!(hub.listener_count(), 0);
    assert_eq!(engine.next_deadline(), None);

    hub.poll(100);
    engine.handle_event(&press("a"), 200);
    engine.poll(300);
    assert_eq!(count.get(), 0);

    // Idempotent
    engine.dispose();
}

#[test]
fn test_drop_detaches_from_hub() {
    let hub = InputHub::new();
    {
        let engine = engine();
        engine.attach(&hub);
        assert_eq!(hub.listener_count(), 1);
    }
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn test_handle_outlived_by_engine_is_noop() {
    let engine = engine();
    let handle = engine.handle();
    assert!(handle.is_alive());
    drop(engine);
    assert!(!handle.is_alive());
    handle.deregister_commands();
}

#[test]
fn test_engines_share_a_hub() {
    let hub = InputHub::new();
    let editor = engine();
    let palette = engine();
    let (editor_count, editor_handler) = counter();
    let (palette_count, palette_handler) = counter();
    editor.register_commands(vec![Command::new("e", Predicate::key("Escape"), editor_handler)], None);
    palette.register_commands(vec![Command::new("p", Predicate::key("Escape"), palette_handler)], None);
    editor.attach(&hub);
    palette.attach(&hub);

    hub.dispatch(&press("Escape"), 0);
    hub.poll(1);

    assert_eq!(editor_count.get(), 1);
    assert_eq!(palette_count.get(), 1);

    palette.detach();
    hub.dispatch(&press("Escape"), 10);
    hub.poll(11);
    assert_eq!(editor_count.get(), 2);
    assert_eq!(palette_count.get(), 1);
}

#[test]
fn test_attach_twice_keeps_one_subscription() {
    let hub = InputHub::new();
    let engine = engine();
    engine.attach(&hub);
    engine.attach(&hub);
    assert_eq!(hub.listener_count(), 1);
}

#[test]
fn test_shortcuts_from_yaml_drive_engine() {
    let yaml = r#"
shortcuts:
  - uuid: save
    predicate: "meta+s"
    priority: 1
  - uuid: quit
    predicate:
      key: q
      metaKey: true
"#;
    let defs = parse_shortcuts_yaml(yaml).unwrap();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let commands = defs
        .into_iter()
        .map(|def| {
            let sink = fired.clone();
            let uuid = def.uuid.clone();
            def.into_command(move |_| sink.borrow_mut().push(uuid.clone()))
        })
        .collect();

    let engine = engine();
    engine.register_commands(commands, Some("file"));
    engine.handle_event(&RawKeyEvent::press("Meta", Modifiers::META), 0);
    engine.handle_event(&RawKeyEvent::press("q", Modifiers::META), 0);
    engine.poll(1);

    assert_eq!(*fired.borrow(), vec!["quit".to_string()]);
}

#[test]
fn test_custom_batch_window() {
    let config = EngineConfig::default().with_batch_window(50);
    let engine = Engine::new(&config).with_target(Target::new("test"));
    let (count, handler) = counter();
    engine.register_commands(
        vec![Command::new("chord", Predicate::chord("k", Modifiers::CTRL), handler)],
        None,
    );

    engine.handle_event(&RawKeyEvent::press("Control", Modifiers::CTRL), 0);
    engine.handle_event(&RawKeyEvent::press("k", Modifiers::CTRL), 30);
    engine.poll(79);
    assert_eq!(count.get(), 0);
    engine.poll(80);
    assert_eq!(count.get(), 1);
}
