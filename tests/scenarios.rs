//! End-to-end behavior of running state charts.

use mindchart::builder::{ChartBuilder, StateBuilder, TransitionBuilder};
use mindchart::core::{Chart, Event};
use mindchart::engine::{
    ActionContext, ActionFault, ActionPhase, ActionTable, ConfigurationChange, EngineConfig,
    Fault, GuardTable, Observer, RunStatus, StateChart,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

/// Actions that append their own name to a shared log.
fn logging_actions(names: &[&str]) -> (ActionTable, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut actions = ActionTable::new();
    for &name in names {
        let log = Arc::clone(&log);
        let label = name.to_string();
        actions.insert(name, move |_: &mut ActionContext<'_>| {
            log.lock().unwrap().push(label.clone());
            Ok(())
        });
    }
    (actions, log)
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[derive(Clone, Default)]
struct Journal {
    changes: Arc<Mutex<Vec<ConfigurationChange>>>,
    faults: Arc<Mutex<Vec<Fault>>>,
    dropped: Arc<Mutex<Vec<String>>>,
    finished: Arc<Mutex<usize>>,
}

impl Observer for Journal {
    fn configuration_changed(&mut self, change: &ConfigurationChange) {
        self.changes.lock().unwrap().push(change.clone());
    }

    fn fault(&mut self, fault: &Fault) {
        self.faults.lock().unwrap().push(fault.clone());
    }

    fn event_dropped(&mut self, event: &Event) {
        self.dropped.lock().unwrap().push(event.name().to_string());
    }

    fn finished(&mut self) {
        *self.finished.lock().unwrap() += 1;
    }
}

fn run(chart: Chart, guards: GuardTable, actions: ActionTable) -> (StateChart<GuardTable, ActionTable>, Journal) {
    let journal = Journal::default();
    let mut machine = StateChart::new(Arc::new(chart), guards, actions);
    machine.subscribe(journal.clone());
    machine.start().unwrap();
    (machine, journal)
}

fn two_region_chart() -> StateBuilder {
    StateBuilder::parallel("P")
        .state(
            StateBuilder::new("region1")
                .state(StateBuilder::new("x1").transition(TransitionBuilder::on("e").to("x2")))
                .state(StateBuilder::new("x2")),
        )
        .state(
            StateBuilder::new("region2")
                .state(StateBuilder::new("y1").transition(TransitionBuilder::on("e").to("y2")))
                .state(StateBuilder::new("y2")),
        )
}

#[test]
fn compound_transition_exits_before_entering() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::new("S")
                .state(
                    StateBuilder::new("a")
                        .on_exit("leave_a")
                        .transition(TransitionBuilder::on("eventX").to("b")),
                )
                .state(StateBuilder::new("b").on_entry("enter_b")),
        )
        .build()
        .unwrap();
    let (actions, log) = logging_actions(&["leave_a", "enter_b"]);
    let (mut machine, _) = run(chart, GuardTable::new(), actions);
    assert_eq!(machine.active_state_names(), vec!["S", "a"]);

    machine.submit("eventX").unwrap();

    assert_eq!(machine.active_state_names(), vec!["S", "b"]);
    assert_eq!(entries(&log), vec!["leave_a", "enter_b"]);
}

#[test]
fn parallel_regions_fire_in_one_microstep() {
    let chart = ChartBuilder::new("machine")
        .state(two_region_chart())
        .build()
        .unwrap();
    let (mut machine, journal) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("e").unwrap();

    assert_eq!(machine.active_leaf_names(), vec!["x2", "y2"]);
    assert_eq!(
        machine.active_state_names(),
        vec!["P", "region1", "x2", "region2", "y2"]
    );
    let changes = journal.changes.lock().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].exited, vec!["y1", "x1"]);
    assert_eq!(changes[1].entered, vec!["x2", "y2"]);
    assert_eq!(changes[1].event.as_deref(), Some("e"));
}

#[test]
fn unmatched_event_is_dropped() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::new("S")
                .state(StateBuilder::new("a").transition(TransitionBuilder::on("eventX").to("b")))
                .state(StateBuilder::new("b")),
        )
        .build()
        .unwrap();
    let (mut machine, journal) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("foo").unwrap();

    assert_eq!(machine.active_state_names(), vec!["S", "a"]);
    assert_eq!(*journal.dropped.lock().unwrap(), vec!["foo"]);
    assert_eq!(journal.changes.lock().unwrap().len(), 1);
}

#[test]
fn earlier_source_wins_at_equal_depth() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::parallel("P")
                .state(
                    StateBuilder::new("r1")
                        .state(StateBuilder::new("x1").transition(TransitionBuilder::on("e").to("Z"))),
                )
                .state(
                    StateBuilder::new("r2")
                        .state(StateBuilder::new("y1").transition(TransitionBuilder::on("e").to("W"))),
                ),
        )
        .state(StateBuilder::new("Z"))
        .state(StateBuilder::new("W"))
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("e").unwrap();

    assert_eq!(machine.active_state_names(), vec!["Z"]);
}

#[test]
fn ancestor_transition_preempts_descendant() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::new("S")
                .transition(TransitionBuilder::on("e").to("T"))
                .state(StateBuilder::new("a").transition(TransitionBuilder::on("e").to("b")))
                .state(StateBuilder::new("b")),
        )
        .state(StateBuilder::new("T"))
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("e").unwrap();

    assert_eq!(machine.active_state_names(), vec!["T"]);
}

fn history_chart(deep: bool) -> Chart {
    let history = if deep {
        StateBuilder::deep_history("h")
    } else {
        StateBuilder::shallow_history("h")
    };
    ChartBuilder::new("machine")
        .state(
            StateBuilder::new("S")
                .transition(TransitionBuilder::on("leave").to("out"))
                .state(history)
                .state(
                    StateBuilder::new("A")
                        .state(StateBuilder::new("a1").transition(TransitionBuilder::on("next").to("a2")))
                        .state(StateBuilder::new("a2")),
                )
                .state(StateBuilder::new("B")),
        )
        .state(StateBuilder::new("out").transition(TransitionBuilder::on("back").to("h")))
        .build()
        .unwrap()
}

#[test]
fn shallow_history_restores_only_immediate_children() {
    let (mut machine, _) = run(history_chart(false), GuardTable::new(), ActionTable::new());
    machine.submit("next").unwrap();
    machine.submit("leave").unwrap();
    machine.submit("back").unwrap();

    assert_eq!(machine.active_state_names(), vec!["S", "A", "a1"]);
}

#[test]
fn deep_history_restores_nested_configuration() {
    let (mut machine, _) = run(history_chart(true), GuardTable::new(), ActionTable::new());
    machine.submit("next").unwrap();
    machine.submit("leave").unwrap();
    machine.submit("back").unwrap();

    assert_eq!(machine.active_state_names(), vec!["S", "A", "a2"]);
}

#[test]
fn history_without_record_enters_parent_default() {
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("out").transition(TransitionBuilder::on("in").to("h")))
        .state(
            StateBuilder::new("S")
                .state(StateBuilder::shallow_history("h"))
                .state(StateBuilder::new("first"))
                .state(StateBuilder::new("second")),
        )
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), ActionTable::new());
    machine.submit("in").unwrap();
    assert_eq!(machine.active_state_names(), vec!["S", "first"]);
}

#[test]
fn internal_events_drain_before_external_ones() {
    let actions = ActionTable::new().with("announce", |ctx| {
        ctx.raise("ping");
        Ok(())
    });
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("a").transition(TransitionBuilder::on("go").to("b")))
        .state(
            StateBuilder::new("b")
                .on_entry("announce")
                .transition(TransitionBuilder::on("next").to("wrong"))
                .transition(TransitionBuilder::on("ping").to("c")),
        )
        .state(StateBuilder::new("c").transition(TransitionBuilder::on("next").to("d")))
        .state(StateBuilder::new("d"))
        .state(StateBuilder::new("wrong"))
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), actions);

    let sender = machine.sender();
    sender.submit("go").unwrap();
    sender.submit("next").unwrap();
    machine.process_pending().unwrap();

    assert_eq!(machine.active_state_names(), vec!["d"]);
}

#[test]
fn eventless_transitions_run_before_the_next_event() {
    let ready = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ready);
    let guards = GuardTable::new().with("ready", move |_| flag.load(Ordering::SeqCst));
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("a").transition(TransitionBuilder::on("go").to("b")))
        .state(StateBuilder::new("b").transition(TransitionBuilder::eventless().when("ready").to("c")))
        .state(StateBuilder::new("c"))
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, guards, ActionTable::new());

    machine.submit("go").unwrap();
    assert_eq!(machine.active_state_names(), vec!["b"]);

    ready.store(true, Ordering::SeqCst);
    machine.submit("poke").unwrap();
    assert_eq!(machine.active_state_names(), vec!["c"]);
}

#[test]
fn guards_see_event_payloads() {
    let guards = GuardTable::new().with("big", |ctx| {
        ctx.payload()
            .and_then(|p| p.get("amount"))
            .and_then(|a| a.as_i64())
            .is_some_and(|a| a > 10)
    });
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("idle").transition(TransitionBuilder::on("deposit").when("big").to("rich")))
        .state(StateBuilder::new("rich"))
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, guards, ActionTable::new());

    machine
        .submit_event(Event::external("deposit").with_payload(json!({ "amount": 5 })))
        .unwrap();
    assert!(machine.is_active("idle"));
    machine
        .submit_event(Event::external("deposit").with_payload(json!({ "amount": 50 })))
        .unwrap();
    assert!(machine.is_active("rich"));
}

fn faulty_guard_chart() -> Chart {
    ChartBuilder::new("machine")
        .state(
            StateBuilder::new("a")
                .transition(TransitionBuilder::on("go").when("missing").to("b"))
                .transition(TransitionBuilder::on("error").to("failed")),
        )
        .state(StateBuilder::new("b"))
        .state(StateBuilder::new("failed"))
        .build()
        .unwrap()
}

#[test]
fn guard_fault_is_false_and_raises_error_event() {
    let (mut machine, journal) = run(faulty_guard_chart(), GuardTable::new(), ActionTable::new());

    machine.submit("go").unwrap();

    assert_eq!(machine.active_state_names(), vec!["failed"]);
    let faults = journal.faults.lock().unwrap();
    assert!(matches!(&faults[..], [Fault::Guard { state, .. }] if state == "a"));
}

#[test]
fn guard_fault_without_error_events_leaves_configuration() {
    let journal = Journal::default();
    let mut machine = StateChart::new(
        Arc::new(faulty_guard_chart()),
        GuardTable::new(),
        ActionTable::new(),
    )
    .with_config(EngineConfig::new().with_error_events(false));
    machine.subscribe(journal.clone());
    machine.start().unwrap();

    machine.submit("go").unwrap();

    assert_eq!(machine.active_state_names(), vec!["a"]);
    assert_eq!(journal.faults.lock().unwrap().len(), 1);
    assert_eq!(*journal.dropped.lock().unwrap(), vec!["go"]);
}

#[test]
fn action_fault_keeps_the_microstep_going() {
    let (mut actions, log) = logging_actions(&["enter_b"]);
    actions.insert("explode", |_: &mut ActionContext<'_>| {
        Err(ActionFault::Failed("boom".to_string()))
    });
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("a").transition(TransitionBuilder::on("go").to("b").action("explode")))
        .state(StateBuilder::new("b").on_entry("enter_b"))
        .build()
        .unwrap();
    let (mut machine, journal) = run(chart, GuardTable::new(), actions);

    machine.submit("go").unwrap();

    assert_eq!(machine.active_state_names(), vec!["b"]);
    assert_eq!(entries(&log), vec!["enter_b"]);
    assert!(machine.configuration().validate(machine.chart()).is_ok());
    let faults = journal.faults.lock().unwrap();
    assert!(matches!(
        &faults[..],
        [Fault::Action { phase: ActionPhase::Transition, .. }]
    ));
    // the raised error.execution matched nothing
    assert_eq!(*journal.dropped.lock().unwrap(), vec!["error.execution"]);
}

#[test]
fn done_event_leads_to_top_level_final() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::new("job")
                .transition(TransitionBuilder::on("done.state.job").to("complete"))
                .state(StateBuilder::new("working").transition(TransitionBuilder::on("ok").to("finished")))
                .state(StateBuilder::final_state("finished")),
        )
        .state(StateBuilder::final_state("complete"))
        .build()
        .unwrap();
    let (mut machine, journal) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("ok").unwrap();

    assert_eq!(machine.status(), RunStatus::Final);
    assert_eq!(machine.active_state_names(), vec!["complete"]);
    assert_eq!(*journal.finished.lock().unwrap(), 1);

    machine.submit("ok").unwrap();
    assert_eq!(machine.active_state_names(), vec!["complete"]);

    machine.stop().unwrap();
    assert_eq!(machine.status(), RunStatus::Idle);
}

#[test]
fn parallel_completes_when_every_region_is_final() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::parallel("P")
                .transition(TransitionBuilder::on("done.state.P").to("end"))
                .state(
                    StateBuilder::new("r1")
                        .state(StateBuilder::new("x").transition(TransitionBuilder::on("fx").to("xf")))
                        .state(StateBuilder::final_state("xf")),
                )
                .state(
                    StateBuilder::new("r2")
                        .state(StateBuilder::new("y").transition(TransitionBuilder::on("fy").to("yf")))
                        .state(StateBuilder::final_state("yf")),
                ),
        )
        .state(StateBuilder::final_state("end"))
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("fx").unwrap();
    assert!(machine.is_active("xf"));
    assert_eq!(machine.status(), RunStatus::AwaitingExternal);

    machine.submit("fy").unwrap();
    assert_eq!(machine.status(), RunStatus::Final);
    assert_eq!(machine.active_state_names(), vec!["end"]);
}

#[test]
fn parallel_root_finishes_with_all_regions() {
    let chart = ChartBuilder::parallel("machine")
        .state(
            StateBuilder::new("left")
                .state(StateBuilder::new("l").transition(TransitionBuilder::on("a").to("lf")))
                .state(StateBuilder::final_state("lf")),
        )
        .state(
            StateBuilder::new("right")
                .state(StateBuilder::new("r").transition(TransitionBuilder::on("b").to("rf")))
                .state(StateBuilder::final_state("rf")),
        )
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), ActionTable::new());
    assert_eq!(machine.active_leaf_names(), vec!["l", "r"]);

    machine.submit("a").unwrap();
    assert_eq!(machine.status(), RunStatus::AwaitingExternal);
    machine.submit("b").unwrap();
    assert_eq!(machine.status(), RunStatus::Final);
}

#[test]
fn stop_exits_everything_and_restart_forgets_history() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::new("S")
                .on_exit("exit_S")
                .transition(TransitionBuilder::on("leave").to("out"))
                .state(StateBuilder::deep_history("h"))
                .state(StateBuilder::new("a").on_exit("exit_a")),
        )
        .state(StateBuilder::new("out").on_exit("exit_out").transition(TransitionBuilder::on("back").to("h")))
        .build()
        .unwrap();
    let (actions, log) = logging_actions(&["exit_S", "exit_a", "exit_out"]);
    let (mut machine, _) = run(chart, GuardTable::new(), actions);

    machine.submit("leave").unwrap();
    assert_eq!(machine.history().len(), 1);
    machine.submit("back").unwrap();
    log.lock().unwrap().clear();

    machine.stop().unwrap();
    assert!(machine.active_state_names().is_empty());
    assert_eq!(entries(&log), vec!["exit_a", "exit_S"]);

    machine.start().unwrap();
    assert!(machine.history().is_empty());
    assert_eq!(machine.active_state_names(), vec!["S", "a"]);
}

#[test]
fn state_watchers_follow_activation() {
    let chart = ChartBuilder::new("toggle")
        .state(StateBuilder::new("off").transition(TransitionBuilder::on("flip").to("on")))
        .state(StateBuilder::new("on").transition(TransitionBuilder::on("flip").to("off")))
        .build()
        .unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut machine = StateChart::new(Arc::new(chart), GuardTable::new(), ActionTable::new());
    let watch = machine
        .on_state_active("on", move |active| sink.lock().unwrap().push(active))
        .unwrap();

    machine.start().unwrap();
    machine.submit("flip").unwrap();
    machine.submit("flip").unwrap();
    machine.submit("flip").unwrap();
    machine.stop().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![true, false, true, false]);

    assert!(machine.unsubscribe(watch));
    machine.start().unwrap();
    machine.submit("flip").unwrap();
    assert_eq!(seen.lock().unwrap().len(), 4);
}

#[test]
fn internal_transition_keeps_its_source_active() {
    let chart = ChartBuilder::new("machine")
        .state(
            StateBuilder::new("S")
                .on_entry("enter_S")
                .on_exit("exit_S")
                .transition(TransitionBuilder::on("inner").to("b").internal())
                .transition(TransitionBuilder::on("outer").to("a"))
                .state(StateBuilder::new("a"))
                .state(StateBuilder::new("b")),
        )
        .build()
        .unwrap();
    let (actions, log) = logging_actions(&["enter_S", "exit_S"]);
    let (mut machine, _) = run(chart, GuardTable::new(), actions);
    log.lock().unwrap().clear();

    machine.submit("inner").unwrap();
    assert_eq!(machine.active_state_names(), vec!["S", "b"]);
    assert!(entries(&log).is_empty());

    machine.submit("outer").unwrap();
    assert_eq!(machine.active_state_names(), vec!["S", "a"]);
    assert_eq!(entries(&log), vec!["exit_S", "enter_S"]);
}

#[test]
fn targetless_transition_only_runs_actions() {
    let (actions, log) = logging_actions(&["count"]);
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("a").transition(TransitionBuilder::on("tick").action("count")))
        .build()
        .unwrap();
    let (mut machine, journal) = run(chart, GuardTable::new(), actions);

    machine.submit("tick").unwrap();
    machine.submit("tick").unwrap();

    assert_eq!(machine.active_state_names(), vec!["a"]);
    assert_eq!(entries(&log), vec!["count", "count"]);
    assert_eq!(journal.changes.lock().unwrap().len(), 1);
}

#[test]
fn descriptors_match_dotted_prefixes() {
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("a").transition(TransitionBuilder::on("error").to("b")))
        .state(StateBuilder::new("b"))
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("errors").unwrap();
    assert!(machine.is_active("a"));
    machine.submit("error.io.disk").unwrap();
    assert!(machine.is_active("b"));
}

#[test]
fn multi_target_transition_enters_each_region() {
    let chart = ChartBuilder::new("machine")
        .state(StateBuilder::new("idle").transition(TransitionBuilder::on("go").to("x2").to("y2")))
        .state(two_region_chart())
        .build()
        .unwrap();
    let (mut machine, _) = run(chart, GuardTable::new(), ActionTable::new());

    machine.submit("go").unwrap();

    assert_eq!(
        machine.active_state_names(),
        vec!["P", "region1", "x2", "region2", "y2"]
    );
}

#[test]
fn initial_actions_run_before_entering_children() {
    let chart = ChartBuilder::new("machine")
        .initial("b")
        .initial_action("boot")
        .state(StateBuilder::new("a").on_entry("enter_a"))
        .state(StateBuilder::new("b").on_entry("enter_b"))
        .build()
        .unwrap();
    let (actions, log) = logging_actions(&["boot", "enter_a", "enter_b"]);
    let (machine, _) = run(chart, GuardTable::new(), actions);

    assert_eq!(machine.active_state_names(), vec!["b"]);
    assert_eq!(entries(&log), vec!["boot", "enter_b"]);
}

#[test]
fn observation_is_idempotent() {
    let (machine, _) = run(history_chart(true), GuardTable::new(), ActionTable::new());
    let first = machine.active_state_names();
    let second = machine.active_state_names();
    assert_eq!(first, second);
    assert_eq!(
        machine.state_names(),
        vec!["S", "h", "A", "a1", "a2", "B", "out"]
    );
}
