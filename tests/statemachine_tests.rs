//! End-to-end tests driving complete machines through their lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stillwater::prelude::*;
use tickfsm::{
    Action, ActionBehavior, ActionFault, CmpOp, Condition, ConditionBehavior, ConfigError, Fsm, FsmConfig,
    FsmError, MachineContext, MachineStatus, State, StateChangeRecord, TraceMode, Transition,
    UpdateOutcome, Variable,
};

fn flag_setter(flag: &Variable) -> Action {
    Action::set_true(flag).unwrap()
}

fn faulting(message: &'static str) -> Action {
    Action::try_lambda(move |_| Err(ActionFault::new(message)))
}

#[derive(Default, Clone)]
struct HookCounts {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    enters: Arc<AtomicUsize>,
    exits: Arc<AtomicUsize>,
}

impl HookCounts {
    fn snapshot(&self) -> [usize; 4] {
        [
            self.starts.load(Ordering::SeqCst),
            self.stops.load(Ordering::SeqCst),
            self.enters.load(Ordering::SeqCst),
            self.exits.load(Ordering::SeqCst),
        ]
    }
}

struct CountingCondition {
    counts: HookCounts,
    satisfied: bool,
}

impl ConditionBehavior for CountingCondition {
    fn is_satisfied(&self, _ctx: &MachineContext<'_>) -> bool {
        self.satisfied
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }

    fn on_start(&self, _ctx: &MachineContext<'_>) {
        self.counts.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stop(&self, _ctx: &MachineContext<'_>) {
        self.counts.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn on_enter_state(&self, _ctx: &MachineContext<'_>) {
        self.counts.enters.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exit_state(&self, _ctx: &MachineContext<'_>) {
        self.counts.exits.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingAction {
    counts: HookCounts,
    runs: Arc<AtomicUsize>,
}

#[async_trait::async_trait(?Send)]
impl ActionBehavior for CountingAction {
    async fn execute(&self, _ctx: &MachineContext<'_>) -> Result<(), ActionFault> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }

    fn on_start(&self, _ctx: &MachineContext<'_>) {
        self.counts.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stop(&self, _ctx: &MachineContext<'_>) {
        self.counts.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn on_enter_state(&self, _ctx: &MachineContext<'_>) {
        self.counts.enters.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exit_state(&self, _ctx: &MachineContext<'_>) {
        self.counts.exits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Collects formatted trace output so tests can assert on it.
#[derive(Clone, Default)]
struct TraceBuffer(Arc<Mutex<Vec<u8>>>);

impl TraceBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl std::io::Write for TraceBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_traces(buffer: &TraceBuffer) -> tracing::subscriber::DefaultGuard {
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("tickfsm=debug")
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

#[test]
fn start_enters_first_registered_state() {
    let states = State::many(["Idle", "Busy", "Done"]);
    states[0].add_transition().unwrap().to_state(&states[1]).unwrap();
    states[1].add_transition().unwrap().to_state(&states[2]).unwrap();
    let first = states[0].clone();
    let mut fsm = Fsm::new("worker").with_states(states);

    fsm.start().unwrap();

    assert!(fsm.is_running());
    assert_eq!(fsm.active_state(), Some(&first));
}

#[test]
fn blank_machine_name_fails_start() {
    for name in ["", "   "] {
        let mut fsm = Fsm::new(name).with_state_names(["A"]);

        let error = fsm.start().unwrap_err();

        assert!(error.is_configuration_error());
        assert!(error.violations().contains(&&ConfigError::EmptyMachineName));
        assert_eq!(fsm.status(), MachineStatus::Unstarted);
        assert!(fsm.active_state().is_none());
    }
}

#[test]
fn blank_state_name_fails_start() {
    let mut fsm = Fsm::new("m").with_state_names(["A", ""]);

    let error = fsm.start().unwrap_err();

    assert_eq!(
        error.violations(),
        vec![&ConfigError::EmptyStateName {
            machine: "m".to_string(),
            index: 1
        }]
    );
}

#[tokio::test]
async fn update_requires_a_running_machine() {
    let states = State::many(["A", "B"]);
    states[0]
        .add_transition()
        .unwrap()
        .with_conditions([Condition::lambda(|_| false)])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);

    let before = fsm.update().await.unwrap_err();
    assert!(matches!(
        before,
        FsmError::Config(ConfigError::NotRunning {
            status: MachineStatus::Unstarted,
            ..
        })
    ));

    fsm.start().unwrap();
    assert!(fsm.update().await.is_ok());

    fsm.stop().unwrap();
    let after = fsm.update().await.unwrap_err();
    assert!(matches!(
        after,
        FsmError::Config(ConfigError::NotRunning {
            status: MachineStatus::Stopped,
            ..
        })
    ));
}

#[test]
fn unregistered_goto_state_fails_start() {
    let start = State::new("Start");
    let outside = State::new("Outside");
    start.add_named_transition("escape").unwrap().to_state(&outside).unwrap();
    let mut fsm = Fsm::new("m").with_states([start]);

    let error = fsm.start().unwrap_err();

    assert_eq!(
        error.violations(),
        vec![&ConfigError::UnregisteredGotoState {
            state: "Start".to_string(),
            transition: "Transition(escape)".to_string(),
            target: "Outside".to_string(),
        }]
    );
    assert_eq!(fsm.status(), MachineStatus::Unstarted);
}

#[tokio::test]
async fn start_to_end_sets_flag_and_stops() {
    let flag = Variable::named("flag", false);
    let states = State::many(["START", "END"]);
    states[0]
        .add_transition()
        .unwrap()
        .with_actions([flag_setter(&flag)])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("e2e").with_states(states);

    fsm.start().unwrap();
    let outcome = fsm.update().await.unwrap();

    assert!(outcome.changed().is_some());
    assert_eq!(fsm.active_state().map(State::name), Some("END"));
    assert!(fsm.is_stopped());
    assert_eq!(flag.as_bool(), Some(true));
}

#[tokio::test]
async fn observers_see_previous_and_new_state_in_order() {
    let states = State::many(["A", "B"]);
    states[0]
        .add_named_transition("go")
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    for observer in ["first", "second"] {
        let log = Arc::clone(&log);
        fsm.on_state_change(move |change| {
            log.lock().unwrap().push(format!(
                "{observer}: {} -> {} via {:?}",
                change.previous,
                change.active,
                change.transition
            ));
        });
    }

    fsm.start().unwrap();
    fsm.update().await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "first: A -> B via Some(\"go\")".to_string(),
            "second: A -> B via Some(\"go\")".to_string(),
        ]
    );
}

#[tokio::test]
async fn or_condition_gates_the_action() {
    let table = [
        (false, false, false),
        (true, false, true),
        (false, true, true),
        (true, true, true),
    ];

    for (c1, c2, expected) in table {
        let fired = Variable::boolean(false);
        let state = State::new("S");
        state
            .add_transition()
            .unwrap()
            .with_conditions([Condition::or([
                Condition::lambda(move |_| c1),
                Condition::lambda(move |_| c2),
            ])
            .unwrap()])
            .unwrap()
            .with_actions([flag_setter(&fired)])
            .unwrap();
        let mut fsm = Fsm::new("or").with_states([state]);

        fsm.start().unwrap();
        let outcome = fsm.update().await.unwrap();

        assert_eq!(fired.as_bool(), Some(expected), "OR({c1}, {c2})");
        assert_eq!(outcome.fired(), expected);
    }
}

#[tokio::test]
async fn fault_with_error_state_is_absorbed() {
    let states = State::many(["Run", "Error"]);
    states[0]
        .add_named_transition("explode")
        .unwrap()
        .with_actions([faulting("kaboom")])
        .unwrap()
        .to_error_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    fsm.start().unwrap();

    let outcome = fsm.update().await.unwrap();

    let change = outcome.changed().unwrap();
    assert!(change.via_error_path);
    assert_eq!(change.active.name(), "Error");
    assert_eq!(fsm.active_state().map(State::name), Some("Error"));
    assert!(fsm.history().records()[0].via_error_path);
}

#[tokio::test]
async fn fault_without_error_path_propagates() {
    let after = Variable::boolean(false);
    let states = State::many(["Run", "Next"]);
    states[0]
        .add_named_transition("explode")
        .unwrap()
        .with_actions([faulting("kaboom"), flag_setter(&after)])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    fsm.start().unwrap();

    let error = fsm.update().await.unwrap_err();

    assert!(!error.is_configuration_error());
    assert_eq!(error.action_fault().map(ActionFault::message), Some("kaboom"));
    assert!(matches!(
        &error,
        FsmError::Action { state, transition, .. } if state == "Run" && transition == "explode"
    ));
    assert_eq!(fsm.active_state().map(State::name), Some("Run"));
    assert_eq!(after.as_bool(), Some(false));
    assert!(fsm.is_running());
    assert!(fsm.history().is_empty());
}

#[tokio::test]
async fn error_actions_are_best_effort() {
    let cleaned = Variable::boolean(false);
    let states = State::many(["Run", "Error"]);
    states[0]
        .add_transition()
        .unwrap()
        .with_actions([faulting("primary")])
        .unwrap()
        .with_error_actions([faulting("cleanup failed"), flag_setter(&cleaned)])
        .unwrap()
        .to_error_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    fsm.start().unwrap();

    fsm.update().await.unwrap();

    assert_eq!(cleaned.as_bool(), Some(true));
    assert_eq!(fsm.active_state().map(State::name), Some("Error"));
}

#[tokio::test]
async fn error_actions_without_error_state_stay_put() {
    let cleaned = Variable::boolean(false);
    let state = State::new("Run");
    state
        .add_named_transition("retry")
        .unwrap()
        .with_actions([faulting("flaky")])
        .unwrap()
        .with_error_actions([flag_setter(&cleaned)])
        .unwrap();
    let config = FsmConfig::new().stop_on_terminal_state(false);
    let mut fsm = Fsm::with_config("m", config).with_states([state]);
    fsm.start().unwrap();

    let outcome = fsm.update().await.unwrap();

    assert!(matches!(
        outcome,
        UpdateOutcome::Stayed {
            recovered: true,
            ..
        }
    ));
    assert_eq!(cleaned.as_bool(), Some(true));
    assert_eq!(fsm.active_state().map(State::name), Some("Run"));
}

#[tokio::test]
async fn first_satisfied_transition_wins() {
    let second_ran = Variable::boolean(false);
    let third_ran = Variable::boolean(false);
    let states = State::many(["A", "B", "C"]);
    states[0]
        .add_named_transition("blocked")
        .unwrap()
        .with_conditions([Condition::lambda(|_| false)])
        .unwrap()
        .to_state(&states[2])
        .unwrap();
    states[0]
        .add_named_transition("open")
        .unwrap()
        .with_actions([flag_setter(&second_ran)])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    states[0]
        .add_named_transition("also open")
        .unwrap()
        .with_actions([flag_setter(&third_ran)])
        .unwrap()
        .to_state(&states[2])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    fsm.start().unwrap();

    fsm.update().await.unwrap();

    assert_eq!(fsm.active_state().map(State::name), Some("B"));
    assert_eq!(second_ran.as_bool(), Some(true));
    assert_eq!(third_ran.as_bool(), Some(false));
}

#[tokio::test]
async fn self_transition_runs_actions_without_notifying() {
    let ticks = Variable::named("ticks", 0);
    let state = State::new("Loop");
    state
        .add_transition()
        .unwrap()
        .with_actions([Action::add(&ticks, 1).unwrap()])
        .unwrap();
    let notified = Arc::new(AtomicUsize::new(0));
    let mut fsm = Fsm::new("m").with_states([state]);
    let counter = Arc::clone(&notified);
    fsm.on_state_change(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    fsm.start().unwrap();

    for _ in 0..3 {
        fsm.update().await.unwrap();
    }

    assert_eq!(ticks.as_int(), Some(3));
    assert_eq!(notified.load(Ordering::SeqCst), 0);
    assert_eq!(fsm.active_state().map(State::name), Some("Loop"));
}

#[tokio::test]
async fn suspending_actions_complete_in_order() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let step = |name: &'static str| {
        let log = Arc::clone(&log);
        Action::suspending(move |_| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name}: begin"));
                tokio::task::yield_now().await;
                log.lock().unwrap().push(format!("{name}: end"));
                Ok(())
            }
        })
    };
    let sync_log = Arc::clone(&log);
    let states = State::many(["A", "B"]);
    states[0]
        .add_transition()
        .unwrap()
        .with_actions([
            step("one"),
            Action::lambda(move |_| sync_log.lock().unwrap().push("sync".to_string())),
            step("two"),
        ])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    fsm.start().unwrap();

    fsm.update().await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["one: begin", "one: end", "sync", "two: begin", "two: end"]
    );
}

#[tokio::test]
async fn stillwater_effects_run_as_actions() {
    let states = State::many(["A", "B", "Failed"]);
    states[0]
        .add_transition()
        .unwrap()
        .with_actions([Action::effect(|| pure(()).boxed())])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    states[1]
        .add_transition()
        .unwrap()
        .with_actions([Action::effect(|| {
            fail(ActionFault::new("effect failed")).boxed()
        })])
        .unwrap()
        .to_error_state(&states[2])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    fsm.start().unwrap();

    fsm.update().await.unwrap();
    assert_eq!(fsm.active_state().map(State::name), Some("B"));

    fsm.update().await.unwrap();
    assert_eq!(fsm.active_state().map(State::name), Some("Failed"));
}

#[tokio::test]
async fn lifecycle_hooks_reach_conditions() {
    let counts = HookCounts::default();
    let states = State::many(["A", "B"]);
    states[0]
        .add_transition()
        .unwrap()
        .with_conditions([Condition::not(Condition::not(Condition::custom(CountingCondition {
            counts: counts.clone(),
            satisfied: true,
        })))])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    states[1]
        .add_transition()
        .unwrap()
        .with_conditions([Condition::lambda(|_| false)])
        .unwrap()
        .to_state(&states[0])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);

    fsm.start().unwrap();
    assert_eq!(counts.snapshot(), [1, 0, 1, 0]);

    fsm.update().await.unwrap();
    assert_eq!(counts.snapshot(), [1, 0, 1, 1]);

    fsm.stop().unwrap();
    assert_eq!(counts.snapshot(), [1, 1, 1, 1]);
}

#[test]
fn shared_transition_starts_once() {
    let counts = HookCounts::default();
    let states = State::many(["A", "B"]);
    let shared = Transition::named("shared");
    shared
        .with_conditions([Condition::custom(CountingCondition {
            counts: counts.clone(),
            satisfied: false,
        })])
        .unwrap()
        .add_to_states(&states)
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);

    fsm.start().unwrap();
    fsm.stop().unwrap();

    assert_eq!(counts.snapshot(), [1, 1, 1, 0]);
}

#[tokio::test]
async fn lifecycle_hooks_reach_actions_and_error_actions() {
    let counts = HookCounts::default();
    let runs = Arc::new(AtomicUsize::new(0));
    let counting = || {
        Action::custom(CountingAction {
            counts: counts.clone(),
            runs: Arc::clone(&runs),
        })
    };
    let states = State::many(["A", "B"]);
    states[0]
        .add_transition()
        .unwrap()
        .with_actions([counting()])
        .unwrap()
        .with_error_actions([counting()])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    states[1]
        .add_transition()
        .unwrap()
        .with_conditions([Condition::lambda(|_| false)])
        .unwrap()
        .to_state(&states[0])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);

    fsm.start().unwrap();
    assert_eq!(counts.snapshot(), [2, 0, 2, 0]);

    let outcome = fsm.update().await.unwrap();
    assert!(outcome.changed().is_some());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(counts.snapshot(), [2, 0, 2, 2]);

    fsm.stop().unwrap();
    assert_eq!(counts.snapshot(), [2, 2, 2, 2]);
}

#[tokio::test]
async fn restart_after_stop_begins_at_first_state() {
    let states = State::many(["A", "B"]);
    states[0].add_transition().unwrap().to_state(&states[1]).unwrap();
    states[1]
        .add_transition()
        .unwrap()
        .with_conditions([Condition::lambda(|_| false)])
        .unwrap()
        .to_state(&states[0])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);

    fsm.start().unwrap();
    assert!(matches!(
        fsm.start().unwrap_err(),
        FsmError::Config(ConfigError::AlreadyRunning { .. })
    ));
    fsm.update().await.unwrap();
    assert_eq!(fsm.active_state().map(State::name), Some("B"));

    fsm.stop().unwrap();
    fsm.start().unwrap();

    assert!(fsm.is_running());
    assert_eq!(fsm.active_state().map(State::name), Some("A"));
}

#[test]
fn topology_is_sealed_after_start() {
    let states = State::many(["A", "B"]);
    let open = states[0].add_transition().unwrap();
    open.to_state(&states[1]).unwrap();
    let config = FsmConfig::new().stop_on_terminal_state(false);
    let mut fsm = Fsm::with_config("m", config).with_states(states);

    fsm.start().unwrap();

    let a = fsm.state("A").unwrap();
    assert!(matches!(
        a.add_transition(),
        Err(ConfigError::TopologySealed { .. })
    ));
    assert!(matches!(
        open.with_actions([Action::lambda(|_| {})]),
        Err(ConfigError::TopologySealed { .. })
    ));
}

#[tokio::test]
async fn variable_counter_drives_transition() {
    let count = Variable::named("count", 0);
    let states = State::many(["Counting", "Done"]);
    states[0]
        .add_named_transition("finish")
        .unwrap()
        .with_conditions([Condition::compare(&count, CmpOp::Ge, 3).unwrap()])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    states[0]
        .add_named_transition("count")
        .unwrap()
        .with_actions([Action::add(&count, 1).unwrap()])
        .unwrap();
    let mut fsm = Fsm::new("counter").with_states(states);
    fsm.start().unwrap();

    let mut ticks = 0;
    while fsm.is_running() {
        fsm.update().await.unwrap();
        ticks += 1;
    }

    assert_eq!(ticks, 4);
    assert_eq!(count.as_int(), Some(3));
    assert_eq!(fsm.active_state().map(State::name), Some("Done"));
}

#[tokio::test]
async fn state_logging_flag_controls_condition_traces() {
    let buffer = TraceBuffer::default();
    let _guard = capture_traces(&buffer);

    let speed = Variable::named("speed", 0.5);
    let states = State::many(["Walk", "Run"]);
    states[0].set_logging(true);
    states[0]
        .add_named_transition("accelerate")
        .unwrap()
        .with_conditions([
            Condition::named(
                "fast enough",
                [Condition::is_greater_or_equal(&speed, 1).unwrap()],
            )
            .unwrap(),
        ])
        .unwrap()
        .with_actions([Action::lambda(|_| {}).labeled("sprint")])
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    states[1]
        .add_named_transition("slow down")
        .unwrap()
        .with_conditions([
            Condition::named(
                "slow enough",
                [Condition::compare(&speed, CmpOp::Lt, 1.0).unwrap()],
            )
            .unwrap(),
        ])
        .unwrap()
        .to_state(&states[0])
        .unwrap();
    let config = FsmConfig::new().trace_mode(TraceMode::EvaluateAll);
    let mut fsm = Fsm::with_config("runner", config).with_states(states);
    fsm.start().unwrap();

    assert!(!fsm.update().await.unwrap().fired());
    let idle = buffer.contents();
    assert!(idle.contains("condition fast enough"));
    assert!(idle.contains("satisfied=false"));
    assert!(idle.contains("DEBUG"));

    speed.set(1.5).unwrap();
    assert!(fsm.update().await.unwrap().fired());
    let fired = buffer.contents();
    assert!(fired.contains("satisfied=true"));
    assert!(fired.contains("execute sprint"));
    assert_eq!(fsm.active_state().map(State::name), Some("Run"));

    buffer.clear();
    assert!(!fsm.update().await.unwrap().fired());
    let quiet = buffer.contents();
    assert!(!quiet.contains("slow enough"));
    assert!(!quiet.contains("satisfied="));
    assert_eq!(fsm.active_state().map(State::name), Some("Run"));
}

#[tokio::test]
async fn absorbed_fault_is_logged_as_warning() {
    let buffer = TraceBuffer::default();
    let _guard = capture_traces(&buffer);

    let states = State::many(["Risky", "Safe"]);
    states[0]
        .add_named_transition("gamble")
        .unwrap()
        .with_actions([faulting("dice fell off the table")])
        .unwrap()
        .with_error_actions([faulting("cleanup broke too")])
        .unwrap()
        .to_error_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("casino").with_states(states);
    fsm.start().unwrap();

    let outcome = fsm.update().await.unwrap();

    assert!(outcome.changed().is_some());
    let traces = buffer.contents();
    assert!(traces.contains("WARN"));
    assert!(traces.contains("action fault handled by error path: dice fell off the table"));
    assert!(traces.contains("cleanup broke too"));
    assert!(!traces.contains("satisfied="));
}

#[tokio::test]
async fn history_serializes_for_diagnostics() {
    let states = State::many(["A", "B"]);
    states[0]
        .add_named_transition("hop")
        .unwrap()
        .to_state(&states[1])
        .unwrap();
    let mut fsm = Fsm::new("m").with_states(states);
    fsm.start().unwrap();
    fsm.update().await.unwrap();

    let json = serde_json::to_string(fsm.history().records()).unwrap();
    let records: Vec<StateChangeRecord> = serde_json::from_str(&json).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].from, "A");
    assert_eq!(records[0].to, "B");
    assert_eq!(records[0].transition.as_deref(), Some("hop"));
}

#[test]
fn machines_have_distinct_ids() {
    let a = Fsm::new("same");
    let b = Fsm::new("same");

    assert_ne!(a.id(), b.id());
}
