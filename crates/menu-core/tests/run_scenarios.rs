//! Escenarios de referencia del modo síncrono.

use std::collections::VecDeque;

use menu_core::{AccessRule, BufferNotifier, DispatchError, DispatchOutcome, Dispatcher,
                InMemoryTransactionProvider, LoopEngine, NavigationSignal, Principal, RunContext,
                StepMap};
use serde_json::{json, Value};

/// Dispatcher con guion: consume respuestas en orden y registra cada
/// invocación (clave + params interpolados).
struct ScriptedDispatcher {
    script: VecDeque<Result<DispatchOutcome, DispatchError>>,
    calls: Vec<(String, Value)>,
}

impl ScriptedDispatcher {
    fn new(script: Vec<Result<DispatchOutcome, DispatchError>>) -> Self {
        Self { script: script.into(),
               calls: Vec::new() }
    }

    fn keys(&self) -> Vec<&str> {
        self.calls.iter().map(|(k, _)| k.as_str()).collect()
    }
}

impl Dispatcher for ScriptedDispatcher {
    fn dispatch(&mut self, step_key: &str, params: &Value) -> Result<DispatchOutcome, DispatchError> {
        self.calls.push((step_key.to_string(), params.clone()));
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(DispatchOutcome::signal(NavigationSignal::Stop)))
    }
}

fn two_step_map() -> StepMap {
    StepMap::builder().step("s1", json!({}))
                      .step("s2", json!({}))
                      .build()
}

#[test]
fn scenario_a_two_values_complete_with_full_hat() {
    let map = two_step_map();
    let mut dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::value(json!("a"))),
                                                      Ok(DispatchOutcome::value(json!("b")))]);
    let mut engine = LoopEngine::new();

    let outcome = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                        .expect("run");

    let hat = outcome.hat().expect("completed");
    assert_eq!(hat.resolve("s1"), Some(&json!("a")));
    assert_eq!(hat.resolve("s2"), Some(&json!("b")));
    assert_eq!(dispatcher.keys(), vec!["s1", "s2"]);
}

#[test]
fn scenario_b_role_denial_returns_back_without_dispatch() {
    let map = StepMap::builder().access(AccessRule { role: Some("admin".to_string()),
                                                     ..AccessRule::default() })
                                .step("s1", json!({}))
                                .build();
    let mut dispatcher = ScriptedDispatcher::new(vec![]);
    let mut engine = LoopEngine::builder().with_notifier(BufferNotifier::new()).build();

    let outcome = engine.run(&map,
                             RunContext::new(Principal::user("eva")),
                             &mut dispatcher)
                        .expect("run");

    assert_eq!(outcome.signal(), Some(NavigationSignal::Back));
    assert!(dispatcher.calls.is_empty(), "dispatcher must never run on denial");
    assert!(engine.notifier().contains("access denied"));
}

#[test]
fn scenario_c_dispatch_failure_rolls_back_once() {
    let map = StepMap::builder().transaction(true)
                                .step("s1", json!({}))
                                .step("s2", json!({}))
                                .build();
    let mut dispatcher =
        ScriptedDispatcher::new(vec![Ok(DispatchOutcome::value(json!("a"))),
                                     Err(DispatchError::new("boom"))]);
    let mut engine = LoopEngine::builder().with_transactions(InMemoryTransactionProvider::new())
                                          .build();

    let outcome = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                        .expect("run");

    assert_eq!(outcome.signal(), Some(NavigationSignal::Error));
    assert!(outcome.message().unwrap_or_default().contains("boom"));
    let txn = engine.transactions();
    assert_eq!(txn.rolled_back.len(), 1);
    assert!(txn.committed.is_empty());
    assert!(txn.resolved_exclusively());
}

#[test]
fn navigation_signals_pass_through_unchanged() {
    for signal in [NavigationSignal::Back,
                   NavigationSignal::Exit,
                   NavigationSignal::Stop,
                   NavigationSignal::Error,
                   NavigationSignal::Empty]
    {
        let map = two_step_map();
        let mut dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::signal(signal))]);
        let mut engine = LoopEngine::new();

        let outcome = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                            .expect("run");

        assert_eq!(outcome.signal(), Some(signal), "signal must never be remapped");
        assert_eq!(dispatcher.keys(), vec!["s1"], "the run ends at the signalling step");
    }
}

#[test]
fn metadata_keys_are_never_dispatched() {
    let map = StepMap::from_json_str(
        r#"{
            "_transaction": false,
            "s1": {"kind": "menu"},
            "_access": {},
            "s2": {"kind": "menu"}
        }"#,
    ).expect("parse");
    let mut dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::value(json!(1))),
                                                      Ok(DispatchOutcome::value(json!(2)))]);
    let mut engine = LoopEngine::new();

    engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
          .expect("run");

    assert_eq!(dispatcher.keys(), vec!["s1", "s2"]);
}

#[test]
fn params_are_interpolated_against_earlier_results() {
    let map = StepMap::builder().step("cliente", json!({}))
                                .step("resumen", json!({"texto": "Hola %cliente.nombre",
                                                        "monto": "%cliente.saldo",
                                                        "falta": "%cliente.nada"}))
                                .build();
    let mut dispatcher =
        ScriptedDispatcher::new(vec![Ok(DispatchOutcome::value(json!({"nombre": "Ana", "saldo": 10}))),
                                     Ok(DispatchOutcome::value(json!("ok")))]);
    let mut engine = LoopEngine::new();

    engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
          .expect("run");

    let (_, params) = &dispatcher.calls[1];
    assert_eq!(params["texto"], json!("Hola Ana"));
    assert_eq!(params["monto"], json!(10));
    // ruta no resuelta: fallback documentado, el run continúa
    assert_eq!(params["falta"], json!(""));
}

#[test]
fn empty_map_completes_with_empty_hat() {
    let map = StepMap::builder().build();
    let mut dispatcher = ScriptedDispatcher::new(vec![]);
    let mut engine = LoopEngine::new();

    let outcome = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                        .expect("run");

    assert!(outcome.is_completed());
    assert!(outcome.hat().expect("hat").is_empty());
    assert!(dispatcher.calls.is_empty());
}

#[test]
fn item_denial_gates_before_dispatch() {
    let map = StepMap::builder().step("s1", json!({}))
                                .guarded_step("s2",
                                              json!({}),
                                              AccessRule { permission: Some("cerrar".to_string()),
                                                           ..AccessRule::default() })
                                .build();
    let mut dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::value(json!("a")))]);
    let mut engine = LoopEngine::builder().with_notifier(BufferNotifier::new()).build();

    let outcome = engine.run(&map, RunContext::new(Principal::user("eva")), &mut dispatcher)
                        .expect("run");

    assert_eq!(outcome.signal(), Some(NavigationSignal::Back));
    assert_eq!(dispatcher.keys(), vec!["s1"], "s2 must never reach the dispatcher");
    assert!(engine.notifier().contains("s2"));
}

#[test]
fn signal_callback_fires_once_after_transaction() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let fired = Rc::new(RefCell::new(0u32));
    let fired_cb = Rc::clone(&fired);

    let map = StepMap::builder().transaction(true).step("s1", json!({})).build();
    let mut dispatcher =
        ScriptedDispatcher::new(vec![Ok(DispatchOutcome::signal_with_message(NavigationSignal::Exit,
                                                                             "adios"))]);
    let mut engine = LoopEngine::builder()
        .with_transactions(InMemoryTransactionProvider::new())
        .on_signal(NavigationSignal::Exit, move |outcome| {
            assert_eq!(outcome.message(), Some("adios"));
            *fired_cb.borrow_mut() += 1;
        })
        .build();

    let outcome = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                        .expect("run");

    assert_eq!(outcome.signal(), Some(NavigationSignal::Exit));
    assert_eq!(*fired.borrow(), 1);
    // Exit confirma por defecto (decisión documentada en DESIGN.md)
    assert_eq!(engine.transactions().committed.len(), 1);
}
