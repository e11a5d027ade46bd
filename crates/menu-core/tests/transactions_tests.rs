//! Matriz de resolución de transacciones por outcome.

use std::collections::VecDeque;

use menu_core::{DispatchError, DispatchOutcome, Dispatcher, InMemoryTransactionProvider,
                LoopEngine, LooperError, NavigationSignal, Principal, RunContext, StepMap};
use serde_json::{json, Value};

struct ScriptedDispatcher {
    script: VecDeque<Result<DispatchOutcome, DispatchError>>,
    calls: Vec<String>,
}

impl ScriptedDispatcher {
    fn new(script: Vec<Result<DispatchOutcome, DispatchError>>) -> Self {
        Self { script: script.into(),
               calls: Vec::new() }
    }
}

impl Dispatcher for ScriptedDispatcher {
    fn dispatch(&mut self, step_key: &str, _params: &Value) -> Result<DispatchOutcome, DispatchError> {
        self.calls.push(step_key.to_string());
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(DispatchOutcome::signal(NavigationSignal::Stop)))
    }
}

fn transactional_map() -> StepMap {
    StepMap::builder().transaction(true)
                      .step("s1", json!({}))
                      .step("s2", json!({}))
                      .build()
}

/// Corre el mapa transaccional con el guion dado y devuelve (committed,
/// rolled_back) del proveedor.
fn resolve_with(script: Vec<Result<DispatchOutcome, DispatchError>>) -> (usize, usize) {
    let map = transactional_map();
    let mut dispatcher = ScriptedDispatcher::new(script);
    let mut engine = LoopEngine::builder().with_transactions(InMemoryTransactionProvider::new())
                                          .build();
    engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
          .expect("run");
    let txn = engine.transactions();
    assert!(txn.resolved_exclusively());
    (txn.committed.len(), txn.rolled_back.len())
}

#[test]
fn completion_commits() {
    let (committed, rolled_back) = resolve_with(vec![Ok(DispatchOutcome::value(json!(1))),
                                                     Ok(DispatchOutcome::value(json!(2)))]);
    assert_eq!((committed, rolled_back), (1, 0));
}

#[test]
fn stop_commits() {
    let (committed, rolled_back) =
        resolve_with(vec![Ok(DispatchOutcome::signal(NavigationSignal::Stop))]);
    assert_eq!((committed, rolled_back), (1, 0));
}

#[test]
fn back_and_exit_commit_by_default() {
    for signal in [NavigationSignal::Back, NavigationSignal::Exit, NavigationSignal::Empty] {
        let (committed, rolled_back) = resolve_with(vec![Ok(DispatchOutcome::value(json!(1))),
                                                         Ok(DispatchOutcome::signal(signal))]);
        assert_eq!((committed, rolled_back), (1, 0), "{signal} must commit");
    }
}

#[test]
fn error_signal_rolls_back() {
    let (committed, rolled_back) =
        resolve_with(vec![Ok(DispatchOutcome::signal(NavigationSignal::Error))]);
    assert_eq!((committed, rolled_back), (0, 1));
}

#[test]
fn dispatch_failure_rolls_back() {
    let (committed, rolled_back) = resolve_with(vec![Err(DispatchError::new("boom"))]);
    assert_eq!((committed, rolled_back), (0, 1));
}

#[test]
fn undeclared_transaction_touches_nothing() {
    let map = StepMap::builder().step("s1", json!({})).build();
    let mut dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::value(json!(1)))]);
    let mut engine = LoopEngine::builder().with_transactions(InMemoryTransactionProvider::new())
                                          .build();
    engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
          .expect("run");
    let txn = engine.transactions();
    assert!(txn.begun.is_empty());
    assert!(txn.committed.is_empty());
    assert!(txn.rolled_back.is_empty());
}

#[test]
fn refused_begin_aborts_before_any_step() {
    // el proveedor por defecto rechaza abrir transacciones
    let map = transactional_map();
    let mut dispatcher = ScriptedDispatcher::new(vec![]);
    let mut engine = LoopEngine::new();

    let err = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                    .expect_err("must abort");

    assert!(matches!(err, LooperError::TransactionBegin(_)));
    assert!(dispatcher.calls.is_empty(), "no step may run without the declared guarantee");
}

#[test]
fn block_denial_leaves_transaction_untouched() {
    use menu_core::AccessRule;

    let map = StepMap::builder().access(AccessRule { require_auth: true,
                                                     ..AccessRule::default() })
                                .transaction(true)
                                .step("s1", json!({}))
                                .build();
    let mut dispatcher = ScriptedDispatcher::new(vec![]);
    let mut engine = LoopEngine::builder().with_transactions(InMemoryTransactionProvider::new())
                                          .build();

    let outcome = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                        .expect("run");

    // el gate de bloque corre antes de abrir la transacción
    assert_eq!(outcome.signal(), Some(NavigationSignal::Back));
    let txn = engine.transactions();
    assert!(txn.begun.is_empty());
    assert!(txn.committed.is_empty());
    assert!(txn.rolled_back.is_empty());
}

#[test]
fn access_decisions_are_recomputed_each_check() {
    use std::cell::Cell;

    use menu_core::{AccessDecision, AccessProvider, AccessRule};

    // proveedor que cuenta chequeos; el motor no debe cachear decisiones
    #[derive(Default)]
    struct CountingProvider {
        checks: Cell<u32>,
    }

    impl AccessProvider for CountingProvider {
        fn check(&self, _principal: &Principal, _rule: &AccessRule) -> AccessDecision {
            self.checks.set(self.checks.get() + 1);
            AccessDecision::Granted
        }
    }

    let rule = AccessRule { require_auth: true,
                            ..AccessRule::default() };
    let map = StepMap::builder().access(rule.clone())
                                .guarded_step("s1", json!({}), rule.clone())
                                .guarded_step("s2", json!({}), rule)
                                .build();
    let mut dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::value(json!(1))),
                                                      Ok(DispatchOutcome::value(json!(2)))]);
    let mut engine = LoopEngine::builder().with_access(CountingProvider::default()).build();

    engine.run(&map, RunContext::new(Principal::user("eva")), &mut dispatcher)
          .expect("run");

    // 1 chequeo de bloque + 1 por cada visita de paso
    assert_eq!(engine.access_provider().checks.get(), 3);
}
