//! Demo ejecutable del motor: recorre los dos modos y las fronteras
//! (acceso, transacción) con el dispatcher estándar de adapters.

use menu_adapters::{DataQueryHandler, FunctionCallHandler, MenuRenderHandler, RoutingDispatcher};
use menu_core::{AccessRule, BufferNotifier, DispatchError, DispatchOutcome,
                InMemoryTransactionProvider, LoopEngine, NavigationSignal, Principal, RunContext,
                StepMap};
use serde_json::{json, Value};

fn demo_dispatcher() -> RoutingDispatcher {
    let clientes = vec![json!({"id": 1, "nombre": "Ana", "ciudad": "Quito"}),
                        json!({"id": 2, "nombre": "Luis", "ciudad": "Cuenca"})];
    RoutingDispatcher::new()
        .with_handler("menu", Box::new(MenuRenderHandler::new()))
        .with_handler("query", Box::new(DataQueryHandler::new().with_dataset("clientes", clientes)))
        .with_handler("call",
                      Box::new(FunctionCallHandler::new()
                          .with_function("resumen", |args: &Value| {
                              let nombre = args.get("nombre").and_then(Value::as_str).unwrap_or("?");
                              Ok(DispatchOutcome::value(json!(format!("resumen de {nombre}"))))
                          })
                          .with_function("fallar", |_args: &Value| {
                              Err(DispatchError::new("fallo intencional de demo"))
                          })))
}

fn demo_map() -> StepMap {
    StepMap::from_json_str(
        r#"{
            "inicio": {"kind": "menu", "title": "Clientes", "items": ["Buscar", "Salir"]},
            "busqueda": {"kind": "query", "source": "clientes",
                         "filter": {"field": "ciudad", "equals": "Quito"}},
            "cierre": {"kind": "call", "function": "resumen",
                       "args": {"nombre": "%busqueda[0].nombre"}}
        }"#,
    ).expect("mapa de demo válido")
}

/// Validación 1: run síncrono completo, Hat final y traza compacta.
fn run_sync_demo() {
    println!("== demo síncrona ==");
    let map = demo_map();
    let mut dispatcher = demo_dispatcher();
    let mut engine = LoopEngine::new();

    match engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher) {
        Ok(outcome) => {
            if let Some(hat) = outcome.hat() {
                println!("hat final: {}", hat.to_json_value());
            }
            if let Some(variants) = engine.trace_variants() {
                println!("traza: {variants:?}");
            }
        }
        Err(e) => eprintln!("error de configuración: {e}"),
    }
}

/// Validación 2: run chunked, un chunk por paso.
fn run_chunked_demo() {
    println!("== demo chunked ==");
    let map = demo_map();
    let mut dispatcher = demo_dispatcher();
    let mut engine = LoopEngine::new();

    match engine.run_chunked(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher) {
        Ok(mut run) => {
            for item in run.by_ref() {
                match item {
                    Ok(chunk) => println!("chunk {} terminal={} -> {}",
                                          chunk.step_key, chunk.terminal, chunk.result),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            if let Some(outcome) = run.outcome() {
                println!("outcome: completed={}", outcome.is_completed());
            }
        }
        Err(e) => eprintln!("error de configuración: {e}"),
    };
}

/// Validación 3: gate de acceso, aviso y Back sin tocar el dispatcher.
fn run_access_demo() {
    println!("== demo de acceso ==");
    let map = StepMap::builder().access(AccessRule { role: Some("admin".to_string()),
                                                     ..AccessRule::default() })
                                .step("inicio", json!({"kind": "menu"}))
                                .build();
    let mut dispatcher = demo_dispatcher();
    let mut engine = LoopEngine::builder().with_notifier(BufferNotifier::new()).build();

    match engine.run(&map, RunContext::new(Principal::user("eva")), &mut dispatcher) {
        Ok(outcome) => {
            println!("señal: {:?}", outcome.signal());
            for (message, _severity) in &engine.notifier().messages {
                println!("aviso: {message}");
            }
        }
        Err(e) => eprintln!("error de configuración: {e}"),
    }
}

/// Validación 4: fallo de dispatch con transacción declarada -> rollback.
fn run_transaction_demo() {
    println!("== demo de transacción ==");
    let map = StepMap::from_json_str(
        r#"{
            "_transaction": true,
            "busqueda": {"kind": "query", "source": "clientes"},
            "boom": {"kind": "call", "function": "fallar"}
        }"#,
    ).expect("mapa válido");
    let mut dispatcher = demo_dispatcher();
    let mut engine = LoopEngine::builder()
        .with_transactions(InMemoryTransactionProvider::new())
        .on_signal(NavigationSignal::Error, |outcome| {
            println!("callback de error: {:?}", outcome.message());
        })
        .build();

    match engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher) {
        Ok(outcome) => {
            println!("señal: {:?}", outcome.signal());
            let txn = engine.transactions();
            println!("commits={} rollbacks={}", txn.committed.len(), txn.rolled_back.len());
        }
        Err(e) => eprintln!("error de configuración: {e}"),
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    run_sync_demo();
    run_chunked_demo();
    run_access_demo();
    run_transaction_demo();
}
