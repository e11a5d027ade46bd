//! Humo del core contra el dispatcher estándar de menu-adapters.

use menu_adapters::{MenuRenderHandler, RoutingDispatcher};
use menu_core::{LoopEngine, Principal, RunContext, StepMap};
use serde_json::json;

#[test]
fn core_runs_against_the_standard_routing_dispatcher() {
    let map = StepMap::builder().step("inicio", json!({"kind": "menu", "items": ["Uno", "Dos"]}))
                                .build();
    let mut dispatcher = RoutingDispatcher::new().with_handler("menu", Box::new(MenuRenderHandler::new()));
    let mut engine = LoopEngine::new();

    let outcome = engine.run(&map, RunContext::new(Principal::guest("anon")), &mut dispatcher)
                        .expect("run");

    let hat = outcome.hat().expect("completed");
    assert_eq!(hat.resolve("inicio.lines[1]"), Some(&json!("2) Dos")));
}
