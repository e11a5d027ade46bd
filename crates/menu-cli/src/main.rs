//! CLI mínima para correr mapas de pasos desde JSON.
//!
//! Uso:
//!   menu-cli run --map <archivo.json> [--chunked] [--user <id>] [--auth]
//!                [--role <rol>]... [--perm <permiso>]... [--data <archivo.json>]
//!
//! `--data` carga datasets para los pasos `kind: "query"`: un objeto JSON
//! `{ "fuente": [filas...] }`. La salida es el outcome (y en modo chunked,
//! un chunk por línea). Códigos de salida: 0 ok, 2 uso, 4 archivo/formato,
//! 5 error de configuración del motor.

use menu_adapters::{DataQueryHandler, FunctionCallHandler, MenuRenderHandler, RoutingDispatcher};
use menu_core::{DispatchOutcome, InMemoryTransactionProvider, LoopEngine, NotificationChannel,
                Outcome, Principal, RunContext, Severity, StepMap};
use serde_json::Value;

/// Notificador de la terminal: avisos por stderr.
struct StderrNotifier;

impl NotificationChannel for StderrNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        let tag = match severity {
            Severity::Info => "info",
            Severity::Warning => "aviso",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {message}");
    }
}

struct RunArgs {
    map_path: String,
    data_path: Option<String>,
    chunked: bool,
    user: Option<String>,
    auth: bool,
    roles: Vec<String>,
    perms: Vec<String>,
}

fn usage() -> ! {
    eprintln!("uso: menu-cli run --map <archivo.json> [--chunked] [--user <id>] [--auth] \
               [--role <rol>]... [--perm <permiso>]... [--data <archivo.json>]");
    std::process::exit(2);
}

fn parse_run_args(args: &[String]) -> RunArgs {
    let mut out = RunArgs { map_path: String::new(),
                            data_path: None,
                            chunked: false,
                            user: None,
                            auth: false,
                            roles: Vec::new(),
                            perms: Vec::new() };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--map" => {
                i += 1;
                if i < args.len() { out.map_path = args[i].clone(); }
            }
            "--data" => {
                i += 1;
                if i < args.len() { out.data_path = Some(args[i].clone()); }
            }
            "--user" => {
                i += 1;
                if i < args.len() { out.user = Some(args[i].clone()); }
            }
            "--role" => {
                i += 1;
                if i < args.len() { out.roles.push(args[i].clone()); }
            }
            "--perm" => {
                i += 1;
                if i < args.len() { out.perms.push(args[i].clone()); }
            }
            "--chunked" => out.chunked = true,
            "--auth" => out.auth = true,
            _ => usage(),
        }
        i += 1;
    }
    if out.map_path.is_empty() {
        usage();
    }
    out
}

fn build_principal(args: &RunArgs) -> Principal {
    let id = args.user.clone().unwrap_or_else(|| "anon".to_string());
    let mut principal = if args.auth { Principal::user(id) } else { Principal::guest(id) };
    for role in &args.roles {
        principal = principal.with_role(role.clone());
    }
    for perm in &args.perms {
        principal = principal.with_permission(perm.clone());
    }
    principal
}

fn build_dispatcher(data_path: Option<&str>) -> Result<RoutingDispatcher, String> {
    let mut query = DataQueryHandler::new();
    if let Some(path) = data_path {
        let raw = std::fs::read_to_string(path).map_err(|e| format!("no se pudo leer {path}: {e}"))?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| format!("datos inválidos en {path}: {e}"))?;
        let Value::Object(sources) = value else {
            return Err(format!("{path}: se esperaba un objeto fuente -> filas"));
        };
        for (name, rows) in sources {
            let Value::Array(rows) = rows else {
                return Err(format!("{path}: la fuente `{name}` debe ser un array"));
            };
            query = query.with_dataset(name, rows);
        }
    }
    // función builtin de demostración; los hosts reales registran las suyas
    let calls = FunctionCallHandler::new().with_function("echo", |args: &Value| {
                                              Ok(DispatchOutcome::value(args.clone()))
                                          });
    Ok(RoutingDispatcher::new().with_handler("menu", Box::new(MenuRenderHandler::new()))
                               .with_handler("query", Box::new(query))
                               .with_handler("call", Box::new(calls)))
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Completed(hat) => {
            println!("completed");
            match serde_json::to_string_pretty(&hat.to_json_value()) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("[error] hat no serializable: {e}"),
            }
        }
        Outcome::Terminated { signal, message } => {
            match message {
                Some(m) => println!("{signal}: {m}"),
                None => println!("{signal}"),
            }
        }
    }
}

fn run_command(args: &[String]) -> i32 {
    let parsed = parse_run_args(args);

    let raw = match std::fs::read_to_string(&parsed.map_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[menu-cli] no se pudo leer {}: {e}", parsed.map_path);
            return 4;
        }
    };
    let map = match StepMap::from_json_str(&raw) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("[menu-cli] mapa inválido: {e}");
            return 4;
        }
    };
    let mut dispatcher = match build_dispatcher(parsed.data_path.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("[menu-cli] {e}");
            return 4;
        }
    };

    let principal = build_principal(&parsed);
    let ctx = RunContext::new(principal);
    let mut engine = LoopEngine::builder().with_transactions(InMemoryTransactionProvider::new())
                                          .with_notifier(StderrNotifier)
                                          .build();

    if parsed.chunked {
        let mut run = match engine.run_chunked(&map, ctx, &mut dispatcher) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[menu-cli] {e}");
                return 5;
            }
        };
        for item in run.by_ref() {
            match item {
                Ok(chunk) => match serde_json::to_string(&chunk) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("[error] chunk no serializable: {e}"),
                },
                Err(e) => {
                    eprintln!("[menu-cli] {e}");
                    return 5;
                }
            }
        }
        if let Some(outcome) = run.outcome() {
            print_outcome(outcome);
        }
        return 0;
    }

    match engine.run(&map, ctx, &mut dispatcher) {
        Ok(outcome) => {
            print_outcome(&outcome);
            0
        }
        Err(e) => {
            eprintln!("[menu-cli] {e}");
            5
        }
    }
}

fn main() {
    // Cargar .env si existe (config de entorno del host)
    let _ = dotenvy::dotenv();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] != "run" {
        usage();
    }
    std::process::exit(run_command(&args[2..]));
}
