//! Interpolación de parámetros contra el Hat.
//!
//! Un parámetro puede referenciar el resultado de un paso anterior con un
//! marcador `%ruta`:
//! - Si el string completo es un marcador (`"%s1.total"`), se sustituye por
//!   el `Value` resuelto, conservando su tipo.
//! - Si el marcador va embebido (`"Total: %s1.total EUR"`), el valor se
//!   renderiza dentro del string.
//! - Una ruta que no resuelve se sustituye por el fallback documentado
//!   (string vacío) y se registra en el log; el run nunca aborta por esto.
//! - `%%` escapa un `%` literal.
//!
//! Corre una vez por visita de paso y sólo sobre los parámetros de ese paso.

use serde_json::Value;

use crate::hashing::to_canonical_json;
use crate::hat::Hat;

/// Sustituto documentado para rutas no resueltas.
pub const MISSING_FALLBACK: &str = "";

/// Reescribe recursivamente los marcadores `%ruta` de un árbol de parámetros.
pub fn interpolate(params: &Value, hat: &Hat) -> Value {
    match params {
        Value::String(s) => interpolate_string(s, hat),
        Value::Array(items) => Value::Array(items.iter().map(|v| interpolate(v, hat)).collect()),
        Value::Object(map) => {
            let rewritten = map.iter()
                               .map(|(k, v)| (k.clone(), interpolate(v, hat)))
                               .collect();
            Value::Object(rewritten)
        }
        other => other.clone(),
    }
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']')
}

/// Marcador que ocupa el string completo: devuelve su ruta.
fn whole_placeholder(s: &str) -> Option<&str> {
    let rest = s.strip_prefix('%')?;
    if rest.is_empty() || rest.starts_with('%') {
        return None;
    }
    if rest.chars().all(is_path_char) && !rest.ends_with('.') {
        return Some(rest);
    }
    None
}

fn interpolate_string(s: &str, hat: &Hat) -> Value {
    // Caso tipado: el string entero es un único marcador.
    if let Some(path) = whole_placeholder(s) {
        return match hat.resolve(path) {
            Some(v) => v.clone(),
            None => {
                log::warn!("ruta no resuelta `%{path}`, se sustituye por el fallback");
                Value::String(MISSING_FALLBACK.to_string())
            }
        };
    }

    if !s.contains('%') {
        return Value::String(s.to_string());
    }

    // Caso embebido: renderizar cada marcador dentro del string.
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        if i + 1 < chars.len() && chars[i + 1] == '%' {
            out.push('%');
            i += 2;
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && is_path_char(chars[j]) {
            j += 1;
        }
        let raw: String = chars[i + 1..j].iter().collect();
        // Un punto final pertenece a la frase, no a la ruta.
        let path = raw.trim_end_matches('.');
        if path.is_empty() {
            out.push('%');
            i += 1;
            continue;
        }
        match hat.resolve(path) {
            Some(v) => out.push_str(&render_scalar(v)),
            None => {
                log::warn!("ruta no resuelta `%{path}`, se sustituye por el fallback");
                out.push_str(MISSING_FALLBACK);
            }
        }
        for _ in path.len()..raw.len() {
            out.push('.');
        }
        i = j;
    }
    Value::String(out)
}

/// Render de un valor dentro de un string: escalares en forma natural,
/// estructuras en JSON canónico.
fn render_scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => to_canonical_json(v),
    }
}
