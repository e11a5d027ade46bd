//! Hat: contenedor de estado por ejecución.
//!
//! Rol en el flujo:
//! - Cada run crea un `Hat` vacío; el orquestador escribe bajo la clave de
//!   cada paso su último resultado.
//! - Pasos posteriores referencian resultados anteriores con rutas de puntos
//!   y corchetes (`cliente.direcciones[0].ciudad`).
//! - `resolve` nunca falla: una ruta inexistente o malformada devuelve `None`
//!   (el marcador de ausencia). Se prefiere robustez del flujo interactivo
//!   sobre validación estricta.
//!
//! El Hat pertenece exclusivamente a un run: se crea al iniciarlo, sólo lo
//! muta el orquestador tras cada paso y se descarta (o se entrega como
//! snapshot en `Outcome::Completed`) al terminar.

use indexmap::IndexMap;
use serde_json::Value;

/// Segmento de una ruta ya parseada.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Mapeo `clave de paso -> último resultado`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hat {
    entries: IndexMap<String, Value>,
}

impl Hat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escribe (o reemplaza) el resultado de un paso.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Lectura directa por clave de paso, con default del llamador.
    pub fn get<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.entries.get(key).unwrap_or(default)
    }

    /// Resuelve una ruta con puntos y corchetes a través de objetos y arrays
    /// anidados. Cualquier fallo (ruta vacía, segmento inexistente, índice
    /// fuera de rango, corchete malformado) devuelve `None`.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let segments = parse_path(path)?;
        let mut it = segments.into_iter();

        // El primer segmento direcciona el Hat mismo: debe ser una clave.
        let mut current = match it.next()? {
            Segment::Key(k) => self.entries.get(&k)?,
            Segment::Index(_) => return None,
        };

        for seg in it {
            current = descend(current, &seg)?;
        }
        Some(current)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Claves en orden de inserción.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Copia del estado actual (usada por `Outcome::Completed`).
    pub fn snapshot(&self) -> Hat {
        self.clone()
    }

    /// Vista JSON del contenido, en orden de inserción (para fronteras de
    /// presentación; el Hat mismo nunca se persiste).
    pub fn to_json_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (k, v) in &self.entries {
            obj.insert(k.clone(), v.clone());
        }
        Value::Object(obj)
    }
}

/// Baja un nivel dentro de un `Value` según el segmento.
fn descend<'a>(value: &'a Value, seg: &Segment) -> Option<&'a Value> {
    match (value, seg) {
        (Value::Object(map), Segment::Key(k)) => map.get(k),
        (Value::Array(items), Segment::Index(i)) => items.get(*i),
        // Un segmento numérico escrito como clave también indexa arrays
        // (`items.0` equivale a `items[0]`).
        (Value::Array(items), Segment::Key(k)) => k.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Parsea `a.b[0].c` en segmentos. `None` si la ruta está vacía o algún
/// corchete es malformado.
fn parse_path(path: &str) -> Option<Vec<Segment>> {
    if path.is_empty() {
        return None;
    }
    let mut segments = Vec::new();
    for part in path.split('.') {
        if part.is_empty() {
            return None;
        }
        let (name, brackets) = match part.find('[') {
            Some(i) => (&part[..i], &part[i..]),
            None => (part, ""),
        };
        if !name.is_empty() {
            segments.push(Segment::Key(name.to_string()));
        }
        let mut rest = brackets;
        while !rest.is_empty() {
            let inner = rest.strip_prefix('[')?;
            let close = inner.find(']')?;
            let idx: usize = inner[..close].parse().ok()?;
            segments.push(Segment::Index(idx));
            rest = &inner[close + 1..];
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments)
}
