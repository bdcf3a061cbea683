//! Schema walker that turns decoded payloads into named numeric samples.

use segingest_core::{DataTypeDef, FieldDefs, Value};

pub const DEFAULT_ARRAY_CAP: usize = 10;

/// Walks a decoded [`Value`] alongside its [`FieldDefs`] and emits every
/// numeric, boolean and enum leaf as `(signal name, f64)`.
///
/// Names are `topic.field.sub`, with list and array elements written as
/// `path[i]` for `i < array_cap`. Strings, bytes, maps and nulls produce
/// nothing.
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor {
    array_cap: usize,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ARRAY_CAP)
    }
}

/// Outcome of walking one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub emitted: u64,
    /// Fields whose value did not match the declared type and were skipped.
    pub reflection_errors: u64,
}

impl FieldExtractor {
    pub fn new(array_cap: usize) -> Self {
        Self { array_cap }
    }

    pub fn array_cap(&self) -> usize {
        self.array_cap
    }

    /// Walk `value` (the root struct of a `topic` event) and hand every leaf to `emit`.
    pub fn extract<F>(&self, topic: &str, defs: &FieldDefs, value: &Value, mut emit: F) -> ExtractStats
    where
        F: FnMut(&str, f64),
    {
        let mut walk = Walk {
            array_cap: self.array_cap,
            path: String::from(topic),
            stats: ExtractStats::default(),
            emit: &mut emit,
        };
        walk.visit_struct(defs, value);
        walk.stats
    }

    /// Convenience form of [`extract`](Self::extract) that collects owned pairs.
    pub fn collect(&self, topic: &str, defs: &FieldDefs, value: &Value) -> Vec<(String, f64)> {
        let mut out = Vec::new();
        self.extract(topic, defs, value, |name, v| out.push((name.to_string(), v)));
        out
    }
}

struct Walk<'e, F> {
    array_cap: usize,
    path: String,
    stats: ExtractStats,
    emit: &'e mut F,
}

impl<F: FnMut(&str, f64)> Walk<'_, F> {
    fn visit_struct(&mut self, defs: &FieldDefs, value: &Value) {
        let members = match value {
            Value::Null => return,
            Value::Struct(members) if members.len() == defs.len() => members,
            other => {
                self.mismatch("struct", other);
                return;
            }
        };
        for (def, member) in defs.iter().zip(members) {
            let mark = self.path.len();
            self.path.push('.');
            self.path.push_str(&def.name);
            self.visit(def.data_type(), member);
            self.path.truncate(mark);
        }
    }

    fn visit(&mut self, data_type: &DataTypeDef, value: &Value) {
        if value.is_null() {
            return;
        }
        match data_type {
            DataTypeDef::Struct(defs) => self.visit_struct(defs, value),
            DataTypeDef::List(element) | DataTypeDef::Array(element, _) => {
                let items = match value.try_elements() {
                    Ok(items) => items,
                    Err(e) => {
                        log::debug!("skipping {}: {e}", self.path);
                        self.stats.reflection_errors += 1;
                        return;
                    }
                };
                for (i, item) in items.iter().take(self.array_cap).enumerate() {
                    let mark = self.path.len();
                    self.path.push('[');
                    self.path.push_str(&i.to_string());
                    self.path.push(']');
                    self.visit(&element.data_type, item);
                    self.path.truncate(mark);
                }
            }
            DataTypeDef::Map { .. } | DataTypeDef::String | DataTypeDef::Bytes | DataTypeDef::Null => {}
            leaf => match value.as_f64() {
                Some(v) => {
                    (self.emit)(&self.path, v);
                    self.stats.emitted += 1;
                }
                None => self.mismatch(leaf.type_name(), value),
            },
        }
    }

    fn mismatch(&mut self, expected: &str, actual: &Value) {
        log::debug!(
            "skipping {}: expected {expected}, found {}",
            self.path,
            actual.variant_name()
        );
        self.stats.reflection_errors += 1;
    }
}
