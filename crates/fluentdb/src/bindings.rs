//! Named parameter storage for one query.
//!
//! Keys are `<column stem>_<n>` where `n` comes from a per-registry counter, so
//! every key generated by one registry is distinct: the digits after the last
//! `_` identify the key on their own.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::ident::{binding_stem, is_key_char, is_key_start};
use crate::value::Value;
use std::collections::HashMap;

/// Insertion-ordered mapping of generated keys to values.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    entries: Vec<(String, Value)>,
    counter: u64,
}

/// SQL rewritten to the driver's positional placeholders plus its values in
/// parameter order.
#[derive(Debug)]
pub struct BoundStatement<'a> {
    pub sql: String,
    pub values: Vec<&'a Value>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh key for `column`.
    pub fn generate(&mut self, column: &str) -> String {
        self.counter += 1;
        format!("{}_{}", binding_stem(column), self.counter)
    }

    /// Store `value` under `key`, replacing an earlier value for the same key.
    pub fn register(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Generate a key for `column`, register `value` under it and return the key.
    pub fn push(&mut self, column: &str, value: impl Into<Value>) -> String {
        let key = self.generate(column);
        self.register(key.clone(), value);
        key
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bind every `:key` in `sql` for execution on `dialect`.
    ///
    /// Each placeholder is replaced by the native positional form (`$n` or `?`)
    /// and its value appended to the parameter list. Quoted strings, back-ticked
    /// identifiers and `::` casts are copied through untouched.
    pub fn bind_all(&self, sql: &str, dialect: Dialect) -> DbResult<BoundStatement<'_>> {
        let lookup: HashMap<&str, &Value> = self.iter().collect();
        let mut out = String::with_capacity(sql.len());
        let mut values: Vec<&Value> = Vec::new();
        // Postgres can reuse `$n` for a repeated key; mysql needs one `?` each.
        let mut numbered: HashMap<&str, usize> = HashMap::new();

        let mut chars = sql.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            match c {
                '\'' | '"' | '`' => {
                    out.push(c);
                    for (_, inner) in chars.by_ref() {
                        out.push(inner);
                        if inner == c {
                            break;
                        }
                    }
                }
                ':' => match chars.peek() {
                    Some(&(_, ':')) => {
                        out.push_str("::");
                        chars.next();
                    }
                    Some(&(_, next)) if is_key_start(next) => {
                        let start = pos + 1;
                        let mut end = start;
                        while let Some(&(i, k)) = chars.peek() {
                            if !is_key_char(k) {
                                break;
                            }
                            end = i + k.len_utf8();
                            chars.next();
                        }
                        let key = &sql[start..end];
                        let value =
                            lookup
                                .get(key)
                                .copied()
                                .ok_or_else(|| DbError::UnboundPlaceholder {
                                    key: key.to_string(),
                                })?;

                        match dialect {
                            Dialect::Postgres => {
                                let index = match numbered.get(key) {
                                    Some(index) => *index,
                                    None => {
                                        values.push(value);
                                        numbered.insert(key, values.len());
                                        values.len()
                                    }
                                };
                                out.push_str(&dialect.placeholder(index));
                            }
                            Dialect::Mysql => {
                                values.push(value);
                                out.push_str(&dialect.placeholder(values.len()));
                            }
                        }
                    }
                    _ => out.push(':'),
                },
                _ => out.push(c),
            }
        }

        Ok(BoundStatement { sql: out, values })
    }
}
