//! Column registry.
//!
//! Parses column descriptors of the form `[table.]field[ [AS] alias]` and
//! exposes the aliases grid requests are allowed to address. Registration
//! order is significant: order directives reference columns by position.

use std::fmt;

/// A successfully parsed column descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    /// Table (or table alias) qualifier, e.g. `u` in `u.name`.
    pub table: Option<String>,

    /// Underlying field name.
    pub field: String,

    /// Externally visible name. Defaults to the field name.
    pub alias: String,
}

impl ColumnEntry {
    /// Qualified field reference, e.g. `u.name` or `name`.
    pub fn qualified_field(&self) -> String {
        match &self.table {
            Some(table) => format!("{table}.{}", self.field),
            None => self.field.clone(),
        }
    }
}

impl fmt::Display for ColumnEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qualified = self.qualified_field();
        if qualified == self.alias {
            f.write_str(&qualified)
        } else {
            write!(f, "{qualified} AS {}", self.alias)
        }
    }
}

/// One registered descriptor.
///
/// Malformed descriptors are kept as `Unparsed` so that the positions of the
/// remaining columns stay aligned with the grid's column indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDescriptor {
    Parsed(ColumnEntry),
    Unparsed(String),
}

impl ColumnDescriptor {
    /// Parse a single descriptor string.
    pub fn parse(raw: &str) -> Self {
        match parse_entry(raw) {
            Some(entry) => ColumnDescriptor::Parsed(entry),
            None => ColumnDescriptor::Unparsed(raw.to_string()),
        }
    }

    /// The parsed entry, if any.
    pub fn entry(&self) -> Option<&ColumnEntry> {
        match self {
            ColumnDescriptor::Parsed(entry) => Some(entry),
            ColumnDescriptor::Unparsed(_) => None,
        }
    }

    /// Alias of the column; `None` for unparsed descriptors.
    pub fn alias(&self) -> Option<&str> {
        self.entry().map(|e| e.alias.as_str())
    }
}

/// Grammar: `reference [AS] alias?`, where `reference` is `[table.]field`.
fn parse_entry(raw: &str) -> Option<ColumnEntry> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();

    let (reference, alias) = match tokens.as_slice() {
        [reference] => (*reference, None),
        [_, dangling] if dangling.eq_ignore_ascii_case("as") => return None,
        [reference, alias] => (*reference, Some(*alias)),
        [reference, keyword, alias] if keyword.eq_ignore_ascii_case("as") => {
            (*reference, Some(*alias))
        }
        _ => return None,
    };

    let (table, field) = match reference.split_once('.') {
        Some((table, field)) => (Some(table), field),
        None => (None, reference),
    };

    if !table.is_none_or(is_identifier) || !is_identifier(field) {
        return None;
    }
    if let Some(alias) = alias
        && !is_identifier(alias)
    {
        return None;
    }

    Some(ColumnEntry {
        table: table.map(str::to_string),
        field: field.to_string(),
        alias: alias.unwrap_or(field).to_string(),
    })
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

/// Ordered set of columns a grid may address.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from descriptor strings.
    pub fn from_descriptors<I, S>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        registry.register(descriptors);
        registry
    }

    /// Replace the registered columns with the given descriptors.
    pub fn register<I, S>(&mut self, descriptors: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns.clear();

        for raw in descriptors {
            let descriptor = ColumnDescriptor::parse(raw.as_ref());
            match &descriptor {
                ColumnDescriptor::Unparsed(raw) => {
                    tracing::warn!(descriptor = %raw, "column descriptor not understood; column is unaddressable");
                }
                ColumnDescriptor::Parsed(entry) if self.exists(&entry.alias) => {
                    tracing::warn!(alias = %entry.alias, "duplicate column alias; first registration wins");
                }
                ColumnDescriptor::Parsed(_) => {}
            }
            self.columns.push(descriptor);
        }
    }

    /// Whether `alias` names a registered column.
    pub fn exists(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    /// First entry registered under `alias`.
    pub fn get(&self, alias: &str) -> Option<&ColumnEntry> {
        self.columns
            .iter()
            .filter_map(ColumnDescriptor::entry)
            .find(|entry| entry.alias == alias)
    }

    /// Aliases in registration order; `None` marks an unparsed descriptor.
    pub fn list(&self) -> Vec<Option<&str>> {
        self.columns.iter().map(ColumnDescriptor::alias).collect()
    }

    /// Alias registered at a positional index.
    pub fn alias_at(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(ColumnDescriptor::alias)
    }

    /// Parsed entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &ColumnEntry> {
        self.columns.iter().filter_map(ColumnDescriptor::entry)
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
