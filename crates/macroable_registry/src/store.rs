//! Registry storage: entries per scope plus disabled flags.
//!
//! The store keeps four independent keyspaces:
//!
//! - global entries, keyed by host then name
//! - conditional entries, keyed by host then name
//! - namespaced entries, keyed by namespace, host, then name
//! - disabled flags, keyed by host then name and shared by every scope
//!
//! The store itself is plain data; [`Registry`](crate::Registry) owns it
//! behind a lock.

use core::fmt;
use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;

use crate::callable::{Callable, Condition};
use crate::error::MacroError;

type Table = HashMap<String, HashMap<String, MacroEntry>>;

// ─────────────────────────────────────────────────────────────────────────────
// Keys and scopes
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a registered macro.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MacroKey {
    /// Host identifier.
    pub host: String,
    /// Macro name.
    pub name: String,
    /// Namespace for namespaced entries.
    pub namespace: Option<String>,
}

impl MacroKey {
    /// Creates an unqualified key.
    #[must_use]
    pub fn new(host: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            namespace: None,
        }
    }

    /// Qualifies the key with a namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for MacroKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}::{}::{}", self.host, self.name),
            None => write!(f, "{}::{}", self.host, self.name),
        }
    }
}

/// One of the independent macro keyspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope<'a> {
    /// Unconditional entries.
    Global,
    /// Entries gated by a call-time predicate.
    Conditional,
    /// Entries only visible under the given namespace.
    Namespace(&'a str),
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Conditional => f.write_str("conditional"),
            Scope::Namespace(namespace) => write!(f, "namespace '{namespace}'"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

/// Descriptive data attached to a macro by the builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacroInfo {
    /// Free-form description.
    pub description: Option<String>,
    /// Tags, in the order they were first added.
    pub tags: IndexSet<String>,
    /// Informational priority; higher sorts first in listings.
    pub priority: i32,
    /// Arbitrary metadata.
    pub metadata: IndexMap<String, Value>,
    /// Parameters guarded by validation rules.
    pub validated_parameters: Vec<String>,
}

impl MacroInfo {
    /// Returns `true` if the macro carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A registered macro.
#[derive(Debug, Clone)]
pub enum MacroEntry {
    /// Always resolvable while not disabled.
    Global {
        /// The macro body.
        implementation: Callable,
        /// Builder-supplied description data.
        info: MacroInfo,
    },
    /// Resolvable only when `condition` holds for the call parameters.
    Conditional {
        /// The macro body.
        implementation: Callable,
        /// Call-time gate.
        condition: Condition,
        /// Builder-supplied description data.
        info: MacroInfo,
    },
    /// Resolvable only when looked up under `namespace`.
    Namespaced {
        /// The macro body.
        implementation: Callable,
        /// Namespace the entry lives in.
        namespace: String,
        /// Builder-supplied description data.
        info: MacroInfo,
    },
}

impl MacroEntry {
    /// Creates a global entry without description data.
    #[must_use]
    pub fn global(implementation: Callable) -> Self {
        Self::Global {
            implementation,
            info: MacroInfo::default(),
        }
    }

    /// Creates a conditional entry without description data.
    #[must_use]
    pub fn conditional(implementation: Callable, condition: Condition) -> Self {
        Self::Conditional {
            implementation,
            condition,
            info: MacroInfo::default(),
        }
    }

    /// Creates a namespaced entry without description data.
    #[must_use]
    pub fn namespaced(implementation: Callable, namespace: impl Into<String>) -> Self {
        Self::Namespaced {
            implementation,
            namespace: namespace.into(),
            info: MacroInfo::default(),
        }
    }

    /// The macro body.
    #[must_use]
    pub fn implementation(&self) -> &Callable {
        match self {
            Self::Global { implementation, .. }
            | Self::Conditional { implementation, .. }
            | Self::Namespaced { implementation, .. } => implementation,
        }
    }

    /// Builder-supplied description data.
    #[must_use]
    pub fn info(&self) -> &MacroInfo {
        match self {
            Self::Global { info, .. }
            | Self::Conditional { info, .. }
            | Self::Namespaced { info, .. } => info,
        }
    }

    /// The scope this entry belongs to.
    #[must_use]
    pub fn scope(&self) -> Scope<'_> {
        match self {
            Self::Global { .. } => Scope::Global,
            Self::Conditional { .. } => Scope::Conditional,
            Self::Namespaced { namespace, .. } => Scope::Namespace(namespace),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statistics
// ─────────────────────────────────────────────────────────────────────────────

/// Entry counts per scope.
///
/// `total` counts global, conditional and namespaced entries; disabled flags
/// are reported separately and not added to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Global entries.
    pub global: usize,
    /// Conditional entries.
    pub conditional: usize,
    /// Namespaced entries across all namespaces.
    pub namespaced: usize,
    /// Disabled flags.
    pub disabled: usize,
    /// `global + conditional + namespaced`.
    pub total: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct Store {
    global: Table,
    conditional: Table,
    namespaced: HashMap<String, Table>,
    disabled: HashMap<String, HashSet<String>>,
}

fn require_non_empty(what: &str, value: &str) -> Result<(), MacroError> {
    if value.is_empty() {
        return Err(MacroError::invalid_argument(format!(
            "{what} must be a non-empty string"
        )));
    }
    Ok(())
}

fn count(table: &Table) -> usize {
    table.values().map(HashMap::len).sum()
}

impl Store {
    /// Inserts or replaces an entry in the entry's own scope.
    ///
    /// Returns the replaced entry, if any.
    pub(crate) fn put(
        &mut self,
        host: &str,
        name: &str,
        entry: MacroEntry,
    ) -> Result<Option<MacroEntry>, MacroError> {
        require_non_empty("host", host)?;
        require_non_empty("macro name", name)?;

        let table = match &entry {
            MacroEntry::Global { .. } => &mut self.global,
            MacroEntry::Conditional { .. } => &mut self.conditional,
            MacroEntry::Namespaced { namespace, .. } => {
                require_non_empty("namespace", namespace)?;
                self.namespaced.entry(namespace.clone()).or_default()
            }
        };

        Ok(table
            .entry(host.to_owned())
            .or_default()
            .insert(name.to_owned(), entry))
    }

    fn table(&self, scope: Scope<'_>) -> Option<&Table> {
        match scope {
            Scope::Global => Some(&self.global),
            Scope::Conditional => Some(&self.conditional),
            Scope::Namespace(namespace) => self.namespaced.get(namespace),
        }
    }

    pub(crate) fn get(&self, scope: Scope<'_>, host: &str, name: &str) -> Option<&MacroEntry> {
        self.table(scope)?.get(host)?.get(name)
    }

    pub(crate) fn contains(&self, scope: Scope<'_>, host: &str, name: &str) -> bool {
        self.get(scope, host, name).is_some()
    }

    pub(crate) fn remove(&mut self, scope: Scope<'_>, host: &str, name: &str) -> Option<MacroEntry> {
        let table = match scope {
            Scope::Global => &mut self.global,
            Scope::Conditional => &mut self.conditional,
            Scope::Namespace(namespace) => self.namespaced.get_mut(namespace)?,
        };

        let names = table.get_mut(host)?;
        let removed = names.remove(name);
        if names.is_empty() {
            table.remove(host);
        }

        if let Scope::Namespace(namespace) = scope
            && self.namespaced.get(namespace).is_some_and(HashMap::is_empty)
        {
            self.namespaced.remove(namespace);
        }

        removed
    }

    /// Drops a whole namespace, returning how many entries it held.
    pub(crate) fn remove_namespace(&mut self, namespace: &str) -> usize {
        self.namespaced
            .remove(namespace)
            .map_or(0, |table| count(&table))
    }

    /// Clears one host (entries in every scope and its disabled flags), or
    /// everything when `host` is `None`.
    pub(crate) fn flush(&mut self, host: Option<&str>) {
        let Some(host) = host else {
            *self = Self::default();
            return;
        };

        self.global.remove(host);
        self.conditional.remove(host);
        for table in self.namespaced.values_mut() {
            table.remove(host);
        }
        self.namespaced.retain(|_, table| !table.is_empty());
        self.disabled.remove(host);
    }

    pub(crate) fn disable(&mut self, host: &str, name: &str) {
        self.disabled
            .entry(host.to_owned())
            .or_default()
            .insert(name.to_owned());
    }

    pub(crate) fn enable(&mut self, host: &str, name: &str) {
        if let Some(names) = self.disabled.get_mut(host) {
            names.remove(name);
            if names.is_empty() {
                self.disabled.remove(host);
            }
        }
    }

    pub(crate) fn is_disabled(&self, host: &str, name: &str) -> bool {
        self.disabled
            .get(host)
            .is_some_and(|names| names.contains(name))
    }

    pub(crate) fn statistics(&self) -> Statistics {
        let global = count(&self.global);
        let conditional = count(&self.conditional);
        let namespaced = self.namespaced.values().map(count).sum();
        let disabled = self.disabled.values().map(HashSet::len).sum();

        Statistics {
            global,
            conditional,
            namespaced,
            disabled,
            total: global + conditional + namespaced,
        }
    }

    /// Sorted, de-duplicated macro names of `host` across every scope.
    pub(crate) fn names(&self, host: &str) -> Vec<String> {
        let tables = [&self.global, &self.conditional]
            .into_iter()
            .chain(self.namespaced.values());

        tables
            .filter_map(|table| table.get(host))
            .flat_map(HashMap::keys)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every entry with its key.
    pub(crate) fn entries(&self) -> Vec<(MacroKey, &MacroEntry)> {
        let mut entries = Vec::new();

        for table in [&self.global, &self.conditional] {
            for (host, names) in table {
                for (name, entry) in names {
                    entries.push((MacroKey::new(host.as_str(), name.as_str()), entry));
                }
            }
        }

        for (namespace, table) in &self.namespaced {
            for (host, names) in table {
                for (name, entry) in names {
                    let key = MacroKey::new(host.as_str(), name.as_str())
                        .in_namespace(namespace.as_str());
                    entries.push((key, entry));
                }
            }
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Callable {
        Callable::new(|_, _| Ok(json!(null)))
    }

    #[test]
    fn statistics_serialize_as_flat_counts() {
        let mut store = Store::default();
        store.put("Api", "a", MacroEntry::global(body())).unwrap();
        store
            .put("Api", "b", MacroEntry::namespaced(body(), "admin"))
            .unwrap();
        store.disable("Api", "a");

        let value = serde_json::to_value(store.statistics()).unwrap();
        assert_eq!(
            value,
            json!({ "global": 1, "conditional": 0, "namespaced": 1, "disabled": 1, "total": 2 })
        );
    }

    #[test]
    fn info_and_key_serialize_in_declaration_order() {
        let mut info = MacroInfo {
            description: Some("formats money".into()),
            priority: 5,
            validated_parameters: vec!["0".into()],
            ..MacroInfo::default()
        };
        info.tags.insert("format".into());
        info.tags.insert("money".into());
        info.metadata.insert("since".into(), json!("1.2"));

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"description":"formats money","tags":["format","money"],"priority":5,"metadata":{"since":"1.2"},"validated_parameters":["0"]}"#
        );

        let key = serde_json::to_value(MacroKey::new("Money", "format")).unwrap();
        assert_eq!(key, json!({ "host": "Money", "name": "format", "namespace": null }));

        let key = serde_json::to_value(MacroKey::new("Api", "only").in_namespace("admin")).unwrap();
        assert_eq!(key["namespace"], json!("admin"));
    }

    #[test]
    fn put_rejects_empty_identifiers() {
        let mut store = Store::default();

        let err = store.put("", "shout", MacroEntry::global(body())).unwrap_err();
        assert!(matches!(err, MacroError::InvalidArgument(ref msg) if msg.contains("host")));

        let err = store.put("Greeter", "", MacroEntry::global(body())).unwrap_err();
        assert!(matches!(err, MacroError::InvalidArgument(ref msg) if msg.contains("macro name")));

        let err = store
            .put("Greeter", "shout", MacroEntry::namespaced(body(), ""))
            .unwrap_err();
        assert!(matches!(err, MacroError::InvalidArgument(ref msg) if msg.contains("namespace")));

        assert_eq!(store.statistics(), Statistics::default());
    }

    #[test]
    fn scopes_are_independent_keyspaces() {
        let mut store = Store::default();
        store.put("Api", "foo", MacroEntry::global(body())).unwrap();
        store
            .put("Api", "foo", MacroEntry::namespaced(body(), "admin"))
            .unwrap();

        assert!(store.contains(Scope::Global, "Api", "foo"));
        assert!(store.contains(Scope::Namespace("admin"), "Api", "foo"));
        assert!(!store.contains(Scope::Conditional, "Api", "foo"));
        assert!(!store.contains(Scope::Namespace("public"), "Api", "foo"));

        store.remove(Scope::Global, "Api", "foo").unwrap();
        assert!(!store.contains(Scope::Global, "Api", "foo"));
        assert!(store.contains(Scope::Namespace("admin"), "Api", "foo"));
    }

    #[test]
    fn put_returns_replaced_entry() {
        let mut store = Store::default();
        assert!(store.put("A", "m", MacroEntry::global(body())).unwrap().is_none());
        assert!(store.put("A", "m", MacroEntry::global(body())).unwrap().is_some());
        assert_eq!(store.statistics().global, 1);
    }

    #[test]
    fn removing_missing_keys_is_a_noop() {
        let mut store = Store::default();
        assert!(store.remove(Scope::Global, "A", "m").is_none());
        assert!(store.remove(Scope::Namespace("x"), "A", "m").is_none());
        assert_eq!(store.remove_namespace("x"), 0);
        store.enable("A", "m");
        assert!(!store.is_disabled("A", "m"));
    }

    #[test]
    fn flush_host_leaves_other_hosts() {
        let mut store = Store::default();
        store.put("A", "m", MacroEntry::global(body())).unwrap();
        store.put("A", "n", MacroEntry::namespaced(body(), "ns")).unwrap();
        store.put("B", "m", MacroEntry::global(body())).unwrap();
        store.disable("A", "m");
        store.disable("B", "m");

        store.flush(Some("A"));

        assert!(store.names("A").is_empty());
        assert!(!store.is_disabled("A", "m"));
        assert!(store.contains(Scope::Global, "B", "m"));
        assert!(store.is_disabled("B", "m"));
        assert!(store.namespaced.is_empty());
    }

    #[test]
    fn flush_all_clears_disabled_flags() {
        let mut store = Store::default();
        store.put("A", "m", MacroEntry::global(body())).unwrap();
        store.disable("A", "m");
        store.flush(None);
        assert_eq!(store.statistics(), Statistics::default());
    }

    #[test]
    fn statistics_exclude_disabled_from_total() {
        let mut store = Store::default();
        store.put("A", "g", MacroEntry::global(body())).unwrap();
        store
            .put("A", "c", MacroEntry::conditional(body(), Condition::new(|_| true)))
            .unwrap();
        store.put("A", "n", MacroEntry::namespaced(body(), "x")).unwrap();
        store.put("A", "n", MacroEntry::namespaced(body(), "y")).unwrap();
        store.disable("A", "g");

        assert_eq!(
            store.statistics(),
            Statistics {
                global: 1,
                conditional: 1,
                namespaced: 2,
                disabled: 1,
                total: 4,
            }
        );
    }

    #[test]
    fn names_are_sorted_and_deduplicated() {
        let mut store = Store::default();
        store.put("A", "zeta", MacroEntry::global(body())).unwrap();
        store.put("A", "alpha", MacroEntry::global(body())).unwrap();
        store.put("A", "alpha", MacroEntry::namespaced(body(), "x")).unwrap();
        assert_eq!(store.names("A"), vec!["alpha", "zeta"]);
    }

    #[test]
    fn key_display() {
        assert_eq!(MacroKey::new("Api", "sync").to_string(), "Api::sync");
        assert_eq!(
            MacroKey::new("Api", "sync").in_namespace("admin").to_string(),
            "admin::Api::sync"
        );
    }
}
