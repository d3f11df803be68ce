use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{PersistentValue, ValueKind};

pub type GlobalMap<T> = BTreeMap<String, T>;
pub type PrivateMap<T> = BTreeMap<String, BTreeMap<String, T>>;

/// Which namespace a key lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Shared by every caller.
    Global,
    /// Isolated per caller identity.
    Private(&'a str),
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Private(caller) => write!(f, "private ({caller})"),
        }
    }
}

/// The full aggregate: a global and a per-caller map for each value kind.
///
/// Field names are the on-disk JSON keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentData {
    pub g_string_data: GlobalMap<String>,
    pub g_int_data: GlobalMap<i32>,
    pub g_float_data: GlobalMap<f32>,
    pub g_bool_data: GlobalMap<bool>,
    pub g_string_data_array: GlobalMap<Vec<String>>,
    pub g_int_data_array: GlobalMap<Vec<i32>>,
    pub g_float_data_array: GlobalMap<Vec<f32>>,
    pub g_bool_data_array: GlobalMap<Vec<bool>>,

    pub p_string_data: PrivateMap<String>,
    pub p_int_data: PrivateMap<i32>,
    pub p_float_data: PrivateMap<f32>,
    pub p_bool_data: PrivateMap<bool>,
    pub p_string_data_array: PrivateMap<Vec<String>>,
    pub p_int_data_array: PrivateMap<Vec<i32>>,
    pub p_float_data_array: PrivateMap<Vec<f32>>,
    pub p_bool_data_array: PrivateMap<Vec<bool>>,
}

impl PersistentData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a global value. Returns whether the key existed.
    pub fn set_global(&mut self, key: &str, value: PersistentValue) -> bool {
        match value {
            PersistentValue::String(v) => insert(&mut self.g_string_data, key, v),
            PersistentValue::Int(v) => insert(&mut self.g_int_data, key, v),
            PersistentValue::Float(v) => insert(&mut self.g_float_data, key, v),
            PersistentValue::Bool(v) => insert(&mut self.g_bool_data, key, v),
            PersistentValue::StringArray(v) => insert(&mut self.g_string_data_array, key, v),
            PersistentValue::IntArray(v) => insert(&mut self.g_int_data_array, key, v),
            PersistentValue::FloatArray(v) => insert(&mut self.g_float_data_array, key, v),
            PersistentValue::BoolArray(v) => insert(&mut self.g_bool_data_array, key, v),
        }
    }

    /// Insert or overwrite a value in the caller's private map, creating that
    /// map on first use. Returns whether the key existed.
    pub fn set_private(&mut self, caller: &str, key: &str, value: PersistentValue) -> bool {
        match value {
            PersistentValue::String(v) => insert_private(&mut self.p_string_data, caller, key, v),
            PersistentValue::Int(v) => insert_private(&mut self.p_int_data, caller, key, v),
            PersistentValue::Float(v) => insert_private(&mut self.p_float_data, caller, key, v),
            PersistentValue::Bool(v) => insert_private(&mut self.p_bool_data, caller, key, v),
            PersistentValue::StringArray(v) => {
                insert_private(&mut self.p_string_data_array, caller, key, v)
            }
            PersistentValue::IntArray(v) => {
                insert_private(&mut self.p_int_data_array, caller, key, v)
            }
            PersistentValue::FloatArray(v) => {
                insert_private(&mut self.p_float_data_array, caller, key, v)
            }
            PersistentValue::BoolArray(v) => {
                insert_private(&mut self.p_bool_data_array, caller, key, v)
            }
        }
    }

    pub fn set(&mut self, scope: Scope<'_>, key: &str, value: PersistentValue) -> bool {
        match scope {
            Scope::Global => self.set_global(key, value),
            Scope::Private(caller) => self.set_private(caller, key, value),
        }
    }

    pub fn get_global(&self, kind: ValueKind, key: &str) -> Option<PersistentValue> {
        self.get(kind, Scope::Global, key)
    }

    /// Look up a private value. Misses when the caller has no map of this
    /// kind yet, or the key is absent from it.
    pub fn get_private(
        &self,
        kind: ValueKind,
        caller: &str,
        key: &str,
    ) -> Option<PersistentValue> {
        self.get(kind, Scope::Private(caller), key)
    }

    pub fn get(&self, kind: ValueKind, scope: Scope<'_>, key: &str) -> Option<PersistentValue> {
        match kind {
            ValueKind::String => self.get_typed::<String>(scope, key).map(Into::into),
            ValueKind::Int => self.get_typed::<i32>(scope, key).map(Into::into),
            ValueKind::Float => self.get_typed::<f32>(scope, key).map(Into::into),
            ValueKind::Bool => self.get_typed::<bool>(scope, key).map(Into::into),
            ValueKind::StringArray => self.get_typed::<Vec<String>>(scope, key).map(Into::into),
            ValueKind::IntArray => self.get_typed::<Vec<i32>>(scope, key).map(Into::into),
            ValueKind::FloatArray => self.get_typed::<Vec<f32>>(scope, key).map(Into::into),
            ValueKind::BoolArray => self.get_typed::<Vec<bool>>(scope, key).map(Into::into),
        }
    }

    /// Typed lookup; the kind comes from `T`.
    pub fn get_typed<T: Persistable>(&self, scope: Scope<'_>, key: &str) -> Option<T> {
        match scope {
            Scope::Global => T::global_map(self).get(key).cloned(),
            Scope::Private(caller) => T::private_map(self)
                .get(caller)
                .and_then(|entries| entries.get(key))
                .cloned(),
        }
    }

    /// Total number of stored values across every kind and scope.
    pub fn len(&self) -> usize {
        ValueKind::ALL
            .into_iter()
            .map(|kind| {
                let (global, private) = self.counts(kind);
                global + private
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct caller identities that own private data of any kind.
    pub fn callers(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        out.extend(self.p_string_data.keys().map(String::as_str));
        out.extend(self.p_int_data.keys().map(String::as_str));
        out.extend(self.p_float_data.keys().map(String::as_str));
        out.extend(self.p_bool_data.keys().map(String::as_str));
        out.extend(self.p_string_data_array.keys().map(String::as_str));
        out.extend(self.p_int_data_array.keys().map(String::as_str));
        out.extend(self.p_float_data_array.keys().map(String::as_str));
        out.extend(self.p_bool_data_array.keys().map(String::as_str));
        out
    }

    /// Number of (global, private) values stored for one kind.
    pub fn counts(&self, kind: ValueKind) -> (usize, usize) {
        match kind {
            ValueKind::String => count::<String>(self),
            ValueKind::Int => count::<i32>(self),
            ValueKind::Float => count::<f32>(self),
            ValueKind::Bool => count::<bool>(self),
            ValueKind::StringArray => count::<Vec<String>>(self),
            ValueKind::IntArray => count::<Vec<i32>>(self),
            ValueKind::FloatArray => count::<Vec<f32>>(self),
            ValueKind::BoolArray => count::<Vec<bool>>(self),
        }
    }
}

fn insert<T>(map: &mut GlobalMap<T>, key: &str, value: T) -> bool {
    map.insert(key.to_string(), value).is_some()
}

fn insert_private<T>(map: &mut PrivateMap<T>, caller: &str, key: &str, value: T) -> bool {
    insert(map.entry(caller.to_string()).or_default(), key, value)
}

fn count<T: Persistable>(data: &PersistentData) -> (usize, usize) {
    let private: usize = T::private_map(data).values().map(BTreeMap::len).sum();
    (T::global_map(data).len(), private)
}

/// A Rust type stored as one of the eight value kinds.
///
/// Implemented for exactly `String`, `i32`, `f32`, `bool` and their `Vec`
/// forms; each maps onto its own pair of maps in [`PersistentData`].
pub trait Persistable: Clone + Default + Into<PersistentValue> {
    fn global_map(data: &PersistentData) -> &GlobalMap<Self>;

    fn private_map(data: &PersistentData) -> &PrivateMap<Self>;
}

macro_rules! persistable {
    ($ty:ty, $global:ident, $private:ident) => {
        impl Persistable for $ty {
            fn global_map(data: &PersistentData) -> &GlobalMap<Self> {
                &data.$global
            }

            fn private_map(data: &PersistentData) -> &PrivateMap<Self> {
                &data.$private
            }
        }
    };
}

persistable!(String, g_string_data, p_string_data);
persistable!(i32, g_int_data, p_int_data);
persistable!(f32, g_float_data, p_float_data);
persistable!(bool, g_bool_data, p_bool_data);
persistable!(Vec<String>, g_string_data_array, p_string_data_array);
persistable!(Vec<i32>, g_int_data_array, p_int_data_array);
persistable!(Vec<f32>, g_float_data_array, p_float_data_array);
persistable!(Vec<bool>, g_bool_data_array, p_bool_data_array);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_global_reports_existing_key() {
        let mut data = PersistentData::new();
        assert!(!data.set_global("k", PersistentValue::Int(1)));
        assert!(data.set_global("k", PersistentValue::Int(2)));
        assert_eq!(data.get_global(ValueKind::Int, "k"), Some(PersistentValue::Int(2)));
    }

    #[test]
    fn private_maps_are_created_lazily_per_caller() {
        let mut data = PersistentData::new();
        assert_eq!(data.get_private(ValueKind::String, "mod.a", "name"), None);
        assert!(!data.set_private("mod.a", "name", "alpha".into()));
        assert!(data.p_string_data.contains_key("mod.a"));
        assert!(!data.p_string_data.contains_key("mod.b"));
        assert!(!data.set_private("mod.b", "name", "beta".into()));
        assert!(data.set_private("mod.a", "name", "alpha2".into()));
        assert_eq!(
            data.get_private(ValueKind::String, "mod.a", "name"),
            Some(PersistentValue::String("alpha2".into()))
        );
        assert_eq!(
            data.get_private(ValueKind::String, "mod.b", "name"),
            Some(PersistentValue::String("beta".into()))
        );
        assert_eq!(data.get_global(ValueKind::String, "name"), None);
    }

    #[test]
    fn kinds_and_scopes_are_orthogonal() {
        let mut data = PersistentData::new();
        assert!(!data.set_global("k", PersistentValue::Int(5)));
        assert!(!data.set_global("k", PersistentValue::String("five".into())));
        assert!(!data.set_private("me", "k", PersistentValue::Int(6)));
        assert!(!data.set_global("k", PersistentValue::IntArray(vec![5])));

        assert_eq!(data.get_typed::<i32>(Scope::Global, "k"), Some(5));
        assert_eq!(data.get_typed::<String>(Scope::Global, "k"), Some("five".to_string()));
        assert_eq!(data.get_typed::<i32>(Scope::Private("me"), "k"), Some(6));
        assert_eq!(data.get_typed::<f32>(Scope::Global, "k"), None);
        assert_eq!(data.get_typed::<Vec<i32>>(Scope::Global, "k"), Some(vec![5]));
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn callers_and_counts() {
        let mut data = PersistentData::new();
        assert!(data.is_empty());
        data.set_private("a", "x", PersistentValue::Bool(true));
        data.set_private("b", "x", PersistentValue::FloatArray(vec![1.0]));
        data.set_private("b", "y", PersistentValue::FloatArray(vec![2.0]));
        data.set_global("x", PersistentValue::FloatArray(vec![]));
        assert_eq!(data.callers().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(data.counts(ValueKind::FloatArray), (1, 2));
        assert_eq!(data.counts(ValueKind::Bool), (0, 1));
    }

    #[test]
    fn json_uses_all_sixteen_field_names() {
        let json = serde_json::to_value(PersistentData::new()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 16);
        for name in [
            "g_string_data",
            "g_int_data",
            "g_float_data",
            "g_bool_data",
            "g_string_data_array",
            "g_int_data_array",
            "g_float_data_array",
            "g_bool_data_array",
            "p_string_data",
            "p_int_data",
            "p_float_data",
            "p_bool_data",
            "p_string_data_array",
            "p_int_data_array",
            "p_float_data_array",
            "p_bool_data_array",
        ] {
            assert_eq!(object.get(name), Some(&serde_json::json!({})), "{name}");
        }
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let data: PersistentData =
            serde_json::from_str(r#"{"g_int_data":{"lives":3}}"#).unwrap();
        assert_eq!(data.get_typed::<i32>(Scope::Global, "lives"), Some(3));
        assert!(data.p_bool_data_array.is_empty());
    }
}
