//! Plain tree types for XML documents
//!
//! A document is represented with three shapes only:
//!
//! - an element is a one-key [`Object`] `{name: children}`,
//! - an attribute is a one-key [`Object`] `{"@name": "value"}`,
//! - text is a [`Value::String`].
//!
//! Children are an [`Array`] of the above, or after folding a single child,
//! an empty string, or a multi-key [`Object`] whose key order is the
//! original child order.

use indexmap::map::{IntoIter, Iter, Keys};
use indexmap::IndexMap;
use std::ops::Index;

/// Prefix of attribute keys. `@` cannot start an XML name.
pub const ATTRIBUTE_MARKER: char = '@';

/// A plain tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text content
    String(String),
    /// Ordered children
    Array(Array),
    /// Element, attribute or folded children
    Object(Object),
}

impl Default for Value {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl Value {
    /// Build an element node `{name: children}`
    pub fn element(name: impl Into<String>, children: impl Into<Self>) -> Self {
        let mut obj = Object::with_capacity(1);
        obj.insert(name, children);
        Self::Object(obj)
    }

    /// Build an attribute node `{"@name": value}`
    pub fn attribute(name: &str, value: impl Into<String>) -> Self {
        let mut obj = Object::with_capacity(1);
        obj.insert(attribute_key(name), Self::String(value.into()));
        Self::Object(obj)
    }

    /// Returns true if this value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns true if this value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns true if this value is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns the string value if this is a string, None otherwise
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array if this is an array, None otherwise
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the object if this is an object, None otherwise
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The `(key, value)` pair of a one-key object
    pub fn single_entry(&self) -> Option<(&str, &Self)> {
        match self {
            Self::Object(o) if o.len() == 1 => o.iter().next().map(|(k, v)| (k.as_str(), v)),
            _ => None,
        }
    }
}

/// Key used for an attribute named `name`
pub fn attribute_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 1);
    key.push(ATTRIBUTE_MARKER);
    key.push_str(name);
    key
}

/// Attribute name for `key`, or None if `key` names an element
pub fn attribute_name(key: &str) -> Option<&str> {
    key.strip_prefix(ATTRIBUTE_MARKER)
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(Array(values))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Object(Object(map))
    }
}

/// An order-preserving map of string keys to values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Object(pub(crate) IndexMap<String, Value>);

impl Object {
    /// Creates a new empty object
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Creates a new object with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Returns the number of key-value pairs in the object
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the object contains no key-value pairs
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the value corresponding to the key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a key-value pair at the end of the object.
    /// Returns the previous value if the key already existed, in which
    /// case the key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns an iterator over the keys
    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over key-value pairs
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl Index<&str> for Object {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, key: &str) -> &Self::Output {
        &self.0[key]
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<IndexMap<String, Value>> for Object {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

/// An ordered sequence of values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Array(pub(crate) Vec<Value>);

impl Array {
    /// Creates a new empty array
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the number of elements in the array
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the array contains no elements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the element at the given index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Appends an element to the end of the array
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// Returns an iterator over the array
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl Index<usize> for Array {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(Vec::from_iter(iter))
    }
}
