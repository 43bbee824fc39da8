//! Design documents: named groups of map/reduce views.
//!
//! Every view carries two renditions of its map function: the JavaScript
//! source installed on a CouchDB server and a native closure used by
//! backends that evaluate views in-process. Both must emit the same rows.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value, json};

/// Collects the `(key, value)` rows a map function emits for one document.
#[derive(Debug, Default)]
pub struct Emitter {
    rows: Vec<(Value, Value)>,
}

impl Emitter {
    /// Emits one row.
    pub fn emit(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.rows.push((key.into(), value.into()));
    }

    /// Consumes the emitter and returns the emitted rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<(Value, Value)> {
        self.rows
    }
}

/// Native map function.
pub type MapFn = Arc<dyn Fn(&Value, &mut Emitter) + Send + Sync>;

/// Built-in reduce functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinReduce {
    /// Number of emitted rows (`_count`).
    Count,
}

impl BuiltinReduce {
    /// Server-side name of the reduce function.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "_count",
        }
    }
}

/// A single view inside a design document.
#[derive(Clone)]
pub struct ViewDefinition {
    name: String,
    map_source: String,
    reduce: Option<BuiltinReduce>,
    map: MapFn,
}

impl ViewDefinition {
    /// Creates a view from its JavaScript source and native map closure.
    pub fn new<F>(name: impl Into<String>, map_source: impl Into<String>, map: F) -> Self
    where
        F: Fn(&Value, &mut Emitter) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            map_source: map_source.into(),
            reduce: None,
            map: Arc::new(map),
        }
    }

    /// Attaches a built-in reduce function.
    #[must_use]
    pub fn with_reduce(mut self, reduce: BuiltinReduce) -> Self {
        self.reduce = Some(reduce);
        self
    }

    /// View name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// JavaScript source of the map function.
    #[must_use]
    pub fn map_source(&self) -> &str {
        &self.map_source
    }

    /// Reduce function, if any.
    #[must_use]
    pub fn reduce(&self) -> Option<BuiltinReduce> {
        self.reduce
    }

    /// Runs the native map function over one document.
    #[must_use]
    pub fn map(&self, document: &Value) -> Vec<(Value, Value)> {
        let mut emitter = Emitter::default();
        (self.map)(document, &mut emitter);
        emitter.into_rows()
    }
}

impl fmt::Debug for ViewDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDefinition")
            .field("name", &self.name)
            .field("reduce", &self.reduce)
            .finish_non_exhaustive()
    }
}

/// A named collection of views installed as `_design/{name}`.
#[derive(Debug, Clone)]
pub struct DesignDocument {
    name: String,
    views: Vec<ViewDefinition>,
}

impl DesignDocument {
    /// Creates an empty design document.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: Vec::new(),
        }
    }

    /// Adds a view. A later view with the same name replaces the earlier one.
    #[must_use]
    pub fn with_view(mut self, view: ViewDefinition) -> Self {
        self.views.retain(|existing| existing.name != view.name);
        self.views.push(view);
        self
    }

    /// Design document name (without prefix).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document ID (`_design/{name}`).
    #[must_use]
    pub fn id(&self) -> String {
        format!("_design/{}", self.name)
    }

    /// All views.
    #[must_use]
    pub fn views(&self) -> &[ViewDefinition] {
        &self.views
    }

    /// Looks up a view by name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.iter().find(|view| view.name == name)
    }

    /// Server representation of the design document, without `_rev`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut views = Map::new();
        for view in &self.views {
            let mut body = Map::new();
            body.insert("map".into(), Value::String(view.map_source.clone()));
            if let Some(reduce) = view.reduce {
                body.insert("reduce".into(), Value::String(reduce.as_str().into()));
            }
            views.insert(view.name.clone(), Value::Object(body));
        }

        json!({
            "_id": self.id(),
            "language": "javascript",
            "views": views,
        })
    }
}
