//! Interfaces of the collaborators the hub calls into but doesn't implement:
//! template rendering, model persistence and static file lookup.

use crate::error::{BoxError, HubError, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Values a template is rendered with.
pub type Bindings = Map<String, Value>;

/// Renders a named template into text.
#[cfg_attr(test, mockall::automock)]
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, bindings: &Bindings) -> Result<String, BoxError>;
}

/// Column types a model field may be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Unicode,
    Text,
    UnicodeText,
    Date,
    Numeric,
    Time,
    Float,
    DateTime,
    Interval,
    Binary,
    Boolean,
    PickleType,
}

impl FromStr for FieldKind {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "string" | "str" => FieldKind::String,
            "integer" | "int" => FieldKind::Integer,
            "unicode" => FieldKind::Unicode,
            "text" => FieldKind::Text,
            "unicodetext" => FieldKind::UnicodeText,
            "date" => FieldKind::Date,
            "numeric" => FieldKind::Numeric,
            "time" => FieldKind::Time,
            "float" => FieldKind::Float,
            "datetime" => FieldKind::DateTime,
            "interval" => FieldKind::Interval,
            "binary" => FieldKind::Binary,
            "boolean" | "bool" => FieldKind::Boolean,
            "pickletype" => FieldKind::PickleType,
            _ => return Err(HubError::model(format!("'{s}' is not an allowed database column"))),
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub primary_key: bool,
}

/// A model declaration handed to a [`ModelStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    name: String,
    fields: Vec<Field>,
}

impl ModelDef {
    /// Declares a model. An integer `id` primary key always comes first.
    pub fn new<'a, I>(name: impl Into<String>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut declared = vec![Field { name: "id".to_owned(), kind: FieldKind::Integer, primary_key: true }];
        for (field, kind) in fields {
            declared.push(Field { name: field.to_owned(), kind: kind.parse()?, primary_key: false });
        }
        Ok(Self { name: name.into(), fields: declared })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> String {
        format!("{}s", self.name)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl fmt::Display for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.name, self.table_name())
    }
}

/// Persistence for declared models.
pub trait ModelStore: Send + Sync {
    type Query;

    fn define_model(&self, model: ModelDef) -> Result<()>;

    /// Starts a query over every stored instance of `model`.
    fn find(&self, model: &str) -> Result<Self::Query>;
}

/// Maps a captured static file path below `root`.
///
/// Returns `None` for paths that would escape `root`.
pub fn resolve_static(root: &Path, file: &str) -> Option<PathBuf> {
    let relative = Path::new(file.trim_start_matches('/'));
    if relative.components().any(|component| !matches!(component, Component::Normal(_) | Component::CurDir)) {
        return None;
    }
    Some(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::{resolve_static, FieldKind, ModelDef, ModelStore};
    use crate::error::{HubError, Result};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Mutex;

    #[test]
    fn test_field_kind_aliases() {
        assert_eq!("str".parse::<FieldKind>().unwrap(), FieldKind::String);
        assert_eq!("INT".parse::<FieldKind>().unwrap(), FieldKind::Integer);
        assert_eq!("Bool".parse::<FieldKind>().unwrap(), FieldKind::Boolean);
        assert_eq!("pickletype".parse::<FieldKind>().unwrap(), FieldKind::PickleType);
        assert!(matches!("varchar".parse::<FieldKind>(), Err(HubError::Model { .. })));
    }

    #[test]
    fn test_model_def() {
        let model = ModelDef::new("Person", [("name", "string"), ("age", "int")]).unwrap();
        assert_eq!(model.table_name(), "Persons");
        assert_eq!(model.fields().len(), 3);
        assert!(model.fields()[0].primary_key);
        assert_eq!(model.fields()[0].name, "id");
        assert_eq!(model.fields()[2].kind, FieldKind::Integer);
        assert_eq!(model.to_string(), "<Person: Persons>");

        assert!(ModelDef::new("Broken", [("x", "nope")]).is_err());
    }

    #[derive(Default)]
    struct MemoryStore {
        models: Mutex<BTreeMap<String, ModelDef>>,
    }

    impl ModelStore for MemoryStore {
        type Query = Vec<String>;

        fn define_model(&self, model: ModelDef) -> Result<()> {
            self.models.lock().unwrap().insert(model.name().to_owned(), model);
            Ok(())
        }

        fn find(&self, model: &str) -> Result<Self::Query> {
            let models = self.models.lock().unwrap();
            let model = models.get(model).ok_or_else(|| HubError::model(format!("No such model exists ('{model}')")))?;
            Ok(model.fields().iter().map(|field| field.name.clone()).collect())
        }
    }

    #[test]
    fn test_model_store_contract() {
        let store = MemoryStore::default();
        store.define_model(ModelDef::new("Post", [("title", "text")]).unwrap()).unwrap();

        assert_eq!(store.find("Post").unwrap(), ["id", "title"]);
        assert!(store.find("Comment").is_err());
    }

    #[test]
    fn test_resolve_static() {
        let root = Path::new("/srv/static");
        assert_eq!(resolve_static(root, "css/site.css").unwrap(), Path::new("/srv/static/css/site.css"));
        assert_eq!(resolve_static(root, "/img/a.png").unwrap(), Path::new("/srv/static/img/a.png"));
        assert!(resolve_static(root, "../etc/passwd").is_none());
        assert!(resolve_static(root, "css/../../secret").is_none());
    }
}
