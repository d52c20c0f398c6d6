use serde_json::{Map, Value};

use super::{AbsoluteUrlFor, Field, FieldOptions, UrlFor};
use crate::app::App;
use crate::error::Result;
use crate::routing::Router;
use crate::upload::Input;

/// Declared shape of a [`Hyperlinks`] field.
///
/// Links can sit anywhere inside nested maps and lists; everything else is
/// copied to the output unchanged.
#[derive(Debug)]
pub enum LinkTree {
    Link(UrlFor),
    List(Vec<LinkTree>),
    /// Keys keep their declaration order.
    Map(Vec<(String, LinkTree)>),
    Literal(Value),
}

impl LinkTree {
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<LinkTree>,
        I: IntoIterator<Item = (K, V)>,
    {
        LinkTree::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<LinkTree>,
        I: IntoIterator<Item = V>,
    {
        LinkTree::List(items.into_iter().map(Into::into).collect())
    }

    /// Replace every link with its URL for `obj`, keeping the shape.
    pub fn render(&self, obj: &Value, router: &dyn Router) -> Result<Value> {
        match self {
            LinkTree::Link(link) => link.render(obj, router),
            LinkTree::List(items) => items
                .iter()
                .map(|item| item.render(obj, router))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            LinkTree::Map(entries) => {
                let mut rendered = Map::new();
                for (key, value) in entries {
                    rendered.insert(key.clone(), value.render(obj, router)?);
                }
                Ok(Value::Object(rendered))
            }
            LinkTree::Literal(value) => Ok(value.clone()),
        }
    }
}

impl From<UrlFor> for LinkTree {
    fn from(link: UrlFor) -> Self {
        LinkTree::Link(link)
    }
}

impl From<AbsoluteUrlFor> for LinkTree {
    fn from(link: AbsoluteUrlFor) -> Self {
        LinkTree::Link(link.into_inner())
    }
}

impl From<Value> for LinkTree {
    fn from(value: Value) -> Self {
        LinkTree::Literal(value)
    }
}

impl From<&str> for LinkTree {
    fn from(value: &str) -> Self {
        LinkTree::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for LinkTree {
    fn from(value: String) -> Self {
        LinkTree::Literal(Value::String(value))
    }
}

/// Outputs a map (or list) of hyperlinks.
///
/// ```
/// use linkschema::fields::{Hyperlinks, LinkTree, UrlFor};
///
/// let links = Hyperlinks::new(LinkTree::map([
///     ("self", UrlFor::new("author").value("id", "<id>")),
///     ("collection", UrlFor::new("authors")),
/// ]));
///
/// let detailed = Hyperlinks::new(LinkTree::map([(
///     "self",
///     LinkTree::map([
///         ("href", LinkTree::from(UrlFor::new("book").value("id", "<id>"))),
///         ("title", LinkTree::from("book detail")),
///     ]),
/// )]));
/// ```
#[derive(Debug)]
pub struct Hyperlinks {
    schema: LinkTree,
    options: FieldOptions,
}

impl Hyperlinks {
    pub fn new(schema: impl Into<LinkTree>) -> Self {
        Self {
            schema: schema.into(),
            options: FieldOptions::default(),
        }
    }

    pub fn schema(&self) -> &LinkTree {
        &self.schema
    }
}

impl Field for Hyperlinks {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn reads_attribute(&self) -> bool {
        false
    }

    fn format(&self, _value: Option<&Value>, _name: &str, obj: &Value, app: &App) -> Result<Value> {
        self.schema.render(obj, &app.router())
    }

    fn convert(&self, input: Input, _app: &mut App) -> Result<Option<Input>> {
        Ok(Some(input))
    }
}
