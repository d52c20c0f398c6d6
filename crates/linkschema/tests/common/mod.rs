#![allow(dead_code)]

use linkschema::fields::{Hyperlinks, LinkTree, Raw, Text, UrlFor};
use linkschema::{App, Schema};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub author: Option<Author>,
}

pub fn app() -> App {
    App::new()
        .route("/author/<int:id>", "author")
        .unwrap()
        .route("/authors/", "authors")
        .unwrap()
        .route("/books/", "books")
        .unwrap()
        .route("/books/<id>", "book")
        .unwrap()
}

pub fn mock_author() -> Author {
    Author {
        id: 123,
        name: "Fred Douglass".to_string(),
    }
}

pub fn mock_authorlist() -> Vec<Author> {
    vec![
        mock_author(),
        Author {
            id: 124,
            name: "Harriet Jacobs".to_string(),
        },
    ]
}

pub fn mock_book() -> Book {
    Book {
        id: 42,
        title: "Narrative of the Life of Frederick Douglass".to_string(),
        author: Some(mock_author()),
    }
}

pub fn author_schema() -> Schema {
    Schema::new()
        .field("id", Raw::new())
        .field("name", Text::new())
        .field(
            "links",
            Hyperlinks::new(LinkTree::map([
                ("self", UrlFor::new("author").value("id", "<id>")),
                ("collection", UrlFor::new("authors")),
            ])),
        )
}
