//! OpenAPI 3.0 document generation.
//!
//! Every registered route becomes an operation. Path parameters are declared
//! automatically; summaries, descriptions, tags and body schemas come from the
//! [`RouteDoc`] attached with [`App::doc`](crate::App::doc).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::app::{RouteGroup, RouteInfo};
use crate::config::DocsConfig;

const JSON: &str = "application/json";

/// Documentation metadata for a route or a group of routes.
///
/// ```rust
/// use bolt::docs::{RouteDoc, Schema};
///
/// let doc = RouteDoc::new()
///     .summary("Create a user")
///     .tag("users")
///     .request("NewUser", Schema::object().property("name", Schema::string(), true))
///     .response("User", Schema::object().property("id", Schema::integer(), true));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDoc {
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub request: Option<NamedSchema>,
    pub response: Option<NamedSchema>,
}

impl RouteDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Documents the JSON request body, registered under `name` in the
    /// document's components.
    pub fn request(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.request = Some(NamedSchema {
            name: name.into(),
            schema,
        });
        self
    }

    /// Documents the JSON body of the `200` response.
    pub fn response(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.response = Some(NamedSchema {
            name: name.into(),
            schema,
        });
        self
    }
}

/// A schema registered under a component name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSchema {
    pub name: String,
    pub schema: Schema,
}

/// OpenAPI 3.0 document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenApi {
    pub openapi: String,
    pub info: Info,
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
    #[serde(skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Components {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// A JSON schema, written by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Schema {
    fn of(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_owned()),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of("string")
    }

    pub fn integer() -> Self {
        Self::of("integer")
    }

    pub fn number() -> Self {
        Self::of("number")
    }

    pub fn boolean() -> Self {
        Self::of("boolean")
    }

    pub fn object() -> Self {
        Self::of("object")
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of("array")
        }
    }

    /// A reference to the component schema `name`.
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", name)),
            ..Self::default()
        }
    }

    /// Adds an object property.
    pub fn property(mut self, name: impl Into<String>, schema: Schema, required: bool) -> Self {
        let name = name.into();
        if required {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }
}

/// Builds the document for a set of registered routes.
pub(crate) fn generate(config: &DocsConfig, routes: &[RouteInfo], groups: &[RouteGroup]) -> OpenApi {
    let mut spec = OpenApi {
        openapi: "3.0.0".to_owned(),
        info: Info {
            title: config.title.clone(),
            description: config.description.clone(),
            version: config.version.clone(),
        },
        paths: BTreeMap::new(),
        components: Components::default(),
        tags: Vec::new(),
    };

    // one top-level tag per group that has routes
    let mut tagged = vec![false; groups.len()];
    for group in routes.iter().filter_map(|route| route.group) {
        if tagged[group] {
            continue;
        }
        tagged[group] = true;

        if let Some(name) = group_tag(&groups[group].prefix) {
            spec.tags.push(Tag {
                name: name.to_owned(),
                description: groups[group].doc.summary.clone(),
            });
        }
    }

    for route in routes {
        let (path, params) = openapi_path(&route.path);
        let mut operation = Operation {
            summary: route.doc.summary.clone(),
            description: route.doc.description.clone(),
            ..Operation::default()
        };

        if let Some(group) = route.group.map(|i| &groups[i]) {
            operation.tags.extend(group_tag(&group.prefix).map(str::to_owned));
            operation.tags.extend(group.doc.tags.iter().cloned());

            if !group.doc.description.is_empty() {
                operation.description = if operation.description.is_empty() {
                    group.doc.description.clone()
                } else {
                    format!("{}\n\n{}", group.doc.description, operation.description)
                };
            }
        }
        operation.tags.extend(route.doc.tags.iter().cloned());

        operation.parameters = params
            .into_iter()
            .map(|name| Parameter {
                name,
                location: "path".to_owned(),
                required: true,
                schema: Schema::string(),
            })
            .collect();

        if let Some(request) = &route.doc.request {
            spec.components
                .schemas
                .insert(request.name.clone(), request.schema.clone());
            operation.request_body = Some(RequestBody {
                required: true,
                content: json_content(&request.name),
            });
        }

        let content = match &route.doc.response {
            Some(response) => {
                spec.components
                    .schemas
                    .insert(response.name.clone(), response.schema.clone());
                json_content(&response.name)
            }
            None => BTreeMap::new(),
        };
        operation.responses.insert(
            "200".to_owned(),
            Response {
                description: "Success".to_owned(),
                content,
            },
        );

        spec.paths
            .entry(path)
            .or_default()
            .insert(route.method.as_str().to_ascii_lowercase(), operation);
    }

    spec
}

fn json_content(schema: &str) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(
        JSON.to_owned(),
        MediaType {
            schema: Schema::reference(schema),
        },
    );
    content
}

// "/api/v1/" => "v1"
fn group_tag(prefix: &str) -> Option<&str> {
    prefix
        .trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|tag| !tag.is_empty())
}

// "/users/:id/*rest" => ("/users/{id}/{rest}", ["id", "rest"])
fn openapi_path(route: &str) -> (String, Vec<String>) {
    let mut path = String::with_capacity(route.len() + 2);
    let mut params = Vec::new();

    let mut rest = route;
    while let Some(start) = rest.find(|c: char| c == ':' || c == '*') {
        path.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('/').unwrap_or(after.len());
        let name = &after[..end];

        path.push('{');
        path.push_str(name);
        path.push('}');
        params.push(name.to_owned());
        rest = &after[end..];
    }
    path.push_str(rest);

    (path, params)
}
