//! Database schema discovery results and metadata-to-property mapping.

use chrono::NaiveDate;

use crate::{error::PublishError, format::format_duration, types::VideoMetadata};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Url,
    Number,
    Date,
    Other(String),
}

impl PropertyKind {
    /// Map a Notion property `type` string.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "title" => PropertyKind::Title,
            "rich_text" => PropertyKind::RichText,
            "url" => PropertyKind::Url,
            "number" => PropertyKind::Number,
            "date" => PropertyKind::Date,
            other => PropertyKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Property list of the target database, as discovered at publish time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub properties: Vec<PropertyDescriptor>,
}

impl DatabaseSchema {
    pub fn new(properties: Vec<PropertyDescriptor>) -> Self {
        Self { properties }
    }

    /// The property that holds the page title. A `title`-typed property named
    /// like a title wins over any other `title`-typed property.
    pub fn title_property(&self) -> Option<&PropertyDescriptor> {
        let titles = || {
            self.properties
                .iter()
                .filter(|p| p.kind == PropertyKind::Title)
        };
        titles()
            .find(|p| SemanticField::Title.matches_name(&p.name))
            .or_else(|| titles().next())
    }
}

/// What a page property can carry, independent of its name in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticField {
    Title,
    Url,
    Summary,
    Author,
    Duration,
    Views,
    Published,
}

impl SemanticField {
    pub const ALL: [SemanticField; 7] = [
        SemanticField::Title,
        SemanticField::Url,
        SemanticField::Summary,
        SemanticField::Author,
        SemanticField::Duration,
        SemanticField::Views,
        SemanticField::Published,
    ];

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            SemanticField::Title => &["name", "title"],
            SemanticField::Url => &["url", "video url", "link"],
            SemanticField::Summary => &["summary", "content"],
            SemanticField::Author => &["channel", "author"],
            SemanticField::Duration => &["duration", "length"],
            SemanticField::Views => &["views", "view count"],
            SemanticField::Published => &["published date", "publish date", "published"],
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.aliases().contains(&name.as_str())
    }

    /// Property kinds this field can be written to.
    pub fn accepts(&self, kind: &PropertyKind) -> bool {
        use PropertyKind::*;
        match self {
            SemanticField::Title => *kind == Title,
            SemanticField::Url => matches!(kind, Url | RichText),
            SemanticField::Summary | SemanticField::Author => *kind == RichText,
            SemanticField::Duration | SemanticField::Views => matches!(kind, Number | RichText),
            SemanticField::Published => matches!(kind, Date | RichText),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Url(String),
    Number(f64),
    Date(NaiveDate),
}

/// Everything a page's properties can be filled from.
#[derive(Debug, Clone)]
pub struct PageFields<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub summary_preview: &'a str,
    pub metadata: &'a VideoMetadata,
}

impl PageFields<'_> {
    fn value(&self, field: SemanticField, kind: &PropertyKind) -> Option<PropertyValue> {
        let text = |s: &str| (!s.is_empty()).then(|| PropertyValue::RichText(s.to_string()));
        let meta = self.metadata;

        match (field, kind) {
            (SemanticField::Title, _) => Some(PropertyValue::Title(self.title.to_string())),
            (SemanticField::Url, PropertyKind::Url) => Some(PropertyValue::Url(self.url.to_string())),
            (SemanticField::Url, _) => text(self.url),
            (SemanticField::Summary, _) => text(self.summary_preview),
            (SemanticField::Author, _) => meta.author.as_deref().and_then(text),
            (SemanticField::Duration, PropertyKind::Number) => {
                meta.duration_seconds.map(|d| PropertyValue::Number(d as f64))
            }
            (SemanticField::Duration, _) => meta
                .duration_seconds
                .map(|d| PropertyValue::RichText(format_duration(d))),
            (SemanticField::Views, PropertyKind::Number) => {
                meta.view_count.map(|v| PropertyValue::Number(v as f64))
            }
            (SemanticField::Views, _) => meta.view_count.map(|v| PropertyValue::RichText(v.to_string())),
            (SemanticField::Published, PropertyKind::Date) => meta.published.map(PropertyValue::Date),
            (SemanticField::Published, _) => meta
                .published
                .map(|d| PropertyValue::RichText(d.format("%Y-%m-%d").to_string())),
        }
    }
}

/// Map page fields onto the schema's properties.
///
/// A property is filled only when its name is a known alias of a field and
/// its type can hold that field; everything else is left untouched. Fails
/// when the schema has no title property, since no page can be created then.
pub fn map_properties(
    schema: &DatabaseSchema,
    fields: &PageFields<'_>,
) -> Result<Vec<(String, PropertyValue)>, PublishError> {
    let title = schema
        .title_property()
        .ok_or_else(|| PublishError::SchemaIncompatible {
            reason: "database has no title property".to_string(),
        })?;

    let mut mapped = vec![(
        title.name.clone(),
        PropertyValue::Title(fields.title.to_string()),
    )];

    for property in &schema.properties {
        if property.name == title.name || property.kind == PropertyKind::Title {
            continue;
        }
        let value = SemanticField::ALL
            .into_iter()
            .filter(|field| *field != SemanticField::Title)
            .find(|field| field.matches_name(&property.name) && field.accepts(&property.kind))
            .and_then(|field| fields.value(field, &property.kind));
        if let Some(value) = value {
            mapped.push((property.name.clone(), value));
        }
    }

    Ok(mapped)
}
