//! Search document structures and catalog schema

use crate::models::Opinion;
use serde::{Deserialize, Serialize};
use tantivy::schema::*;
use tantivy::TantivyDocument;

pub const FIELD_ID: &str = "id";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_URL: &str = "url";
pub const FIELD_HAS_URL: &str = "has_url";
pub const FIELD_PRODUCT: &str = "product";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_VERSION: &str = "version";
pub const FIELD_OS: &str = "os";
pub const FIELD_LOCALE: &str = "locale";
pub const FIELD_CREATED: &str = "created";

/// Fields matched by the free-text term
pub const TEXT_FIELDS: [&str; 2] = [FIELD_DESCRIPTION, FIELD_URL];

/// Denormalized projection of an opinion, as stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpinionDocument {
    pub id: u64,
    pub description: String,
    pub url: String,
    pub product: u64,
    pub opinion_type: u64,
    pub version: String,
    pub os: String,
    pub locale: String,
    /// Creation time as unix seconds
    pub created: i64,
}

impl From<&Opinion> for OpinionDocument {
    fn from(opinion: &Opinion) -> Self {
        Self {
            id: opinion.id,
            description: opinion.description.clone(),
            url: opinion.url.clone().unwrap_or_default(),
            product: opinion.product.id(),
            opinion_type: opinion.opinion_type.code(),
            version: opinion.version.clone(),
            os: opinion.os.clone(),
            locale: opinion.locale.clone(),
            created: opinion.created.timestamp(),
        }
    }
}

impl OpinionDocument {
    /// Convert to a Tantivy document
    pub fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        if let Ok(field) = schema.get_field(FIELD_ID) {
            doc.add_u64(field, self.id);
        }
        if let Ok(field) = schema.get_field(FIELD_DESCRIPTION) {
            doc.add_text(field, &self.description);
        }
        if !self.url.is_empty() {
            if let Ok(field) = schema.get_field(FIELD_URL) {
                doc.add_text(field, &self.url);
            }
        }
        if let Ok(field) = schema.get_field(FIELD_HAS_URL) {
            doc.add_u64(field, u64::from(!self.url.is_empty()));
        }
        if let Ok(field) = schema.get_field(FIELD_PRODUCT) {
            doc.add_u64(field, self.product);
        }
        if let Ok(field) = schema.get_field(FIELD_TYPE) {
            doc.add_u64(field, self.opinion_type);
        }
        if let Ok(field) = schema.get_field(FIELD_VERSION) {
            doc.add_text(field, &self.version);
        }
        if let Ok(field) = schema.get_field(FIELD_OS) {
            doc.add_text(field, &self.os);
        }
        if let Ok(field) = schema.get_field(FIELD_LOCALE) {
            doc.add_text(field, &self.locale);
        }
        if let Ok(field) = schema.get_field(FIELD_CREATED) {
            doc.add_i64(field, self.created);
        }

        doc
    }
}

/// Build the catalog schema for opinions
pub fn build_opinion_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Primary key, used to hydrate hits from the store
    schema_builder.add_u64_field(FIELD_ID, INDEXED | STORED | FAST);

    // Full-text fields
    schema_builder.add_text_field(FIELD_DESCRIPTION, TEXT);
    schema_builder.add_text_field(FIELD_URL, TEXT);

    // Exact-match filters
    schema_builder.add_u64_field(FIELD_HAS_URL, INDEXED);
    schema_builder.add_u64_field(FIELD_PRODUCT, INDEXED | FAST);
    schema_builder.add_u64_field(FIELD_TYPE, INDEXED | FAST);
    schema_builder.add_text_field(FIELD_VERSION, STRING);
    schema_builder.add_text_field(FIELD_OS, STRING);
    schema_builder.add_text_field(FIELD_LOCALE, STRING);

    // Range filter and sort key
    schema_builder.add_i64_field(FIELD_CREATED, INDEXED | STORED | FAST);

    schema_builder.build()
}
