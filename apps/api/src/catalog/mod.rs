//! Block Catalog — the read-only pool of block templates, loaded once at startup.
//!
//! Declaration order is significant: the assembler breaks score ties by it, and
//! transforms that synthesize blocks pick the first matching template.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::catalog::{BlockKind, BlockTemplate};

const BUILTIN_CATALOG: &str = include_str!("builtin.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate template id '{0}'")]
    DuplicateId(String),

    #[error("Template '{template}' has an empty variant")]
    EmptyVariant { template: String },

    #[error("Template '{template}' slot '{slot}' has an invalid pattern: {reason}")]
    InvalidPattern {
        template: String,
        slot: String,
        reason: String,
    },

    #[error("Template '{template}' slot '{slot}' has min_len greater than max_len")]
    InvertedBounds { template: String, slot: String },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    templates: Vec<BlockTemplate>,
}

/// Validated, immutable list of templates in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    templates: Vec<BlockTemplate>,
}

impl Catalog {
    /// Validates the templates, compiles their slot patterns and builds a
    /// catalog.
    pub fn new(mut templates: Vec<BlockTemplate>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for template in &templates {
            if !seen.insert(template.id.as_str()) {
                return Err(CatalogError::DuplicateId(template.id.clone()));
            }
        }
        for template in &mut templates {
            prepare_template(template)?;
        }
        Ok(Catalog { templates })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Catalog::new(file.templates)
    }

    /// The catalog embedded in the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Catalog::from_json(BUILTIN_CATALOG)
    }

    /// Loads `path` when given, otherwise the built-in catalog.
    pub fn load(path: Option<&str>) -> Result<Self, CatalogError> {
        let catalog = match path {
            Some(path) => {
                let json = std::fs::read_to_string(Path::new(path)).map_err(|source| {
                    CatalogError::Io {
                        path: path.to_string(),
                        source,
                    }
                })?;
                Catalog::from_json(&json)?
            }
            None => Catalog::builtin()?,
        };
        info!(
            templates = catalog.len(),
            source = path.unwrap_or("builtin"),
            "Block catalog loaded"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> &[BlockTemplate] {
        &self.templates
    }

    /// Templates of `kind` with their declaration index.
    pub fn by_kind(&self, kind: BlockKind) -> impl Iterator<Item = (usize, &BlockTemplate)> {
        self.templates
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.kind == kind)
    }

    pub fn has_kind(&self, kind: BlockKind) -> bool {
        self.by_kind(kind).next().is_some()
    }

    pub fn first_of_kind(&self, kind: BlockKind) -> Option<&BlockTemplate> {
        self.by_kind(kind).map(|(_, t)| t).next()
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&BlockTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// First template of `kind` whose variant equals `variant` (case-insensitive).
    pub fn find_variant(&self, kind: BlockKind, variant: &str) -> Option<&BlockTemplate> {
        self.by_kind(kind)
            .map(|(_, t)| t)
            .find(|t| t.variant.eq_ignore_ascii_case(variant))
    }
}

fn prepare_template(template: &mut BlockTemplate) -> Result<(), CatalogError> {
    if template.variant.trim().is_empty() {
        return Err(CatalogError::EmptyVariant {
            template: template.id.clone(),
        });
    }
    for slot in &mut template.slots {
        if let (Some(min), Some(max)) = (slot.min_len, slot.max_len) {
            if min > max {
                return Err(CatalogError::InvertedBounds {
                    template: template.id.clone(),
                    slot: slot.key.clone(),
                });
            }
        }
        slot.compile_pattern()
            .map_err(|e| CatalogError::InvalidPattern {
                template: template.id.clone(),
                slot: slot.key.clone(),
                reason: e.to_string(),
            })?;
    }
    Ok(())
}
