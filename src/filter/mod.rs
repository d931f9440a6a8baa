//! Object lists: named selections of simulation entities.

pub mod id_group;

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

pub use id_group::{IdGroup, IdGroupError};

use crate::{
    core::{EntityCategory, EntityId, EntityRef},
    host::EntityRegistry,
    types::{Validate, ValidationResult},
    validation_utils::{_chain, _return, validate_name},
};

/// A named entity filter (object list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFilter {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@referenceType")]
    pub category: EntityCategory,
    #[serde(rename = "@ids", default)]
    pub ids: IdGroup,
    /// Only keep entities whose model kind equals this string.
    #[serde(rename = "@filterKind", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl EntityFilter {
    pub fn new<S: Into<String>>(name: S, category: EntityCategory, ids: IdGroup) -> Self {
        EntityFilter {
            name: name.into(),
            category,
            ids,
            kind: None,
        }
    }

    pub fn with_kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Selects the entities this filter matches.
    ///
    /// Singleton categories always yield the single "no entity" marker.
    /// Explicitly listed ids are kept even when the registry does not know
    /// them, so that the binder reports them as unresolved.
    pub fn resolve<R: EntityRegistry + ?Sized>(&self, registry: &R) -> ResolvedFilter {
        if self.category.is_singleton() {
            return ResolvedFilter {
                category: self.category,
                wildcard: self.ids.is_all(),
                entities: vec![EntityRef::none(self.category)],
            };
        }

        let mut ids: BTreeSet<EntityId> = registry
            .entity_ids(self.category)
            .into_iter()
            .filter(|id| self.ids.contains(*id))
            .collect();
        ids.extend(self.ids.explicit_ids());

        if let Some(kind) = &self.kind {
            ids.retain(|id| registry.entity_kind(self.category, *id).as_deref() == Some(kind));
        }

        debug!(
            "Object list '{}' selects {} {} entities",
            self.name,
            ids.len(),
            self.category
        );

        ResolvedFilter {
            category: self.category,
            wildcard: self.ids.is_all(),
            entities: ids
                .into_iter()
                .map(|id| EntityRef::new(self.category, id))
                .collect(),
        }
    }
}

impl Validate for EntityFilter {
    fn validate(&self) -> ValidationResult {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        _chain(validate_name(&self.name, "Object list"), &mut warnings, &mut errors);

        if self.ids.is_empty() && !self.category.is_singleton() {
            warnings.push(format!(
                "Object list '{}' does not select any {} ids.",
                self.name, self.category
            ));
        }
        if matches!(&self.kind, Some(kind) if kind.trim().is_empty()) {
            errors.push(format!("Object list '{}' has an empty filterKind.", self.name));
        }

        _return(warnings, errors)
    }
}

/// Entities selected by an [`EntityFilter`], sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub category: EntityCategory,
    /// True when the filter selected `*`.
    pub wildcard: bool,
    pub entities: Vec<EntityRef>,
}
