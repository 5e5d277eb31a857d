//! Compilation pipeline: decode -> validate -> resolve -> paginate -> errors.
//!
//! Each manifest is an independent unit of work. [`compile_all`] fans units
//! out over the rayon thread pool; a failing unit yields its own
//! [`CompileError`] and never affects the others.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::CompilerConfig;
use crate::error::{CompileError, ManifestError, ManifestLabel};
use crate::manifest::{
    Action, ActionStatus, Manifest, Metadata, Object, RawManifest, Usage, normalize_manifest,
};
use crate::pagination::{PaginationDecision, PaginationEngine};
use crate::resolve::{CallMode, DateWrapper, FieldType, resolve_field, resolve_type};
use crate::taxonomy::{ErrorCatalog, ErrorTaxonomy};
use crate::validate::{ValidatedManifest, validate};

/// Document format of a manifest source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl SourceFormat {
    /// Format implied by a file extension, if supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(SourceFormat::Json),
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            _ => None,
        }
    }
}

/// One manifest document awaiting compilation.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    /// Where the document came from, used in diagnostics.
    pub origin: String,
    /// Document format.
    pub format: SourceFormat,
    /// Document text.
    pub contents: String,
}

impl ManifestSource {
    /// Parse the document without normalizing it.
    pub fn parse(&self) -> Result<RawManifest, ManifestError> {
        match self.format {
            SourceFormat::Json => RawManifest::from_json(&self.contents),
            SourceFormat::Yaml => RawManifest::from_yaml(&self.contents),
        }
    }

    /// Decode the document into the manifest model.
    pub fn decode(&self) -> Result<Manifest, ManifestError> {
        normalize_manifest(self.parse()?)
    }
}

/// The decision document for one service version.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledService {
    /// Service metadata.
    pub metadata: Metadata,
    /// Actions sorted by name, with their pagination decisions.
    pub actions: Vec<CompiledAction>,
    /// Objects in canonical order with resolved field types.
    pub objects: Vec<CompiledObject>,
    /// Objects left out because no action reaches them.
    pub unreachable: Vec<String>,
    /// Error taxonomy, when an error catalog was supplied.
    pub errors: Option<ErrorTaxonomy>,
}

/// An action with its pagination decision.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledAction {
    /// Action name.
    pub name: String,
    /// Document without the deprecation paragraph.
    pub document: String,
    /// Deprecation paragraph, for non-online actions.
    pub deprecation_message: Option<String>,
    /// Lifecycle status.
    pub status: ActionStatus,
    /// Request body object.
    pub input: String,
    /// Response body object.
    pub output: String,
    /// Inferred pagination.
    pub pagination: PaginationDecision,
}

/// An object with resolved field types.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledObject {
    /// Object name.
    pub name: String,
    /// Assigned usage.
    pub usage: Option<Usage>,
    /// Description.
    pub document: String,
    /// Code members in declaration order.
    pub fields: Vec<CompiledField>,
}

/// A field with its stored and constructor-parameter types.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledField {
    /// Wire name.
    pub name: String,
    /// Description.
    pub document: String,
    /// Type as stored on the model.
    pub stored: FieldType,
    /// Type as a request initializer parameter; request-side objects only.
    pub parameter: Option<FieldType>,
    /// Date encoding tag, for date fields.
    pub date: Option<DateWrapper>,
    /// Authored default.
    pub default: Option<String>,
    /// Authored example.
    pub example: Option<String>,
}

/// Compile a decoded manifest.
pub fn compile(
    manifest: Manifest,
    catalog: Option<&ErrorCatalog>,
    config: &CompilerConfig,
) -> Result<CompiledService, ManifestError> {
    let validated = validate(manifest)?;
    let id = validated.id();

    let objects = validated
        .ordered_objects()
        .map(compile_object)
        .collect::<Result<Vec<_>, _>>()?;
    check_unreachable(&validated)?;

    let engine = PaginationEngine::new(&validated.index, config.pagination);
    let actions = validated
        .actions
        .iter()
        .map(|action| compile_action(&engine, action))
        .collect::<Result<Vec<_>, _>>()?;

    let errors = catalog
        .map(|catalog| ErrorTaxonomy::build(&id, &catalog.for_service(&id), &catalog.common()))
        .transpose()?;

    let ValidatedManifest {
        metadata,
        unreachable,
        ..
    } = validated;

    Ok(CompiledService {
        metadata,
        actions,
        objects,
        unreachable,
        errors,
    })
}

/// Decode and compile one manifest source.
pub fn compile_manifest(
    source: &ManifestSource,
    catalog: Option<&ErrorCatalog>,
    config: &CompilerConfig,
) -> Result<CompiledService, CompileError> {
    let raw = source.parse().map_err(|source_error| CompileError {
        manifest: ManifestLabel::Origin(source.origin.clone()),
        source: source_error,
    })?;
    let label = raw.id().map_or_else(
        || ManifestLabel::Origin(source.origin.clone()),
        ManifestLabel::Known,
    );
    let failed = |source_error| CompileError {
        manifest: label.clone(),
        source: source_error,
    };

    let manifest = normalize_manifest(raw).map_err(failed)?;
    let id = manifest.metadata.id();
    let compiled = compile(manifest, catalog, config).map_err(failed)?;

    info!(
        service = %id,
        origin = %source.origin,
        actions = compiled.actions.len(),
        paginated = compiled.actions.iter().filter(|a| a.pagination.is_paginated()).count(),
        objects = compiled.objects.len(),
        errors = compiled.errors.as_ref().map_or(0, |e| e.all.len()),
        "Compiled manifest."
    );
    Ok(compiled)
}

/// Compile independent manifests in parallel. Results keep input order.
pub fn compile_all(
    sources: &[ManifestSource],
    catalog: Option<&ErrorCatalog>,
    config: &CompilerConfig,
) -> Vec<Result<CompiledService, CompileError>> {
    sources
        .par_iter()
        .map(|source| compile_manifest(source, catalog, config))
        .collect()
}

fn compile_action(
    engine: &PaginationEngine<'_>,
    action: &Action,
) -> Result<CompiledAction, ManifestError> {
    Ok(CompiledAction {
        name: action.name.clone(),
        document: action.document.clone(),
        deprecation_message: action.deprecation_message.clone(),
        status: action.status,
        input: action.input.clone(),
        output: action.output.clone(),
        pagination: engine.infer(action)?,
    })
}

/// Unreachable objects are not emitted, but their fields must still resolve.
fn check_unreachable(validated: &ValidatedManifest) -> Result<(), ManifestError> {
    for name in &validated.unreachable {
        let object = validated.index.require(name, "unreachable object list")?;
        for field in &object.fields {
            resolve_type(&object.name, field)?;
        }
    }
    Ok(())
}

fn compile_object(object: &Object) -> Result<CompiledObject, ManifestError> {
    let takes_parameters = object.usage.is_some_and(|u| u.covers(Usage::Input));
    let mut fields = Vec::new();

    // Disabled and binary fields are checked but not emitted.
    for field in &object.fields {
        let stored = resolve_field(&object.name, field, CallMode::Stored)?;
        if !field.is_code_member() {
            continue;
        }
        let parameter = takes_parameters
            .then(|| resolve_field(&object.name, field, CallMode::ConstructorParameter))
            .transpose()?;
        fields.push(CompiledField {
            name: field.name.clone(),
            document: field.document.clone(),
            date: stored.date_wrapper(),
            stored,
            parameter,
            default: field.default.clone(),
            example: field.example.clone(),
        });
    }

    Ok(CompiledObject {
        name: object.name.clone(),
        usage: object.usage,
        document: object.document.clone(),
        fields,
    })
}
