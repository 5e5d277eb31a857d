//! Pagination inference.
//!
//! Each action's request and response objects are classified into a
//! [`PaginationDecision`]. Classification is a fixed, ordered list of rules
//! ([`rules::RULES`]); the matched kind then determines the has-more check
//! and the [`plan::RequestPlan`] that builds the request for the next page.
//!
//! Finding no pattern is a normal outcome and yields
//! [`PaginationDecision::None`].

pub mod path;
pub mod plan;
pub mod rules;

use serde::Serialize;
use tracing::debug;

pub use path::{FieldPath, PathSegment};
pub use plan::{FieldPlan, FieldUpdate, Operand, RequestPlan, ValuePlan, plan_next_request};
pub use rules::{Candidate, HasMore, Rule, RuleOutcome};

use crate::config::PaginationConfig;
use crate::error::ManifestError;
use crate::manifest::{Action, Object};
use crate::validate::ObjectIndex;

/// Inferred paging strategy with its key paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PaginationKind {
    /// Opaque continuation token copied from the response.
    Token {
        /// Request token field.
        input: FieldPath,
        /// Response token field.
        output: FieldPath,
    },
    /// Numeric offset advanced by the number of items retrieved.
    Offset {
        /// Request offset field.
        input: FieldPath,
        /// Response offset echo, when the response carries one.
        output: Option<FieldPath>,
    },
    /// Page number advanced by one.
    Paged {
        /// Request page number field.
        input: FieldPath,
    },
}

impl PaginationKind {
    /// The request field the next request updates.
    pub fn input(&self) -> &FieldPath {
        match self {
            PaginationKind::Token { input, .. }
            | PaginationKind::Offset { input, .. }
            | PaginationKind::Paged { input } => input,
        }
    }

    /// How the request field gets its next value.
    pub fn update(&self, items: &FieldPath) -> FieldUpdate {
        match self {
            PaginationKind::Token { output, .. } => FieldUpdate::Replace {
                value: Operand::Response(output.clone()),
            },
            PaginationKind::Offset {
                output: Some(echo),
                ..
            } => FieldUpdate::Sum {
                lhs: Operand::Response(echo.clone()),
                rhs: Operand::ItemCount(items.clone()),
            },
            PaginationKind::Offset {
                input,
                output: None,
            } => FieldUpdate::Sum {
                lhs: Operand::Prior(input.clone()),
                rhs: Operand::ItemCount(items.clone()),
            },
            PaginationKind::Paged { input } => FieldUpdate::Sum {
                lhs: Operand::Prior(input.clone()),
                rhs: Operand::One,
            },
        }
    }
}

/// Everything a renderer needs to page through an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Strategy and key paths.
    pub kind: PaginationKind,
    /// Response path of the item list.
    pub items: FieldPath,
    /// Response path of the total count, when one was found.
    pub total_count: Option<FieldPath>,
    /// Has-more check.
    pub has_more: HasMore,
    /// Next-request construction.
    pub next_request: RequestPlan,
}

/// Outcome of pagination inference for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "pagination", rename_all = "snake_case")]
pub enum PaginationDecision {
    /// No paging pattern.
    None,
    /// A paging pattern was found.
    Paginated(Box<Pagination>),
}

impl PaginationDecision {
    /// The pagination details, if any.
    pub fn pagination(&self) -> Option<&Pagination> {
        match self {
            PaginationDecision::None => None,
            PaginationDecision::Paginated(pagination) => Some(pagination),
        }
    }

    /// Whether a paging pattern was found.
    pub fn is_paginated(&self) -> bool {
        matches!(self, PaginationDecision::Paginated(_))
    }
}

/// Infers pagination for the actions of one validated manifest.
#[derive(Debug, Clone, Copy)]
pub struct PaginationEngine<'a> {
    index: &'a ObjectIndex,
    config: PaginationConfig,
}

impl<'a> PaginationEngine<'a> {
    /// Engine over `index`.
    pub fn new(index: &'a ObjectIndex, config: PaginationConfig) -> Self {
        Self { index, config }
    }

    /// Infer pagination for one action.
    pub fn infer(&self, action: &Action) -> Result<PaginationDecision, ManifestError> {
        let input = self
            .index
            .require(&action.input, &format!("action '{}' input", action.name))?;
        let output = self
            .index
            .require(&action.output, &format!("action '{}' output", action.name))?;
        let decision = self.classify(input, output)?;

        match decision.pagination() {
            Some(p) => debug!(
                action = %action.name,
                kind = ?p.kind,
                items = %p.items,
                "Inferred pagination."
            ),
            None => debug!(action = %action.name, "No pagination."),
        }
        Ok(decision)
    }

    /// Classify a request/response pair.
    pub fn classify(
        &self,
        input: &'a Object,
        output: &'a Object,
    ) -> Result<PaginationDecision, ManifestError> {
        let Some(candidate) = Candidate::new(self.index, self.config, input, output) else {
            return Ok(PaginationDecision::None);
        };

        for rule in &rules::RULES {
            match (rule.apply)(&candidate) {
                RuleOutcome::Match(kind) => {
                    debug!(rule = rule.name, output = %output.name, "Pagination rule matched.");
                    return self.decide(&candidate, kind);
                }
                RuleOutcome::Reject => {
                    debug!(rule = rule.name, output = %output.name, "Pagination rule rejected.");
                    return Ok(PaginationDecision::None);
                }
                RuleOutcome::NoMatch => {}
            }
        }
        Ok(PaginationDecision::None)
    }

    fn decide(
        &self,
        candidate: &Candidate<'_>,
        kind: PaginationKind,
    ) -> Result<PaginationDecision, ManifestError> {
        let update = kind.update(&candidate.items);
        let next_request = plan_next_request(self.index, candidate.input, kind.input(), &update)?;

        Ok(PaginationDecision::Paginated(Box::new(Pagination {
            total_count: rules::total_count(candidate),
            has_more: rules::has_more(candidate, &kind),
            items: candidate.items.clone(),
            kind,
            next_request,
        })))
    }
}
