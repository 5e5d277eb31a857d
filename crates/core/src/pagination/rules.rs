//! Ordered pagination classification rules.
//!
//! Rules are evaluated in [`RULES`] order and the first [`RuleOutcome::Match`]
//! wins. A rule may also [`RuleOutcome::Reject`], which ends classification
//! with no pagination: an `Offset` input with no supporting evidence in the
//! response is not tried against the later rules.

use serde::Serialize;

use super::PaginationKind;
use super::path::{FieldPath, locate, locate_map, sole_object_member};
use crate::config::PaginationConfig;
use crate::manifest::{Field, FieldKind, Object};
use crate::validate::ObjectIndex;

/// Integer field names that directly carry a total count, by priority.
pub const TOTAL_COUNT_NAMES: [&str; 5] = ["TotalCount", "TotalCnt", "TotalNum", "TotalElements", "Total"];

/// Suffixes stripped from the item list name in the associative search.
pub const LIST_SUFFIXES: [&str; 5] = ["Set", "Info", "Infos", "List", "s"];

/// Suffixes appended to the stripped list name in the associative search.
pub const COUNT_SUFFIXES: [&str; 5] = ["Count", "Cnt", "IdNum", "Num", "TotalCount"];

/// Page number field names accepted next to `PageSize`.
pub const PAGE_NUMBER_NAMES: [&str; 5] = ["PageNo", "PageNum", "PageNumber", "PageId", "PageIndex"];

/// The response object holding the item list, and the envelope field it was
/// unwrapped from, if any.
#[derive(Debug, Clone, Copy)]
pub struct Body<'a> {
    /// Object holding the item list.
    pub object: &'a Object,
    /// The response's sole member wrapping `object`.
    pub envelope: Option<&'a Field>,
}

impl Body<'_> {
    /// Response path of a field of the body object.
    pub fn path(&self, field: &Field) -> FieldPath {
        self.lift(FieldPath::of(field))
    }

    fn lift(&self, path: FieldPath) -> FieldPath {
        match self.envelope {
            Some(envelope) => path.within(envelope),
            None => path,
        }
    }
}

/// An action shape that passed the item-list precondition.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Object index for nested lookups.
    pub index: &'a ObjectIndex,
    /// Engine options.
    pub config: PaginationConfig,
    /// Request body.
    pub input: &'a Object,
    /// Response body.
    pub output: &'a Object,
    /// Where the item list lives.
    pub body: Body<'a>,
    /// The sole list field.
    pub list: &'a Field,
    /// Response path of `list`.
    pub items: FieldPath,
}

impl<'a> Candidate<'a> {
    /// Check the precondition: the response has exactly one list field,
    /// possibly after unwrapping a single envelope object.
    pub fn new(
        index: &'a ObjectIndex,
        config: PaginationConfig,
        input: &'a Object,
        output: &'a Object,
    ) -> Option<Self> {
        let (body, list) = sole_list(output, None).or_else(|| {
            let envelope = envelope(output)?;
            sole_list(index.get(&envelope.member)?, Some(envelope))
        })?;

        Some(Self {
            index,
            config,
            input,
            output,
            body,
            list,
            items: body.path(list),
        })
    }
}

fn sole_list<'a>(object: &'a Object, envelope: Option<&'a Field>) -> Option<(Body<'a>, &'a Field)> {
    let mut lists = object.payload_members().filter(|f| f.is_list());
    let list = lists.next()?;
    if lists.next().is_some() {
        return None;
    }
    Some((Body { object, envelope }, list))
}

/// The response's sole non-`RequestId` member, when it is an object.
fn envelope(output: &Object) -> Option<&Field> {
    let mut members = output.payload_members();
    let only = members.next()?;
    (members.next().is_none() && only.is_object()).then_some(only)
}

/// Result of one classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule decided the pagination kind.
    Match(PaginationKind),
    /// The rule does not apply; try the next one.
    NoMatch,
    /// The rule applies but the evidence is insufficient; stop with no
    /// pagination.
    Reject,
}

/// A named classification rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Name used in logs.
    pub name: &'static str,
    /// Pure predicate and constructor.
    pub apply: fn(&Candidate<'_>) -> RuleOutcome,
}

/// Classification rules in priority order.
pub const RULES: [Rule; 3] = [
    Rule {
        name: "offset",
        apply: offset_rule,
    },
    Rule {
        name: "token",
        apply: token_rule,
    },
    Rule {
        name: "paged",
        apply: paged_rule,
    },
];

fn offset_rule(c: &Candidate<'_>) -> RuleOutcome {
    let is_offset = |f: &Field| f.name == "Offset" && f.is_integer();
    let Some(input) = locate(c.index, c.input, is_offset) else {
        return RuleOutcome::NoMatch;
    };

    let limit = locate(c.index, c.output, |f| f.name == "Limit" && f.is_integer());
    let echo = locate(c.index, c.output, is_offset);
    if let (Some(_), Some(output)) = (limit, echo) {
        return RuleOutcome::Match(PaginationKind::Offset {
            input,
            output: Some(output),
        });
    }

    if total_count(c).is_some() || has_offset_evidence(c) {
        RuleOutcome::Match(PaginationKind::Offset {
            input,
            output: None,
        })
    } else {
        RuleOutcome::Reject
    }
}

/// Weaker signs that an `Offset` input pages through the item list.
fn has_offset_evidence(c: &Candidate<'_>) -> bool {
    let payload: Vec<&Field> = c.body.object.payload_members().collect();
    let non_list: Vec<&Field> = payload.iter().copied().filter(|f| !f.is_list()).collect();

    payload.len() == 1
        || (c.list.name == "Items" && c.list.member.ends_with("Item"))
        || matches!(non_list.as_slice(), [only] if only.is_object())
        || c.body.object.member("Total").is_some()
}

fn token_rule(c: &Candidate<'_>) -> RuleOutcome {
    let found = locate_map(c.index, c.input, &mut |f: &Field| {
        if !(f.name.ends_with("Token") || f.name.ends_with("Cursor")) {
            return None;
        }
        let next = format!("Next{}", f.name);
        locate(c.index, c.output, |o| {
            (o.name == f.name || o.name == next) && o.same_type_as(f)
        })
    });

    match found {
        Some((input, output)) => RuleOutcome::Match(PaginationKind::Token { input, output }),
        None => RuleOutcome::NoMatch,
    }
}

fn paged_rule(c: &Candidate<'_>) -> RuleOutcome {
    if locate(c.index, c.input, |f| f.name == "PageSize").is_none() {
        return RuleOutcome::NoMatch;
    }
    locate(c.index, c.input, |f| {
        f.is_integer() && PAGE_NUMBER_NAMES.contains(&f.name.as_str())
    })
    .map_or(RuleOutcome::NoMatch, |input| {
        RuleOutcome::Match(PaginationKind::Paged { input })
    })
}

/// Locate the response's total-count field.
pub fn total_count(c: &Candidate<'_>) -> Option<FieldPath> {
    if let Some(field) = count_field(c.body.object) {
        return Some(c.body.path(field));
    }
    if c.config.associative_total_count {
        return associative_count(c);
    }
    None
}

/// Fixed names first, then a lone count-like integer.
fn count_field(object: &Object) -> Option<&Field> {
    TOTAL_COUNT_NAMES
        .iter()
        .find_map(|name| object.member(name).filter(|f| f.is_integer()))
        .or_else(|| {
            let mut counts = object.payload_members().filter(|f| {
                f.is_integer()
                    && (f.name == "Count" || f.name.starts_with("Total") || f.name.ends_with("Num"))
            });
            let only = counts.next()?;
            counts.next().is_none().then_some(only)
        })
}

/// Derive the count name from the list name (`InstanceSet` ->
/// `InstanceCount`), or look one object level deeper.
fn associative_count(c: &Candidate<'_>) -> Option<FieldPath> {
    let object = c.body.object;
    for stem in LIST_SUFFIXES
        .iter()
        .filter_map(|suffix| c.list.name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
    {
        for suffix in COUNT_SUFFIXES {
            let name = format!("{stem}{suffix}");
            if let Some(field) = object.member(&name).filter(|f| f.is_integer()) {
                return Some(c.body.path(field));
            }
        }
    }

    let parent = sole_object_member(object)?;
    let nested = c.index.get(&parent.member)?;
    let field = count_field(nested)?;
    Some(c.body.lift(FieldPath::of(field).within(parent)))
}

/// How a caller decides whether another page exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", content = "field", rename_all = "snake_case")]
pub enum HasMore {
    /// A boolean flag is true.
    Flag(FieldPath),
    /// An integer flag equals 1.
    EqualsOne(FieldPath),
    /// An integer flag is greater than 0.
    Positive(FieldPath),
    /// The nullable response token is present.
    TokenPresent(FieldPath),
    /// The item list is non-empty.
    NonEmptyItems(FieldPath),
}

/// Derive the has-more predicate for a decided pagination kind.
pub fn has_more(c: &Candidate<'_>, kind: &PaginationKind) -> HasMore {
    if let Some(path) = locate(c.index, c.output, |f| {
        f.name.starts_with("HasNext") && f.kind == FieldKind::Bool
    }) {
        return HasMore::Flag(path);
    }
    if let Some(path) = locate(c.index, c.output, |f| f.name == "HasMore" && f.is_integer()) {
        return HasMore::EqualsOne(path);
    }
    if let Some((path, flag_kind)) = locate_map(c.index, c.output, &mut |f: &Field| {
        (f.name == "HaveMore" && matches!(f.kind, FieldKind::Bool | FieldKind::Int))
            .then_some(f.kind)
    }) {
        return if flag_kind == FieldKind::Bool {
            HasMore::Flag(path)
        } else {
            HasMore::Positive(path)
        };
    }
    if let PaginationKind::Token { output, .. } = kind
        && output.leaf().optional
    {
        return HasMore::TokenPresent(output.clone());
    }
    HasMore::NonEmptyItems(c.items.clone())
}
