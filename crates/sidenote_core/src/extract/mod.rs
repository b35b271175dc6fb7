//! Entity identifier extraction heuristics.
//!
//! # Responsibility
//! - Infer the opaque entity identifier from ambiguous host markup.
//! - Keep every heuristic a pure function over tree state so the cascade is
//!   unit-testable without a live page.
//!
//! # Invariants
//! - Stages run in a fixed order; the first successful stage wins.
//! - Specific URL patterns are always tried before the generic long-numeric
//!   fallback, at every stage.
//! - No stage guesses: a subtree without a qualifying attribute yields
//!   `None` and the caller skips that surface.

use crate::dom::{NodeId, PageTree};
use crate::store::EntityId;
use once_cell::sync::Lazy;
use regex::Regex;

static AVATAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"avatars/(\d+)").expect("valid avatar regex"));
static BANNER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"banners/(\d+)").expect("valid banner regex"));
static USER_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/users/(\d+)").expect("valid user path regex"));
static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// Platform identifiers are snowflake-style tokens of 15 to 25 digits;
/// shorter runs are timestamps, counters or asset sizes.
const GENERIC_TOKEN_MIN_DIGITS: usize = 15;
const GENERIC_TOKEN_MAX_DIGITS: usize = 25;

/// Element tags treated as media carriers for the avatar/banner stage.
const MEDIA_TAGS: &[&str] = &["img", "image", "video", "source"];

/// Attribute names conventionally used by the host to carry user/author ids.
const ID_BEARING_ATTRS: &[&str] = &["data-user-id", "data-author-id", "user-id"];

/// Attributes whose values are addresses (or address lists).
const URL_ATTRS: &[&str] = &["src", "srcset", "href"];

/// Identifying or labelling attributes scanned as a last resort before
/// inline styles.
const LABEL_ATTRS: &[&str] = &["id", "aria-label", "aria-labelledby", "data-list-item-id"];

/// Extracts the best-guess entity identifier from the subtree at `scope`.
///
/// Pure with respect to the store; reads only tree state reachable from
/// `scope`. Returns `None` when no heuristic matches — callers must treat
/// that as "skip this element", never as licence to guess.
pub fn extract(tree: &PageTree, scope: NodeId) -> Option<EntityId> {
    const STAGES: &[fn(&PageTree, NodeId) -> Option<EntityId>] = &[
        media_path_stage,
        id_attribute_stage,
        url_attribute_stage,
        label_attribute_stage,
        inline_style_stage,
    ];
    STAGES.iter().find_map(|stage| stage(tree, scope))
}

/// Extracts an identifier scanning the whole document.
pub fn extract_in_document(tree: &PageTree) -> Option<EntityId> {
    extract(tree, tree.root())
}

/// Stage 1: media elements whose address contains an `avatars/` or
/// `banners/` path segment.
fn media_path_stage(tree: &PageTree, scope: NodeId) -> Option<EntityId> {
    for node in tree.subtree(scope) {
        if !MEDIA_TAGS.contains(&tree.tag(node)) {
            continue;
        }
        let Some(src) = tree.attr(node, "src") else {
            continue;
        };
        if let Some(id) = match_specific(src) {
            return Some(id);
        }
    }
    None
}

/// Stage 2: enumerated identifier-bearing data attributes.
fn id_attribute_stage(tree: &PageTree, scope: NodeId) -> Option<EntityId> {
    match_attrs(tree, scope, ID_BEARING_ATTRS)
}

/// Stage 3: any URL-bearing attribute. For `srcset` only the first
/// comma-separated candidate is considered.
fn url_attribute_stage(tree: &PageTree, scope: NodeId) -> Option<EntityId> {
    for node in tree.subtree(scope) {
        for attr in URL_ATTRS {
            let Some(value) = tree.attr(node, attr) else {
                continue;
            };
            let candidate = if *attr == "srcset" {
                first_srcset_candidate(value)
            } else {
                value
            };
            if let Some(id) = match_token(candidate) {
                return Some(id);
            }
        }
    }
    None
}

/// Stage 4: identifying or labelling attributes.
fn label_attribute_stage(tree: &PageTree, scope: NodeId) -> Option<EntityId> {
    match_attrs(tree, scope, LABEL_ATTRS)
}

/// Stage 5: inline positional styling that embeds a URL.
fn inline_style_stage(tree: &PageTree, scope: NodeId) -> Option<EntityId> {
    for node in tree.subtree(scope) {
        let Some(style) = tree.attr(node, "style") else {
            continue;
        };
        if !style.contains("url(") {
            continue;
        }
        if let Some(id) = match_token(style) {
            return Some(id);
        }
    }
    None
}

fn match_attrs(tree: &PageTree, scope: NodeId, attrs: &[&str]) -> Option<EntityId> {
    for node in tree.subtree(scope) {
        for attr in attrs {
            let Some(value) = tree.attr(node, attr) else {
                continue;
            };
            if let Some(id) = match_token(value) {
                return Some(id);
            }
        }
    }
    None
}

/// Two-stage token match: specific address patterns first, generic long
/// numeric run second. Ordering avoids false positives from unrelated large
/// numbers embedded in the same value.
fn match_token(text: &str) -> Option<EntityId> {
    match_specific(text).or_else(|| match_generic(text))
}

fn match_specific(text: &str) -> Option<EntityId> {
    for pattern in [&*AVATAR_RE, &*BANNER_RE, &*USER_PATH_RE] {
        if let Some(caps) = pattern.captures(text) {
            if let Some(found) = caps.get(1) {
                return Some(EntityId::new(found.as_str()));
            }
        }
    }
    None
}

fn match_generic(text: &str) -> Option<EntityId> {
    DIGIT_RUN_RE
        .find_iter(text)
        .map(|found| found.as_str())
        .find(|run| {
            (GENERIC_TOKEN_MIN_DIGITS..=GENERIC_TOKEN_MAX_DIGITS).contains(&run.len())
        })
        .map(EntityId::new)
}

fn first_srcset_candidate(srcset: &str) -> &str {
    let first = srcset.split(',').next().unwrap_or(srcset);
    first.split_whitespace().next().unwrap_or(first)
}
