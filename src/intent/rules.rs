//! Rule-based recognizer.
//!
//! Explicit `tool_name: ...` hints take priority and each one opens a segment.
//! Text is split into clauses at conjunctions and sentence punctuation, and
//! each clause is classified by the keywords its words share with the
//! registered tools. A hint's segment runs until the next hint or the first
//! later clause that points at a different tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::extract;
use super::text::{Word, find_phrase, span, words};
use super::{IntentRecognizer, Invocation};
use crate::error::AgentResult;
use crate::tools::{ToolRegistry, ToolSpec};

const CONJUNCTIONS: &[&str] = &["and", "then", "also", "plus"];

/// Keyword and hint matcher; needs no external service.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleRecognizer;

/// A run of query text attributed to one tool, as a byte range.
struct Segment {
    spec: Arc<ToolSpec>,
    start: usize,
    end: usize,
}

/// An explicit `tool_name:` marker.
struct Hint {
    word: usize,
    body_start: usize,
    spec: Arc<ToolSpec>,
}

impl RuleRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`IntentRecognizer::recognize`].
    pub fn recognize_text(&self, query: &str, registry: &ToolRegistry) -> Vec<Invocation> {
        let w = words(query);
        let hints = explicit_hints(&w, registry);

        let implicit_end = hints.first().map_or(w.len(), |h| h.word);
        let mut segments = implicit_segments(query, &w[..implicit_end], registry);

        for (k, hint) in hints.iter().enumerate() {
            let body_from = hint.word + 1;
            let body_to = hints.get(k + 1).map_or(w.len(), |next| next.word);
            let body = &w[body_from..body_to];

            // The first clause always belongs to the hint.
            let body_clauses = clauses(body);
            let handover = body_clauses.iter().skip(1).position(|&(from, to)| {
                classify(&body[from..to], registry).is_some_and(|spec| spec.name != hint.spec.name)
            });

            match handover.map(|p| p + 1) {
                Some(j) => {
                    let last_word = body_clauses[j - 1].1 - 1;
                    segments.push(Segment {
                        spec: hint.spec.clone(),
                        start: hint.body_start,
                        end: body[last_word].end,
                    });
                    let rest = &w[body_from + body_clauses[j].0..body_to];
                    segments.extend(implicit_segments(query, rest, registry));
                }
                None => segments.push(Segment {
                    spec: hint.spec.clone(),
                    start: hint.body_start,
                    end: hints
                        .get(k + 1)
                        .map_or(query.len(), |next| w[next.word].start),
                }),
            }
        }

        segments
            .into_iter()
            .map(|segment| {
                let text = query[segment.start..segment.end].trim();
                let (args, missing) = extract::arguments(&segment.spec, text);
                debug!(
                    tool = %segment.spec.name,
                    segment = text,
                    missing = ?missing,
                    "Recognized intent"
                );
                Invocation {
                    tool: segment.spec.name.clone(),
                    args,
                    missing,
                }
            })
            .collect()
    }
}

#[async_trait]
impl IntentRecognizer for RuleRecognizer {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn recognize(&self, query: &str, registry: &ToolRegistry) -> AgentResult<Vec<Invocation>> {
        Ok(self.recognize_text(query, registry))
    }
}

fn explicit_hints(w: &[Word<'_>], registry: &ToolRegistry) -> Vec<Hint> {
    let mut hints = Vec::new();
    for (i, word) in w.iter().enumerate() {
        let Some(colon) = word.raw.find(':') else {
            continue;
        };
        let prefix = word.raw[..colon].trim_start_matches(|c: char| !(c.is_alphanumeric() || c == '_'));
        if prefix.is_empty() {
            continue;
        }
        if let Some(spec) = registry.lookup(prefix) {
            hints.push(Hint {
                word: i,
                body_start: word.start + colon + 1,
                spec: spec.clone(),
            });
        }
    }
    hints
}

/// Split into clauses as `[from, to)` word ranges.
fn clauses(w: &[Word<'_>]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, word) in w.iter().enumerate() {
        if word.is(CONJUNCTIONS) {
            if start < i {
                out.push((start, i));
            }
            start = i + 1;
        } else if word.ends_sentence() {
            out.push((start, i + 1));
            start = i + 1;
        }
    }
    if start < w.len() {
        out.push((start, w.len()));
    }
    out
}

/// The tool a clause points at; the highest precedence wins among several.
///
/// Words after a reason marker ("because", "due to") describe the change and
/// are not matched.
fn classify(clause: &[Word<'_>], registry: &ToolRegistry) -> Option<Arc<ToolSpec>> {
    let reason_at = extract::REASON_MARKERS
        .iter()
        .filter_map(|m| find_phrase(clause, m))
        .filter(|&i| i > 0)
        .min()
        .unwrap_or(clause.len());
    let clause = &clause[..reason_at];

    let mut best: Option<&Arc<ToolSpec>> = None;
    for spec in registry.list() {
        let named = clause.iter().any(|w| w.lower == spec.name.as_str());
        let hit = named || spec.keywords.iter().any(|k| find_phrase(clause, k).is_some());
        if hit && best.is_none_or(|b| spec.precedence > b.precedence) {
            best = Some(spec);
        }
    }
    best.cloned()
}

fn implicit_segments(query: &str, w: &[Word<'_>], registry: &ToolRegistry) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for (from, to) in clauses(w) {
        match classify(&w[from..to], registry) {
            Some(spec) => segments.push(Segment {
                spec,
                start: w[from].start,
                end: w[to - 1].end,
            }),
            // Unmatched text extends the preceding intent ("in Marina and JVC").
            None => match segments.last_mut() {
                Some(last) => last.end = w[to - 1].end,
                None => debug!(clause = span(query, w, from, to), "No tool matched clause"),
            },
        }
    }
    segments
}
