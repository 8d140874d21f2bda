//! Parameter extraction from the free text of one segment.
//!
//! Extraction is driven by the tool's schema: explicit `key=value` pairs are
//! read first for every parameter the tool declares, then heuristics fill
//! whatever is still empty based on the parameter names present (a tool with
//! an `area` parameter gets location extraction, one with `rent_price` gets
//! the price-update reading, and so on).

use std::collections::HashMap;

use serde_json::Value;

use super::text::{Word, clean_value, find_phrase, span, words};
use crate::tools::{JsonObject, ToolSpec};

const LOCATION_PREPOSITIONS: &[&str] = &["in", "at", "near", "around", "within"];

const LOCATION_STOP_WORDS: &[&str] = &[
    "with", "under", "over", "below", "above", "between", "for", "from", "that", "which",
    "where", "whose", "sorted", "ordered", "priced", "costing", "having", "by", "to", "of",
    "less", "more", "than", "during", "since", "before", "after", "on", "in", "near", "at",
    "properties", "property", "listings", "units", "rent", "rents", "price", "prices",
    "please", "only", "because", "and",
];

const COUNT_PREFIXES: &[&str] = &["top", "first", "limit", "latest", "last"];
const COUNT_NOUNS: &[&str] = &["properties", "property", "listings", "units", "results", "homes"];
/// Words that make a preceding number a property attribute, not a result count.
const COUNT_UNITS: &[&str] = &[
    "bedroom", "bedrooms", "bed", "beds", "br", "bhk", "bath", "baths", "bathroom", "bathrooms",
    "sqft", "sqm", "sq", "floor", "floors", "storey", "year", "years", "star",
];

pub(crate) const REASON_MARKERS: &[&str] = &["because", "reason", "due to", "since"];
const REASON_FILLERS: &[&str] = &["of", "is", "was", "being"];
const ID_MARKERS: &[&str] = &["id", "#"];
const ID_FALLBACK_MARKERS: &[&str] = &["property", "unit", "apartment", "villa"];
const ID_FILLERS: &[&str] = &["#", "no", "number", "of"];
const PRICE_MARKERS: &[&str] = &["rent_price", "rentprice", "to", "price", "rent", "at"];

const CARD_NAME_MARKERS: &[&str] = &["named", "called", "titled", "title", "name"];
const CARD_DESC_MARKERS: &[&str] = &["description", "desc", "saying", "about", "details"];
const CARD_NOUNS: &[&str] = &["card", "ticket"];
const CARD_NAME_FILLERS: &[&str] = &["for", "to", "on"];

/// Alternative spellings accepted in `key=value` pairs.
const PARAM_ALIASES: &[(&str, &str)] = &[
    ("description", "desc"),
    ("title", "name"),
    ("address", "address1"),
    ("rent", "rent_price"),
];

/// Raw (uncoerced) argument text, keyed by parameter name.
pub(crate) type RawArgs = HashMap<&'static str, String>;

/// Extract arguments for `spec` from `text`.
///
/// Returns the coerced arguments and the required parameters that could not
/// be found. Text that cannot be coerced to the declared type is kept as a
/// string so validation reports it as malformed.
pub(crate) fn arguments(spec: &ToolSpec, text: &str) -> (JsonObject, Vec<String>) {
    let raw = raw_arguments(spec, text);

    let mut args = JsonObject::new();
    let mut missing = Vec::new();
    for param in &spec.params {
        match raw.get(param.name) {
            Some(value) => {
                let coerced = param
                    .ty
                    .coerce(value)
                    .unwrap_or_else(|| Value::String(value.clone()));
                args.insert(param.name.to_string(), coerced);
            }
            None if param.required => missing.push(param.name.to_string()),
            None => {}
        }
    }
    (args, missing)
}

pub(crate) fn raw_arguments(spec: &ToolSpec, text: &str) -> RawArgs {
    let names: Vec<&'static str> = spec.params.iter().map(|p| p.name).collect();
    let has = |name: &str| names.iter().any(|n| *n == name);

    let mut raw: RawArgs = pairs(text, &names).into_iter().collect();
    let fill = |raw: &mut RawArgs, name: &'static str, value: Option<String>| {
        if has(name) && !raw.contains_key(name) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                raw.insert(name, v);
            }
        }
    };

    let w = words(text);
    if has("query") {
        fill(&mut raw, "query", Some(clean_value(text).to_string()));
    }
    if has("area") {
        fill(&mut raw, "area", location(&w));
    }
    if has("limit") {
        fill(&mut raw, "limit", count(&w));
    }
    if has("id") || has("rent_price") || has("reason") {
        let update = price_update(text);
        fill(&mut raw, "id", update.id);
        fill(&mut raw, "rent_price", update.rent_price);
        fill(&mut raw, "reason", update.reason);
    }
    if has("name") || has("desc") {
        let (name, desc) = card(text, &w);
        fill(&mut raw, "name", name);
        fill(&mut raw, "desc", desc);
    }
    raw
}

fn normalise_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Match a written key against the declared parameter names.
fn canonical_param(key: &str, names: &[&'static str]) -> Option<&'static str> {
    let key = normalise_key(key);
    if let Some(name) = names.iter().find(|n| normalise_key(n) == key) {
        return Some(*name);
    }
    PARAM_ALIASES
        .iter()
        .find(|(alias, _)| normalise_key(alias) == key)
        .and_then(|(_, target)| names.iter().find(|n| *n == target))
        .copied()
}

/// `key=value` / `key: value` pairs for the given parameter names.
///
/// A value runs until the next recognised key, so values may contain spaces
/// and commas. The first occurrence of a key wins.
pub(crate) fn pairs(text: &str, names: &[&'static str]) -> Vec<(&'static str, String)> {
    // (param, key start, value start)
    let mut marks: Vec<(&'static str, usize, usize)> = Vec::new();
    let bytes = text.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'-';

    let mut i = 0;
    while i < bytes.len() {
        let at_boundary = i == 0 || !is_ident(bytes[i - 1]);
        if !(at_boundary && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_')) {
            i += 1;
            continue;
        }
        let key_start = i;
        while i < bytes.len() && is_ident(bytes[i]) {
            i += 1;
        }
        let key_end = i;
        let mut j = i;
        while j < bytes.len() && bytes[j] == b' ' {
            j += 1;
        }
        if j < bytes.len() && (bytes[j] == b'=' || bytes[j] == b':') {
            if let Some(param) = canonical_param(&text[key_start..key_end], names) {
                marks.push((param, key_start, j + 1));
                i = j + 1;
            }
        }
    }

    let mut out: Vec<(&'static str, String)> = Vec::new();
    for (k, (param, _, value_start)) in marks.iter().enumerate() {
        let value_end = marks.get(k + 1).map_or(text.len(), |next| next.1);
        let value = clean_value(&text[*value_start..value_end]);
        if !value.is_empty() && !out.iter().any(|(p, _)| p == param) {
            out.push((*param, value.to_string()));
        }
    }
    out
}

/// Place name following a location preposition.
pub(crate) fn location(w: &[Word<'_>]) -> Option<String> {
    for (i, word) in w.iter().enumerate() {
        if !word.is(LOCATION_PREPOSITIONS) {
            continue;
        }
        let mut parts = Vec::new();
        for next in &w[i + 1..] {
            if next.is(LOCATION_STOP_WORDS) || next.is_number() || next.text.is_empty() {
                break;
            }
            if parts.is_empty() && next.lower == "the" {
                continue;
            }
            if parts.is_empty() && !next.text.starts_with(char::is_alphabetic) {
                break;
            }
            parts.push(next.text);
            if next.ends_sentence() || next.raw.ends_with(',') {
                break;
            }
        }
        if !parts.is_empty() {
            return Some(parts.join(" "));
        }
    }
    None
}

/// Requested number of results ("top 5", "10 properties").
pub(crate) fn count(w: &[Word<'_>]) -> Option<String> {
    for (i, word) in w.iter().enumerate() {
        if word.is(COUNT_PREFIXES) {
            if let Some(next) = w.get(i + 1).filter(|n| n.is_number()) {
                return Some(next.text.to_string());
            }
        }
        if word.is_number() {
            // "10 properties" or "10 cheapest properties", never "2 bedroom properties".
            let noun_follows = match w.get(i + 1) {
                Some(next) if next.is(COUNT_UNITS) || next.is_number() => false,
                Some(next) if next.is(COUNT_NOUNS) => true,
                Some(_) => w.get(i + 2).is_some_and(|n| n.is(COUNT_NOUNS)),
                None => false,
            };
            if noun_follows {
                return Some(word.text.to_string());
            }
        }
    }
    None
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct PriceUpdate {
    pub id: Option<String>,
    pub rent_price: Option<String>,
    pub reason: Option<String>,
}

/// Read "update rent of ID 123 to 85000 because ..." style text.
pub(crate) fn price_update(text: &str) -> PriceUpdate {
    // `id=1 rent_price: 2` reads the same as `id 1 rent_price 2`; the
    // replacement keeps byte offsets intact.
    let normalised: String = text
        .chars()
        .map(|c| if c == '=' || c == ':' { ' ' } else { c })
        .collect();
    let w = words(&normalised);

    let (reason_at, reason) = match REASON_MARKERS
        .iter()
        .filter_map(|m| find_phrase(&w, m).map(|i| (i, m.split_whitespace().count())))
        .min_by_key(|(i, _)| *i)
    {
        Some((i, len)) => {
            let mut from = i + len;
            while w.get(from).is_some_and(|x| x.is(REASON_FILLERS)) {
                from += 1;
            }
            let reason = clean_value(span(&normalised, &w, from, w.len())).to_string();
            (i, Some(reason).filter(|r| !r.is_empty()))
        }
        None => (w.len(), None),
    };
    let head = &w[..reason_at];

    let number_after = |marker: usize, skip: Option<usize>| -> Option<usize> {
        (marker + 1..head.len())
            .take(4)
            .filter(|&k| Some(k) != skip)
            .find(|&k| head[k].is_number())
    };

    let id_at = head
        .iter()
        .position(|x| x.raw.starts_with('#') && x.is_number())
        .or_else(|| {
            head.iter()
                .enumerate()
                .filter(|(_, x)| x.is(ID_MARKERS))
                .find_map(|(i, _)| {
                    (i + 1..head.len())
                        .take(3)
                        .take_while(|&k| head[k].is_number() || head[k].is(ID_FILLERS))
                        .find(|&k| head[k].is_number())
                })
        })
        .or_else(|| {
            head.iter()
                .enumerate()
                .filter(|(_, x)| x.is(ID_FALLBACK_MARKERS))
                .find_map(|(i, _)| head.get(i + 1).filter(|n| n.is_number()).map(|_| i + 1))
        });

    let price_at = PRICE_MARKERS
        .iter()
        .find_map(|marker| {
            head.iter()
                .enumerate()
                .filter(|(_, x)| x.lower == *marker)
                .find_map(|(i, _)| number_after(i, id_at))
        })
        .or_else(|| {
            (0..head.len())
                .rev()
                .find(|&k| Some(k) != id_at && head[k].is_number())
        });

    PriceUpdate {
        id: id_at.map(|i| head[i].text.to_string()),
        rent_price: price_at.map(|i| head[i].text.to_string()),
        reason,
    }
}

/// Card name and description.
pub(crate) fn card(text: &str, w: &[Word<'_>]) -> (Option<String>, Option<String>) {
    let quoted = quoted_strings(text);
    if let Some(name) = quoted.first() {
        return (Some(name.clone()), quoted.get(1).cloned());
    }

    let desc_at = w.iter().position(|x| x.is(CARD_DESC_MARKERS));
    let desc = desc_at.map(|i| {
        let mut from = i + 1;
        while w.get(from).is_some_and(|x| x.is(REASON_FILLERS)) {
            from += 1;
        }
        clean_value(span(text, w, from, w.len())).to_string()
    });
    let name_end = desc_at.unwrap_or(w.len());

    let name_start = w[..name_end]
        .iter()
        .position(|x| x.is(CARD_NAME_MARKERS))
        .map(|i| i + 1)
        .or_else(|| {
            w[..name_end].iter().position(|x| x.is(CARD_NOUNS)).map(|i| {
                let mut from = i + 1;
                while w.get(from).is_some_and(|x| x.is(CARD_NAME_FILLERS)) {
                    from += 1;
                }
                from
            })
        });
    let name = name_start
        .map(|from| clean_value(span(text, w, from, name_end)).to_string())
        .filter(|n| !n.is_empty());

    (name, desc.filter(|d| !d.is_empty()))
}

fn quoted_strings(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    for c in text.chars() {
        let is_quote = c == '"' || c == '\u{201c}' || c == '\u{201d}';
        if is_quote {
            match current.take() {
                None => current = Some(String::new()),
                Some(s) => {
                    let s = s.trim();
                    if !s.is_empty() {
                        out.push(s.to_string());
                    }
                }
            }
        } else if let Some(s) = current.as_mut() {
            s.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::tests::Echo;
    use crate::tools::{ParamSpec, ParamType};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_location_stops_at_qualifiers() {
        let w = words("List all properties in Business Bay");
        assert_eq!(location(&w).as_deref(), Some("Business Bay"));

        let w = words("show properties in the Dubai Marina with 2 bedrooms");
        assert_eq!(location(&w).as_deref(), Some("Dubai Marina"));

        let w = words("I am interested in properties in JVC, sorted by price");
        assert_eq!(location(&w).as_deref(), Some("JVC"));

        let w = words("rents in 2023");
        assert_eq!(location(&w), None);
    }

    #[test]
    fn test_count() {
        assert_eq!(count(&words("top 5 properties in Marina")).as_deref(), Some("5"));
        assert_eq!(count(&words("show 10 cheapest properties")).as_deref(), Some("10"));
        assert_eq!(count(&words("show properties in Marina")), None);
    }

    #[test]
    fn test_count_ignores_attribute_numbers() {
        assert_eq!(count(&words("List 2 bedroom properties in Dubai Marina")), None);
        assert_eq!(count(&words("show 3 bath homes near JVC")), None);
        assert_eq!(count(&words("top 5 2 bedroom properties")).as_deref(), Some("5"));

        let spec = ToolSpec::new("get_properties", "properties", "", Arc::new(Echo))
            .param(ParamSpec::required("query", ParamType::String))
            .param(ParamSpec::optional("area", ParamType::String))
            .param(ParamSpec::optional("limit", ParamType::Integer));
        let (args, _) = arguments(&spec, "List 2 bedroom properties in Dubai Marina");
        assert_eq!(args["area"], json!("Dubai Marina"));
        assert!(!args.contains_key("limit"));
    }

    #[test]
    fn test_price_update_natural_language() {
        let update = price_update("update rent of ID 123 to 85000 because market adjustment");
        assert_eq!(
            update,
            PriceUpdate {
                id: Some("123".to_string()),
                rent_price: Some("85000".to_string()),
                reason: Some("market adjustment".to_string()),
            }
        );
    }

    #[test]
    fn test_price_update_keyword_form() {
        let update = price_update("id 123 rent_price 85000 reason market adjustment");
        assert_eq!(update.id.as_deref(), Some("123"));
        assert_eq!(update.rent_price.as_deref(), Some("85000"));
        assert_eq!(update.reason.as_deref(), Some("market adjustment"));

        let update = price_update("id=7 rent_price=1,200 reason=renewal");
        assert_eq!(update.id.as_deref(), Some("7"));
        assert_eq!(update.rent_price.as_deref(), Some("1,200"));
        assert_eq!(update.reason.as_deref(), Some("renewal"));
    }

    #[test]
    fn test_price_update_variants() {
        let update = price_update("set rent for property 55 at 90k due to renovation");
        assert_eq!(update.id.as_deref(), Some("55"));
        assert_eq!(update.rent_price.as_deref(), Some("90k"));
        assert_eq!(update.reason.as_deref(), Some("renovation"));

        let update = price_update("change rent of #42 to AED 70,000");
        assert_eq!(update.id.as_deref(), Some("42"));
        assert_eq!(update.rent_price.as_deref(), Some("70,000"));
        assert_eq!(update.reason, None);

        let update = price_update("update the rent to 5000");
        assert_eq!(update.id, None);
        assert_eq!(update.rent_price.as_deref(), Some("5000"));
    }

    #[test]
    fn test_reason_numbers_do_not_leak_into_price() {
        let update = price_update("update rent of ID 9 to 60000 because 2023 rents fell");
        assert_eq!(update.rent_price.as_deref(), Some("60000"));
        assert_eq!(update.reason.as_deref(), Some("2023 rents fell"));
    }

    #[test]
    fn test_pairs_with_spaces_and_aliases() {
        let names = ["address1", "area", "city", "purchaseDate", "buyPrice"];
        let found = pairs(
            "address=12 Palm Road, area=Business Bay, city: Dubai, purchase_date=2023-01-15 buy_price=1,500,000",
            &names,
        );
        assert_eq!(
            found,
            vec![
                ("address1", "12 Palm Road".to_string()),
                ("area", "Business Bay".to_string()),
                ("city", "Dubai".to_string()),
                ("purchaseDate", "2023-01-15".to_string()),
                ("buyPrice", "1,500,000".to_string()),
            ]
        );
    }

    #[test]
    fn test_pairs_ignore_unknown_keys() {
        let found = pairs("note: hello area: Marina", &["area"]);
        assert_eq!(found, vec![("area", "Marina".to_string())]);
    }

    #[test]
    fn test_card_forms() {
        let text = "create a card named Marina review with description check Q3 rents";
        assert_eq!(
            card(text, &words(text)),
            (
                Some("Marina review".to_string()),
                Some("check Q3 rents".to_string())
            )
        );

        let text = "make a trello card \"Follow up\" \"call the developer\"";
        assert_eq!(
            card(text, &words(text)),
            (
                Some("Follow up".to_string()),
                Some("call the developer".to_string())
            )
        );

        let text = "open a ticket for JVC inspections";
        assert_eq!(
            card(text, &words(text)),
            (Some("JVC inspections".to_string()), None)
        );

        let text = "create a card";
        assert_eq!(card(text, &words(text)), (None, None));
    }

    #[test]
    fn test_arguments_coerce_and_mark_missing() {
        let spec = ToolSpec::new("update_property_price", "updates", "", Arc::new(Echo))
            .param(ParamSpec::required("id", ParamType::Integer))
            .param(ParamSpec::required("rent_price", ParamType::Float))
            .param(ParamSpec::optional("reason", ParamType::String));

        let (args, missing) = arguments(&spec, "id 123 rent_price 85000 reason market adjustment");
        assert!(missing.is_empty());
        assert_eq!(args["id"], json!(123));
        assert_eq!(args["rent_price"], json!(85000.0));
        assert_eq!(args["reason"], json!("market adjustment"));

        let (args, missing) = arguments(&spec, "raise the rent please");
        assert_eq!(missing, vec!["id".to_string(), "rent_price".to_string()]);
        assert!(args.is_empty());
    }

    #[test]
    fn test_uncoercible_values_stay_raw() {
        let spec = ToolSpec::new("create_property", "created", "", Arc::new(Echo))
            .param(ParamSpec::required("purchaseDate", ParamType::Date));
        let (args, missing) = arguments(&spec, "purchaseDate=last tuesday");
        assert!(missing.is_empty());
        assert_eq!(args["purchaseDate"], json!("last tuesday"));
    }
}
