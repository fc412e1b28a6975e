//! Field pattern sets and the provider-agnostic text field extractor.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::trace;

use crate::error::PatternSetError;

/// One extraction rule: a regex and the capture group holding the value.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    regex: Regex,
    group: usize,
}

impl FieldPattern {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn group(&self) -> usize {
        self.group
    }
}

/// Ordered fallback patterns for a single field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: String,
    patterns: Vec<FieldPattern>,
}

impl FieldRule {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn patterns(&self) -> &[FieldPattern] {
        &self.patterns
    }
}

/// Immutable, ordered collection of field rules for one provider layout.
///
/// Every field has at least one pattern. Patterns of a field are tried in
/// declared order and the first match wins.
#[derive(Debug, Clone)]
pub struct FieldPatternSet {
    name: String,
    rules: Vec<FieldRule>,
}

impl FieldPatternSet {
    /// Start building a pattern set.
    pub fn builder(name: impl Into<String>) -> FieldPatternSetBuilder {
        FieldPatternSetBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Rule declared for `field`, if any.
    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field == field)
    }

    /// Declared field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.field.as_str())
    }
}

/// Builder for [`FieldPatternSet`]; patterns are compiled in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct FieldPatternSetBuilder {
    name: String,
    fields: Vec<(String, Vec<(String, usize)>)>,
}

impl FieldPatternSetBuilder {
    /// Declare `field` with its `(pattern, capture group)` list.
    ///
    /// Declaring the same field again appends the new patterns after the
    /// existing ones, so a template revision can be added as a fallback.
    pub fn field<P: AsRef<str>>(mut self, field: &str, patterns: &[(P, usize)]) -> Self {
        let patterns: Vec<(String, usize)> = patterns
            .iter()
            .map(|(p, g)| (p.as_ref().to_string(), *g))
            .collect();

        if let Some((_, existing)) = self.fields.iter_mut().find(|(f, _)| f == field) {
            existing.extend(patterns);
        } else {
            self.fields.push((field.to_string(), patterns));
        }
        self
    }

    /// Compile and validate every pattern.
    pub fn build(self) -> Result<FieldPatternSet, PatternSetError> {
        let mut rules = Vec::with_capacity(self.fields.len());

        for (field, raw_patterns) in self.fields {
            if raw_patterns.is_empty() {
                return Err(PatternSetError::EmptyField(field));
            }

            let mut patterns = Vec::with_capacity(raw_patterns.len());
            for (source, group) in raw_patterns {
                let regex = Regex::new(&source).map_err(|e| PatternSetError::InvalidPattern {
                    field: field.clone(),
                    source: e,
                })?;
                if group >= regex.captures_len() {
                    return Err(PatternSetError::MissingGroup { field, group });
                }
                patterns.push(FieldPattern { regex, group });
            }

            rules.push(FieldRule { field, patterns });
        }

        Ok(FieldPatternSet {
            name: self.name,
            rules,
        })
    }
}

/// A matched field value and the index of the pattern that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    pub value: String,
    pub pattern_index: usize,
}

/// Field name to matched value. Fields that matched nothing are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    values: BTreeMap<String, ExtractedField>,
}

impl ExtractedFields {
    /// Raw value for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(|f| f.value.as_str())
    }

    /// Full match record for `field`.
    pub fn field(&self, field: &str) -> Option<&ExtractedField> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.value.as_str()))
    }
}

/// Applies a [`FieldPatternSet`] to page text.
///
/// Pure function of its inputs; absence is the only failure signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFieldExtractor;

impl TextFieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every declared field from `text`.
    pub fn extract(&self, text: &str, pattern_set: &FieldPatternSet) -> ExtractedFields {
        let mut out = ExtractedFields::default();

        for rule in &pattern_set.rules {
            if let Some(found) = Self::first_match(text, rule) {
                trace!(
                    "{}: field '{}' matched pattern #{}",
                    pattern_set.name,
                    rule.field,
                    found.pattern_index
                );
                out.values.insert(rule.field.clone(), found);
            }
        }

        out
    }

    /// Every pattern's match for `field`, in pattern order.
    ///
    /// Lets a caller fall through to the next pattern when the first
    /// match turns out to be unusable.
    pub fn candidates(
        &self,
        text: &str,
        pattern_set: &FieldPatternSet,
        field: &str,
    ) -> Vec<ExtractedField> {
        pattern_set
            .rule(field)
            .map(|rule| {
                rule.patterns
                    .iter()
                    .enumerate()
                    .filter_map(|(i, pattern)| Self::match_pattern(text, i, pattern))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn first_match(text: &str, rule: &FieldRule) -> Option<ExtractedField> {
        rule.patterns
            .iter()
            .enumerate()
            .find_map(|(i, pattern)| Self::match_pattern(text, i, pattern))
    }

    fn match_pattern(text: &str, index: usize, pattern: &FieldPattern) -> Option<ExtractedField> {
        let caps = pattern.regex.captures(text)?;
        let value = caps.get(pattern.group)?.as_str();
        if value.is_empty() {
            return None;
        }
        Some(ExtractedField {
            value: value.to_string(),
            pattern_index: index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn account_set() -> FieldPatternSet {
        FieldPatternSet::builder("test")
            .field("account", &[(r"Nro de cuenta\s*(\d+-\d+)", 1), (r"(\d{6}-\d)", 1)])
            .field("total", &[(r"TOTAL\s*\$\s*([\d.]+)", 1)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_pattern_wins() {
        let fields = TextFieldExtractor::new()
            .extract("Nro de cuenta 111111-1\nref 222222-2", &account_set());

        assert_eq!(fields.get("account"), Some("111111-1"));
        assert_eq!(fields.field("account").unwrap().pattern_index, 0);
    }

    #[test]
    fn test_fallback_pattern() {
        let fields = TextFieldExtractor::new().extract("cliente 654321-0", &account_set());

        assert_eq!(fields.get("account"), Some("654321-0"));
        assert_eq!(fields.field("account").unwrap().pattern_index, 1);
    }

    #[test]
    fn test_absent_field_is_not_an_error() {
        let fields = TextFieldExtractor::new().extract("", &account_set());
        assert!(fields.is_empty());
        assert_eq!(fields.get("total"), None);
    }

    #[test]
    fn test_empty_field_rejected() {
        let empty: &[(&str, usize)] = &[];
        let err = FieldPatternSet::builder("bad").field("x", empty).build().unwrap_err();
        assert!(matches!(err, PatternSetError::EmptyField(f) if f == "x"));
    }

    #[test]
    fn test_invalid_regex_and_group_rejected() {
        let err = FieldPatternSet::builder("bad")
            .field("x", &[("(unclosed", 1)])
            .build()
            .unwrap_err();
        assert!(matches!(err, PatternSetError::InvalidPattern { .. }));

        let err = FieldPatternSet::builder("bad")
            .field("x", &[(r"(\d+)", 2)])
            .build()
            .unwrap_err();
        assert!(matches!(err, PatternSetError::MissingGroup { group: 2, .. }));
    }

    #[test]
    fn test_candidates_in_pattern_order() {
        let candidates = TextFieldExtractor::new().candidates(
            "Nro de cuenta 111111-1\nref 222222-2",
            &account_set(),
            "account",
        );

        let values: Vec<(&str, usize)> = candidates
            .iter()
            .map(|c| (c.value.as_str(), c.pattern_index))
            .collect();
        assert_eq!(values, vec![("111111-1", 0), ("111111-1", 1)]);

        assert!(
            TextFieldExtractor::new()
                .candidates("x", &account_set(), "missing")
                .is_empty()
        );
    }

    #[test]
    fn test_redeclared_field_appends_fallback() {
        let set = FieldPatternSet::builder("rev")
            .field("total", &[(r"TOTAL A PAGAR\s*(\d+)", 1)])
            .field("total", &[(r"MONTO\s*(\d+)", 1)])
            .build()
            .unwrap();

        assert_eq!(set.rules().len(), 1);
        assert_eq!(set.rule("total").unwrap().patterns().len(), 2);

        let fields = TextFieldExtractor::new().extract("MONTO 10", &set);
        assert_eq!(fields.get("total"), Some("10"));
    }
}
