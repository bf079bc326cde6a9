//! Stage catalog and canonicalizer
//!
//! Every project moves through the same fixed pipeline of stages. Source
//! systems name those stages inconsistently ("Planejamento", "1.DEFINIÇÃO DO
//! MÓDULO", "dm"), so labels are folded onto [`StageCode`] through a
//! [`StageCatalog`].
//!
//! Lookup is case-insensitive and whitespace-trimmed, and goes through three
//! ordered tables, first match wins:
//!
//! 1. known free-text variants (plus configured aliases, appended last)
//! 2. full display names
//! 3. the canonical codes themselves
//!
//! There is no fuzzy matching. Anything else maps to [`StageCode::Unknown`],
//! which is kept in the data but sorts after every canonical stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageCode {
    /// Module definition
    #[serde(rename = "DM")]
    Dm,
    /// Documentation
    #[serde(rename = "DOC")]
    Doc,
    /// Engineering
    #[serde(rename = "ENG")]
    Eng,
    /// Incorporation memorial
    #[serde(rename = "MEM")]
    Mem,
    /// LAE issuance
    #[serde(rename = "LAE")]
    Lae,
    /// Contracting
    #[serde(rename = "CONT")]
    Cont,
    /// Signature (milestone)
    #[serde(rename = "ASS")]
    Ass,
    /// Label that matched no table
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl StageCode {
    /// All canonical stages in pipeline order (excludes `Unknown`)
    pub const CANONICAL: [StageCode; 7] = [
        StageCode::Dm,
        StageCode::Doc,
        StageCode::Eng,
        StageCode::Mem,
        StageCode::Lae,
        StageCode::Cont,
        StageCode::Ass,
    ];

    /// Short code, e.g. `"DOC"`
    pub fn code(&self) -> &'static str {
        match self {
            StageCode::Dm => "DM",
            StageCode::Doc => "DOC",
            StageCode::Eng => "ENG",
            StageCode::Mem => "MEM",
            StageCode::Lae => "LAE",
            StageCode::Cont => "CONT",
            StageCode::Ass => "ASS",
            StageCode::Unknown => "UNKNOWN",
        }
    }

    /// Full display name as used on reports
    pub fn display_name(&self) -> &'static str {
        match self {
            StageCode::Dm => "1.DEFINIÇÃO DO MÓDULO",
            StageCode::Doc => "2.DOCUMENTAÇÃO",
            StageCode::Eng => "3.ENGENHARIA",
            StageCode::Mem => "4.MEMORIAL",
            StageCode::Lae => "5.LAE",
            StageCode::Cont => "6.CONTRATAÇÃO",
            StageCode::Ass => "7.ASSINATURA",
            StageCode::Unknown => "UNKNOWN",
        }
    }

    /// Parse an exact canonical code (case-insensitive)
    pub fn from_code(code: &str) -> Option<StageCode> {
        let key = normalize_label(code);
        Self::CANONICAL.into_iter().find(|s| s.code() == key)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, StageCode::Unknown)
    }
}

impl fmt::Display for StageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Free-text variants seen in the sales-module sources
const BUILTIN_VARIANTS: &[(&str, StageCode)] = &[
    ("DEFINIÇÃO DO MÓDULO", StageCode::Dm),
    ("DOCUMENTAÇÃO", StageCode::Doc),
    ("ENGENHARIA", StageCode::Eng),
    ("MEMORIAL", StageCode::Mem),
    ("LAE", StageCode::Lae),
    ("CONTRATAÇÃO", StageCode::Cont),
    ("ASSINATURA", StageCode::Ass),
    ("PLANEJAMENTO", StageCode::Dm),
    ("ENGENHARIA CEF", StageCode::Eng),
    ("MEMORIAL DE INCORPORAÇÃO", StageCode::Mem),
    ("EMISSÃO DO LAE", StageCode::Lae),
    ("CONTESTAÇÃO", StageCode::Lae),
    ("DJE", StageCode::Cont),
    ("ANÁLISE DE RISCO", StageCode::Cont),
    ("MORAR BEM", StageCode::Ass),
    ("SEGUROS", StageCode::Ass),
    ("ATESTE", StageCode::Ass),
    ("DEMANDA MÍNIMA", StageCode::Ass),
];

/// Trim and upper-case a label for table lookup
pub fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// Immutable stage lookup tables and ordering.
///
/// Passed explicitly to every component that needs stage knowledge.
#[derive(Clone, Debug, PartialEq)]
pub struct StageCatalog {
    /// Normalized free-text variant -> code, in lookup order
    variants: Vec<(String, StageCode)>,
    /// Canonical stage order; stages not listed sort last
    order: Vec<StageCode>,
    /// Stage whose end date marks the project goal
    milestone: StageCode,
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl StageCatalog {
    /// The built-in catalog for the sales-module pipeline
    pub fn standard() -> Self {
        Self {
            variants: BUILTIN_VARIANTS
                .iter()
                .map(|(label, code)| (normalize_label(label), *code))
                .collect(),
            order: StageCode::CANONICAL.to_vec(),
            milestone: StageCode::Ass,
        }
    }

    /// Append an extra free-text alias.
    ///
    /// Aliases are consulted after the built-in variants, so they cannot
    /// shadow an existing mapping.
    pub fn with_alias(mut self, label: &str, code: StageCode) -> Self {
        self.variants.push((normalize_label(label), code));
        self
    }

    /// Map a free-text label to its canonical code. Never fails.
    pub fn canonicalize(&self, label: Option<&str>) -> StageCode {
        let Some(label) = label else {
            return StageCode::Unknown;
        };
        let key = normalize_label(label);
        if key.is_empty() {
            return StageCode::Unknown;
        }

        if let Some((_, code)) = self.variants.iter().find(|(variant, _)| *variant == key) {
            return *code;
        }
        if let Some(code) = StageCode::CANONICAL
            .into_iter()
            .find(|s| normalize_label(s.display_name()) == key)
        {
            return code;
        }
        StageCode::from_code(&key).unwrap_or(StageCode::Unknown)
    }

    /// Position of a stage in the canonical order.
    /// `Unknown` and unlisted stages get `order.len()`, i.e. last.
    pub fn order_index(&self, stage: StageCode) -> usize {
        self.order
            .iter()
            .position(|s| *s == stage)
            .unwrap_or(self.order.len())
    }

    /// Canonical stages in order
    pub fn stages(&self) -> &[StageCode] {
        &self.order
    }

    pub fn milestone(&self) -> StageCode {
        self.milestone
    }

    /// Number of variant entries (built-in plus aliases)
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_known_variants() {
        let catalog = StageCatalog::standard();
        assert_eq!(catalog.canonicalize(Some("Planejamento")), StageCode::Dm);
        assert_eq!(catalog.canonicalize(Some("ENGENHARIA CEF")), StageCode::Eng);
        assert_eq!(catalog.canonicalize(Some("Contestação")), StageCode::Lae);
        assert_eq!(catalog.canonicalize(Some("análise de risco")), StageCode::Cont);
        assert_eq!(catalog.canonicalize(Some("Morar Bem")), StageCode::Ass);
    }

    #[test]
    fn canonicalize_trims_and_ignores_case() {
        let catalog = StageCatalog::standard();
        assert_eq!(catalog.canonicalize(Some("  documentação \t")), StageCode::Doc);
        assert_eq!(catalog.canonicalize(Some("dm")), StageCode::Dm);
    }

    #[test]
    fn canonicalize_full_display_name() {
        let catalog = StageCatalog::standard();
        assert_eq!(
            catalog.canonicalize(Some("1.DEFINIÇÃO DO MÓDULO")),
            StageCode::Dm
        );
        assert_eq!(catalog.canonicalize(Some("7.assinatura")), StageCode::Ass);
    }

    #[test]
    fn canonicalize_unmapped_and_missing() {
        let catalog = StageCatalog::standard();
        assert_eq!(catalog.canonicalize(None), StageCode::Unknown);
        assert_eq!(catalog.canonicalize(Some("")), StageCode::Unknown);
        assert_eq!(catalog.canonicalize(Some("   ")), StageCode::Unknown);
        assert_eq!(catalog.canonicalize(Some("ENGENHARIA X")), StageCode::Unknown);
        // no fuzzy matching
        assert_eq!(catalog.canonicalize(Some("DOCUMENTACAO")), StageCode::Unknown);
    }

    #[test]
    fn canonical_codes_are_fixed_points() {
        let catalog = StageCatalog::standard();
        for stage in StageCode::CANONICAL {
            assert_eq!(catalog.canonicalize(Some(stage.code())), stage);
            let again = catalog.canonicalize(Some(catalog.canonicalize(Some(stage.code())).code()));
            assert_eq!(again, stage);
        }
    }

    #[test]
    fn aliases_are_consulted_after_builtins() {
        let catalog = StageCatalog::standard()
            .with_alias("aprovação prefeitura", StageCode::Doc)
            .with_alias("PLANEJAMENTO", StageCode::Eng);

        assert_eq!(catalog.canonicalize(Some("Aprovação Prefeitura")), StageCode::Doc);
        // built-in mapping wins
        assert_eq!(catalog.canonicalize(Some("Planejamento")), StageCode::Dm);
        assert_eq!(catalog.variant_count(), BUILTIN_VARIANTS.len() + 2);
    }

    #[test]
    fn order_index_puts_unknown_last() {
        let catalog = StageCatalog::standard();
        assert_eq!(catalog.order_index(StageCode::Dm), 0);
        assert_eq!(catalog.order_index(StageCode::Ass), 6);
        assert_eq!(catalog.order_index(StageCode::Unknown), 7);
        assert_eq!(catalog.milestone(), StageCode::Ass);
    }

    #[test]
    fn from_code_is_exact() {
        assert_eq!(StageCode::from_code("cont"), Some(StageCode::Cont));
        assert_eq!(StageCode::from_code("CONTRATO"), None);
        assert_eq!(StageCode::from_code("UNKNOWN"), None);
    }

    #[test]
    fn display_uses_code() {
        assert_eq!(format!("{}", StageCode::Mem), "MEM");
        assert_eq!(StageCode::Lae.display_name(), "5.LAE");
    }
}
