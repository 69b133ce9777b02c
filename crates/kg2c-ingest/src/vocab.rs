//! Predicate/category/provenance vocabulary mapping.
//!
//! A [`Vocabulary`] is built once before a build starts and is read-only
//! afterwards; every lookup is a pure function of the tables, so a shared
//! reference can be used from any number of normalization threads.
//!
//! Unknown terms never pass silently: a category or predicate without a
//! table entry either resolves to the configured fallback (reported as
//! [`Lookup::Fallback`]) or fails with an error. Unknown provenance tags
//! resolve to `None` and the caller records a diagnostic.

use std::collections::BTreeMap;

use kg2c_core::{Error, Result, VocabularyConfig};
use once_cell::sync::Lazy;
use regex::Regex;

pub const BIOLINK_VOCAB_BASE: &str = "https://w3id.org/biolink/vocab/";
pub const BIOLINK_CURIE_PREFIX: &str = "biolink";

const OBO_BASE: &str = "http://purl.obolibrary.org/obo/";

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:[_ ][A-Za-z0-9]+)*$").unwrap());

/// Category labels used by KG1.
const KG1_CATEGORIES: &[&str] = &[
    "anatomical_entity",
    "biological_process",
    "cellular_component",
    "chemical_substance",
    "disease",
    "metabolite",
    "microRNA",
    "molecular_function",
    "pathway",
    "phenotypic_feature",
    "protein",
];

/// Relationship labels used by KG1.
const KG1_PREDICATES: &[&str] = &[
    "affects",
    "capable_of",
    "causes_or_contributes_to",
    "contraindicated_for",
    "expressed_in",
    "gene_associated_with_condition",
    "gene_mutations_contribute_to",
    "has_part",
    "has_phenotype",
    "indicated_for",
    "interacts_with",
    "involved_in",
    "negatively_regulates",
    "part_of",
    "participates_in",
    "physically_interacts_with",
    "positively_regulates",
    "regulates",
    "related_to",
    "subclass_of",
    "targets",
    "treats",
];

/// KG1 `provided_by` tags and the KG2 provenance IRIs they denote.
const KG1_PROVIDED_BY: &[(&str, &str)] = &[
    ("gene_ontology", "http://purl.obolibrary.org/obo/GO"),
    ("PC2", "http://pathwaycommons.org/pc11/"),
    ("BioLink", "http://w3id.org/biolink/vocab/"),
    ("KEGG;UniProtKB", "https://www.uniprot.org/"),
    ("OMIM", "http://purl.bioontology.org/ontology/OMIM/"),
    ("DisGeNet", "http://www.disgenet.org"),
    ("DGIdb;MyCancerGenomeClinicalTrial", "http://www.dgidb.org"),
    ("reactome", "https://identifiers.org/reactome"),
    ("DGIdb;FDA", "http://www.dgidb.org"),
    ("DGIdb;NCI", "http://www.dgidb.org"),
    ("DGIdb;TALC", "http://www.dgidb.org"),
    ("DGIdb;TTD", "http://www.dgidb.org"),
    ("DGIdb;GuideToPharmacologyInteractions", "http://www.dgidb.org"),
    ("DGIdb;ChemblInteractions", "http://www.dgidb.org"),
    ("DGIdb;TdgClinicalTrial", "http://www.dgidb.org"),
    ("ChEMBL", "https://www.ebi.ac.uk/chembl"),
];

/// Curie prefixes that expand under the OBO PURL scheme (`<base><PREFIX>_<local>`).
const OBO_PREFIXES: &[&str] = &["CL", "DOID", "GO", "HP", "MONDO", "UBERON"];

/// Other curie prefixes seen in KG1 identifiers.
const KG1_PREFIXES: &[(&str, &str)] = &[
    ("CHEBI", "http://purl.obolibrary.org/obo/CHEBI_"),
    ("CHEMBL.COMPOUND", "https://identifiers.org/chembl.compound/"),
    ("KEGG", "https://identifiers.org/kegg/"),
    ("NCBIGene", "https://identifiers.org/ncbigene/"),
    ("OMIM", "https://omim.org/entry/"),
    ("REACT", "https://identifiers.org/reactome/"),
    ("UniProtKB", "http://identifiers.org/uniprot/"),
];

/// A canonical predicate: IRI plus compact curie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateTerm {
    pub iri: String,
    pub curie: String,
}

/// Result of a vocabulary lookup that may have used a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Mapped(T),
    Fallback(T),
}

impl<T> Lookup<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Lookup::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Lookup::Mapped(t) | Lookup::Fallback(t) => t,
        }
    }
}

/// Biolink category IRI for a snake_case label: `anatomical_entity` →
/// `https://w3id.org/biolink/vocab/AnatomicalEntity`.
pub fn category_label_to_iri(label: &str) -> Option<String> {
    if !LABEL_RE.is_match(label) {
        return None;
    }
    let camel: String = label
        .split(['_', ' '])
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    Some(format!("{}{}", BIOLINK_VOCAB_BASE, camel))
}

/// Biolink predicate IRI and curie for a label: `interacts_with` →
/// (`https://w3id.org/biolink/vocab/interacts_with`, `biolink:interacts_with`).
pub fn predicate_label_to_term(label: &str) -> Option<PredicateTerm> {
    if !LABEL_RE.is_match(label) {
        return None;
    }
    let label = label.replace(' ', "_");
    Some(PredicateTerm {
        iri: format!("{}{}", BIOLINK_VOCAB_BASE, label),
        curie: format!("{}:{}", BIOLINK_CURIE_PREFIX, label),
    })
}

/// Local name of a Biolink term given as a vocab IRI or a `biolink:` curie.
pub fn biolink_local(term: &str) -> Option<&str> {
    let local = term
        .strip_prefix(BIOLINK_VOCAB_BASE)
        .or_else(|| term.strip_prefix("biolink:"))?;
    LABEL_RE.is_match(local).then_some(local)
}

/// Immutable vocabulary tables used by the normalizer.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    categories: BTreeMap<String, String>,
    predicates: BTreeMap<String, PredicateTerm>,
    provided_by: BTreeMap<String, String>,
    prefixes: BTreeMap<String, String>,
    category_fallback: Option<String>,
    predicate_fallback: Option<PredicateTerm>,
}

impl Vocabulary {
    /// The built-in KG1 tables with the default fallbacks.
    pub fn kg1() -> Self {
        let defaults = VocabularyConfig::default();
        let mut vocab = Self {
            categories: BTreeMap::new(),
            predicates: BTreeMap::new(),
            provided_by: BTreeMap::new(),
            prefixes: BTreeMap::new(),
            category_fallback: defaults.category_fallback,
            predicate_fallback: None,
        };
        for label in KG1_CATEGORIES {
            if let Some(iri) = category_label_to_iri(label) {
                vocab.categories.insert((*label).to_string(), iri);
            }
        }
        for label in KG1_PREDICATES {
            if let Some(term) = predicate_label_to_term(label) {
                vocab.predicates.insert((*label).to_string(), term);
            }
        }
        for (tag, iri) in KG1_PROVIDED_BY {
            vocab.provided_by.insert((*tag).to_string(), (*iri).to_string());
        }
        for prefix in OBO_PREFIXES {
            vocab
                .prefixes
                .insert((*prefix).to_string(), format!("{}{}_", OBO_BASE, prefix));
        }
        for (prefix, base) in KG1_PREFIXES {
            vocab.prefixes.insert((*prefix).to_string(), (*base).to_string());
        }
        vocab
    }

    /// KG1 tables extended and overridden by configuration.
    pub fn from_config(config: &VocabularyConfig) -> Result<Self> {
        let mut vocab = Self::kg1();
        vocab.categories.extend(config.categories.clone());
        for (label, mapping) in &config.predicates {
            vocab.predicates.insert(
                label.clone(),
                PredicateTerm {
                    iri: mapping.iri.clone(),
                    curie: mapping.curie.clone(),
                },
            );
        }
        vocab.provided_by.extend(config.provided_by.clone());
        vocab.prefixes.extend(config.prefixes.clone());
        vocab.category_fallback = config.category_fallback.clone();
        vocab.predicate_fallback = match &config.predicate_fallback {
            Some(label) => {
                let term = vocab
                    .predicates
                    .get(label)
                    .cloned()
                    .or_else(|| predicate_label_to_term(label))
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "predicate_fallback `{}` is not a valid predicate label",
                            label
                        ))
                    })?;
                Some(term)
            }
            None => None,
        };
        Ok(vocab)
    }

    /// Map a source category label to a category IRI. Biolink category
    /// IRIs and curies map to themselves.
    pub fn category(&self, label: &str) -> Result<Lookup<String>> {
        if let Some(iri) = self.categories.get(label) {
            return Ok(Lookup::Mapped(iri.clone()));
        }
        if let Some(iri) = biolink_local(label).and_then(category_label_to_iri) {
            return Ok(Lookup::Mapped(iri));
        }
        match &self.category_fallback {
            Some(iri) => Ok(Lookup::Fallback(iri.clone())),
            None => Err(Error::UnknownVocabularyTerm {
                vocabulary: "category".into(),
                term: label.to_string(),
            }),
        }
    }

    /// Map a source relationship label to a predicate IRI and curie.
    /// Biolink predicate IRIs and curies are looked up by their local name.
    pub fn predicate(&self, label: &str) -> Result<Lookup<PredicateTerm>> {
        let lookup = |label: &str| {
            self.predicates
                .get(label)
                .or_else(|| self.predicates.get(&label.replace(' ', "_")))
                .cloned()
        };
        let term = lookup(label).or_else(|| {
            biolink_local(label).and_then(|local| lookup(local).or_else(|| predicate_label_to_term(local)))
        });
        if let Some(term) = term {
            return Ok(Lookup::Mapped(term));
        }
        match &self.predicate_fallback {
            Some(term) => Ok(Lookup::Fallback(term.clone())),
            None => Err(Error::UnknownPredicate(label.to_string())),
        }
    }

    /// Map a source provided-by tag to a provenance IRI. Tags that are
    /// already IRIs pass through unchanged.
    pub fn provenance(&self, tag: &str) -> Option<String> {
        if let Some(iri) = self.provided_by.get(tag) {
            return Some(iri.clone());
        }
        if tag.starts_with("http://") || tag.starts_with("https://") {
            return Some(tag.to_string());
        }
        None
    }

    /// Expand a curie identifier into an IRI using the prefix table.
    pub fn expand_curie(&self, id: &str) -> Option<String> {
        let (prefix, local) = id.split_once(':')?;
        if local.is_empty() {
            return None;
        }
        self.prefixes
            .get(prefix)
            .map(|base| format!("{}{}", base, local))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::kg1()
    }
}
