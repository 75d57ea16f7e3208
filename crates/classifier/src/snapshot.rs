use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    marker::PhantomData,
};

use indexmap::{map::Entry, IndexMap};
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use tracing::warn;

use crate::{
    category::validate_category,
    error::{ClassifierError, ClassifierResult, ParseError},
    frequency::{CategoryCounts, FrequencyStore},
    model::{Model, ModelOptions, DEFAULT_SMOOTHING},
};

pub const SNAPSHOT_HEADER: &str = "---";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotDocument {
    version: u32,
    #[serde(default = "default_smoothing")]
    smoothing: f64,
    #[serde(default)]
    assume_uniform: bool,
    #[serde(default)]
    vocabulary: BTreeSet<String>,
    categories: Entries<CategoryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryRecord {
    documents: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_tokens: Option<u64>,
    tokens: Entries<u64>,
}

fn default_smoothing() -> f64 {
    DEFAULT_SMOOTHING
}

/// Mapping entries in document order with repeated keys kept, so the loader
/// can reject them instead of letting the last one win.
#[derive(Debug)]
struct Entries<V>(Vec<(String, V)>);

impl<V: Serialize> Serialize for Entries<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, value)| (key, value)))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Renders the model as a versioned YAML snapshot that starts with the
/// `---` header.
pub fn dump(model: &Model) -> ClassifierResult<String> {
    let options = model.options();
    let document = SnapshotDocument {
        version: SNAPSHOT_VERSION,
        smoothing: options.smoothing,
        assume_uniform: options.assume_uniform,
        vocabulary: model.store().vocabulary().clone(),
        categories: Entries(
            model
                .store()
                .categories()
                .map(|(name, counts)| {
                    (
                        name.to_string(),
                        CategoryRecord {
                            documents: counts.documents(),
                            total_tokens: Some(counts.total_tokens()),
                            tokens: Entries(
                                counts
                                    .tokens()
                                    .iter()
                                    .map(|(token, count)| (token.clone(), *count))
                                    .collect(),
                            ),
                        },
                    )
                })
                .collect(),
        ),
    };

    let body = serde_yaml::to_string(&document).map_err(ClassifierError::Serialize)?;
    Ok(format!("{SNAPSHOT_HEADER}\n{body}"))
}

/// Blank input yields an empty model. Input starting with the header is read
/// as a snapshot; anything else must be a flat `category -> token -> count`
/// mapping.
pub fn load(text: &str) -> Result<Model, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Model::new());
    }
    if text.starts_with(SNAPSHOT_HEADER) {
        load_snapshot(text)
    } else {
        load_flat(text)
    }
}

fn load_snapshot(text: &str) -> Result<Model, ParseError> {
    let document: SnapshotDocument = serde_yaml::from_str(text)?;
    if document.version != SNAPSHOT_VERSION {
        return Err(ParseError::UnsupportedVersion {
            found: document.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    if !document.smoothing.is_finite() || document.smoothing <= 0.0 {
        return Err(ParseError::InvalidSmoothing(document.smoothing));
    }

    let mut categories = IndexMap::with_capacity(document.categories.0.len());
    for (name, record) in document.categories.0 {
        check_category(&name)?;
        let tokens = token_table(&name, record.tokens)?;
        let counts = CategoryCounts::from_tokens(record.documents, tokens)
            .ok_or_else(|| ParseError::CountOverflow(name.clone()))?;
        if let Some(declared) = record.total_tokens {
            if declared != counts.total_tokens() {
                warn!(
                    category = %name,
                    declared,
                    actual = counts.total_tokens(),
                    "snapshot total_tokens disagrees with token table; using table sum"
                );
            }
        }
        insert_category(&mut categories, name, counts)?;
    }

    let options = ModelOptions {
        smoothing: document.smoothing,
        assume_uniform: document.assume_uniform,
    };
    Ok(Model::from_parts(
        FrequencyStore::from_parts(categories, document.vocabulary),
        options,
    ))
}

fn load_flat(text: &str) -> Result<Model, ParseError> {
    let table: Entries<Entries<u64>> = match serde_yaml::from_str(text) {
        Ok(table) => table,
        Err(err) => {
            return Err(match serde_yaml::from_str::<serde_yaml::Value>(text) {
                Ok(value) if !value.is_mapping() => ParseError::UnrecognizedFormat,
                _ => ParseError::Yaml(err),
            });
        }
    };

    let mut categories = IndexMap::with_capacity(table.0.len());
    for (name, tokens) in table.0 {
        check_category(&name)?;
        let tokens = token_table(&name, tokens)?;
        let counts = CategoryCounts::from_tokens(1, tokens)
            .ok_or_else(|| ParseError::CountOverflow(name.clone()))?;
        insert_category(&mut categories, name, counts)?;
    }

    Ok(Model::from_parts(
        FrequencyStore::from_parts(categories, BTreeSet::new()),
        ModelOptions::default(),
    ))
}

fn insert_category(
    categories: &mut IndexMap<String, CategoryCounts>,
    name: String,
    counts: CategoryCounts,
) -> Result<(), ParseError> {
    match categories.entry(name) {
        Entry::Occupied(entry) => Err(ParseError::DuplicateCategory(entry.key().clone())),
        Entry::Vacant(entry) => {
            entry.insert(counts);
            Ok(())
        }
    }
}

fn token_table(category: &str, entries: Entries<u64>) -> Result<BTreeMap<String, u64>, ParseError> {
    let mut tokens = BTreeMap::new();
    for (token, count) in entries.0 {
        if tokens.contains_key(&token) {
            return Err(ParseError::DuplicateToken {
                category: category.to_string(),
                token,
            });
        }
        tokens.insert(token, count);
    }
    Ok(tokens)
}

fn check_category(name: &str) -> Result<(), ParseError> {
    validate_category(name).map_err(|err| match err {
        ClassifierError::InvalidCategory { category, reason } => {
            ParseError::InvalidCategory { category, reason }
        }
        other => ParseError::InvalidCategory {
            category: name.to_string(),
            reason: other.to_string(),
        },
    })
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
