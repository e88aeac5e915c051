//! Verb sets and author profiles supplied by the host.
//!
//! The engine never mutates a set. Sets are shared as `Arc<ContentSet>` so
//! the machine, the demo ticker and the locale list can all point at the same
//! value, and the fallback set is recognised by identity.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const FALLBACK_SET_NAMES: [&str; 2] = ["idiot", "an idiot"];
pub const DEFAULT_VERBS: [&str; 2] = ["Thinking", "Processing"];
/// Minimum length of the browse list; shorter locale lists are padded from
/// other languages.
pub const MIN_LOCALE_SETS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSet {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub verbs: Vec<String>,
}

impl ContentSet {
    pub fn verb_count(&self) -> usize {
        self.verbs.len()
    }

    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Shell command the post-demo menu copies to the clipboard.
    pub fn install_command(&self) -> String {
        format!("bunx claude-verbs install {}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRepo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub repos: Vec<AuthorRepo>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LibraryFile {
    sets: BTreeMap<String, Vec<ContentSet>>,
    #[serde(default)]
    authors: BTreeMap<String, Author>,
}

/// Sets grouped by language code plus the author lookup.
#[derive(Debug, Clone, Default)]
pub struct ContentLibrary {
    pub sets: BTreeMap<String, Vec<Arc<ContentSet>>>,
    pub authors: BTreeMap<String, Author>,
}

impl ContentLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read content library {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file: LibraryFile = if is_json {
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse library JSON {}", path.display()))?
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse library YAML {}", path.display()))?
        };
        let library = Self::from_groups(file.sets, file.authors);
        library.validate()?;
        Ok(library)
    }

    /// Build from already-loaded groups. Each set's language defaults to its
    /// group key and its verbs are normalised.
    pub fn from_groups(
        groups: BTreeMap<String, Vec<ContentSet>>,
        authors: BTreeMap<String, Author>,
    ) -> Self {
        let sets = groups
            .into_iter()
            .map(|(lang, sets)| {
                let shared = sets
                    .into_iter()
                    .map(|mut set| {
                        if set.language.is_empty() {
                            set.language = lang.clone();
                        }
                        set.verbs = normalize_verbs(&set.verbs);
                        Arc::new(set)
                    })
                    .collect();
                (lang, shared)
            })
            .collect();
        Self { sets, authors }
    }

    pub fn validate(&self) -> Result<()> {
        for (lang, sets) in &self.sets {
            if lang.trim().is_empty() {
                bail!("content library has an empty language key");
            }
            for (index, set) in sets.iter().enumerate() {
                if set.name.trim().is_empty() {
                    bail!("sets.{lang}[{index}] has an empty name");
                }
            }
        }
        Ok(())
    }

    pub fn total_sets(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn author(&self, handle: &str) -> Option<&Author> {
        self.authors.get(handle)
    }

    /// Pick the language to browse: the preferred code's two-letter prefix if
    /// present, otherwise `en`, otherwise the first group.
    pub fn resolve_language(&self, preferred: &str) -> String {
        let short: String = preferred
            .trim()
            .chars()
            .take(2)
            .collect::<String>()
            .to_ascii_lowercase();
        if self.sets.contains_key(&short) {
            return short;
        }
        if self.sets.contains_key(DEFAULT_LANGUAGE) {
            return DEFAULT_LANGUAGE.to_owned();
        }
        self.sets
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned())
    }

    /// The easter-egg set substituted after enough skips while browsing.
    pub fn find_fallback(&self) -> Option<Arc<ContentSet>> {
        self.sets.get(DEFAULT_LANGUAGE).and_then(|sets| {
            sets.iter()
                .find(|set| FALLBACK_SET_NAMES.contains(&set.name.as_str()))
                .cloned()
        })
    }

    /// Assemble the browse list for `lang`. The fallback set never leads the
    /// list, and short lists are padded to [`MIN_LOCALE_SETS`] from a shuffled
    /// pool of every other set.
    pub fn build_locale_sets<R: Rng + ?Sized>(
        &self,
        lang: &str,
        fallback: Option<&Arc<ContentSet>>,
        rng: &mut R,
    ) -> Vec<Arc<ContentSet>> {
        let mut list: Vec<Arc<ContentSet>> = self.sets.get(lang).cloned().unwrap_or_default();
        let leads_with_fallback = match (list.first(), fallback) {
            (Some(first), Some(fallback)) => Arc::ptr_eq(first, fallback),
            _ => false,
        };
        if leads_with_fallback {
            if list.len() > 1 {
                list.rotate_left(1);
            } else {
                list.clear();
            }
        }

        if list.len() < MIN_LOCALE_SETS {
            let mut pool: Vec<Arc<ContentSet>> = self
                .sets
                .values()
                .flatten()
                .filter(|set| !fallback.is_some_and(|fallback| Arc::ptr_eq(set, fallback)))
                .filter(|set| !list.iter().any(|kept| Arc::ptr_eq(kept, set)))
                .cloned()
                .collect();
            pool.shuffle(rng);
            let needed = MIN_LOCALE_SETS - list.len();
            list.extend(pool.into_iter().take(needed));
        }
        debug!(lang, count = list.len(), "locale sets assembled");
        list
    }
}

fn first_person_prefix() -> &'static Regex {
    static FIRST_PERSON_RE: OnceLock<Regex> = OnceLock::new();
    FIRST_PERSON_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*I(?:[’']m| am)\s+").expect("first-person regex should compile")
    })
}

/// Strip a leading "I'm" / "I am" from each verb line.
pub fn normalize_verb(line: &str) -> String {
    first_person_prefix().replace(line, "").into_owned()
}

pub fn normalize_verbs(lines: &[String]) -> Vec<String> {
    lines.iter().map(|line| normalize_verb(line)).collect()
}

/// Verbs to cycle in the demo; falls back to [`DEFAULT_VERBS`] for an empty set.
pub fn demo_verbs(set: &ContentSet) -> Vec<String> {
    if set.verbs.is_empty() {
        DEFAULT_VERBS.iter().map(|verb| (*verb).to_owned()).collect()
    } else {
        set.verbs.clone()
    }
}
