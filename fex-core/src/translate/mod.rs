//! Snapshot → metric record translation
//!
//! Each category has a fixed traversal: keyed mappings along the path
//! become label values, leaves become sample values. Translation is pure;
//! the same snapshot always yields the same records in the same order
//! (sorted by metric name, then label values).
//!
//! Rules applied across categories:
//! - required branches missing or of the wrong shape → `SchemaMismatchError`
//! - counter leaves that are absent read as 0
//! - booleans read as 0/1
//! - production and consumption are always reported as magnitudes
//! - an empty payload yields no records
//! - entity counts are zero-filled from a declared universe of names

pub mod schema;
mod translate_proptest;

use std::collections::{BTreeMap, BTreeSet};

use crate::core::{Category, MetricDesc, MetricRecord, SchemaMismatchError};
use crate::data::{Node, Snapshot};

use self::schema::*;

type Mapping = BTreeMap<String, Node>;

static EMPTY: Mapping = BTreeMap::new();

/// Path-aware accessors that turn shape violations into schema errors
struct Walker {
    category: Category,
}

impl Walker {
    fn mismatch(&self, path: &str, expected: &'static str) -> SchemaMismatchError {
        SchemaMismatchError {
            category: self.category,
            path: path.to_string(),
            expected,
        }
    }

    fn mapping<'a>(&self, node: &'a Node, path: &str) -> Result<&'a Mapping, SchemaMismatchError> {
        node.as_mapping()
            .ok_or_else(|| self.mismatch(path, "mapping"))
    }

    /// Required child mapping
    fn child<'a>(
        &self,
        parent: &'a Mapping,
        key: &str,
        path: &str,
    ) -> Result<&'a Mapping, SchemaMismatchError> {
        let path = join(path, key);
        match parent.get(key) {
            Some(node) => self.mapping(node, &path),
            None => Err(self.mismatch(&path, "mapping")),
        }
    }

    /// Optional child mapping; absent or null reads as empty
    fn optional_child<'a>(
        &self,
        parent: &'a Mapping,
        key: &str,
        path: &str,
    ) -> Result<&'a Mapping, SchemaMismatchError> {
        match parent.get(key) {
            None => Ok(&EMPTY),
            Some(node) if node.is_null() => Ok(&EMPTY),
            Some(node) => self.mapping(node, &join(path, key)),
        }
    }

    /// Required numeric leaf
    fn gauge(&self, parent: &Mapping, key: &str, path: &str) -> Result<f64, SchemaMismatchError> {
        parent
            .get(key)
            .and_then(Node::as_f64)
            .ok_or_else(|| self.mismatch(&join(path, key), "number"))
    }

    /// Counter leaf; absent or null reads as 0
    fn counter(&self, parent: &Mapping, key: &str, path: &str) -> Result<f64, SchemaMismatchError> {
        match parent.get(key) {
            None => Ok(0.0),
            Some(node) if node.is_null() => Ok(0.0),
            Some(node) => self.number(node, &join(path, key)),
        }
    }

    fn number(&self, node: &Node, path: &str) -> Result<f64, SchemaMismatchError> {
        node.as_f64().ok_or_else(|| self.mismatch(path, "number"))
    }

    fn text<'a>(
        &self,
        parent: &'a Mapping,
        key: &str,
        path: &str,
    ) -> Result<&'a str, SchemaMismatchError> {
        parent
            .get(key)
            .and_then(Node::as_str)
            .ok_or_else(|| self.mismatch(&join(path, key), "string"))
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn record(desc: &'static MetricDesc, labels: &[&str], value: f64) -> MetricRecord {
    MetricRecord::new(
        desc,
        labels.iter().map(|s| s.to_string()).collect(),
        value,
    )
}

/// Translates category snapshots into metric records
#[derive(Debug, Clone)]
pub struct Translator {
    entity_universe: BTreeSet<String>,
}

impl Translator {
    /// Translator with the built-in entity universe
    pub fn new() -> Self {
        Self::with_entity_universe(DEFAULT_ENTITY_UNIVERSE.iter().copied())
    }

    /// Translator with exactly the given entity universe
    pub fn with_entity_universe<I, S>(universe: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_universe: universe.into_iter().map(Into::into).collect(),
        }
    }

    /// Add names to the entity universe
    pub fn extend_entity_universe<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_universe
            .extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn entity_universe(&self) -> &BTreeSet<String> {
        &self.entity_universe
    }

    /// Flatten a snapshot according to `category`'s schema
    pub fn translate(
        &self,
        category: Category,
        snapshot: &Snapshot,
    ) -> Result<Vec<MetricRecord>, SchemaMismatchError> {
        if snapshot.root.is_empty() {
            return Ok(Vec::new());
        }

        let walker = Walker { category };
        let root = walker.mapping(&snapshot.root, "")?;
        let mut out = Vec::new();

        match category {
            Category::Time => translate_time(&walker, root, &mut out)?,
            Category::Player => translate_player(&walker, root, &mut out)?,
            Category::Launches => translate_launches(&walker, root, &mut out)?,
            Category::Research => translate_research(&walker, root, &mut out)?,
            Category::Production => translate_production(&walker, root, &mut out)?,
            Category::Entities => self.translate_entities(&walker, root, &mut out)?,
            Category::Pollution => translate_pollution(&walker, root, &mut out)?,
        }

        out.sort_by(|a, b| {
            a.desc
                .name
                .cmp(b.desc.name)
                .then_with(|| a.label_values.cmp(&b.label_values))
        });
        Ok(out)
    }

    /// `forces.<force>.<surface>.entities.<name>`, zero-filled
    fn translate_entities(
        &self,
        w: &Walker,
        root: &Mapping,
        out: &mut Vec<MetricRecord>,
    ) -> Result<(), SchemaMismatchError> {
        for (force, surfaces) in w.child(root, "forces", "")? {
            let force = force.as_str();
            let force_path = join("forces", force);
            for (surface, data) in w.mapping(surfaces, &force_path)? {
                let path = join(&force_path, surface);
                let entities = w.child(w.mapping(data, &path)?, "entities", &path)?;
                let entities_path = join(&path, "entities");

                let mut counts: BTreeMap<&str, f64> = self
                    .entity_universe
                    .iter()
                    .map(|name| (name.as_str(), 0.0))
                    .collect();
                for (name, count) in entities {
                    let value = if count.is_null() {
                        0.0
                    } else {
                        w.number(count, &join(&entities_path, name))?
                    };
                    counts.insert(name.as_str(), value);
                }

                for (name, count) in counts {
                    out.push(record(&ENTITY_COUNT, &[force, name, surface.as_str()], count));
                }
            }
        }
        Ok(())
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

/// `time.ticks.{current,played,paused}`, `surfaces.<surface>.time.ticks_per_day`
fn translate_time(
    w: &Walker,
    root: &Mapping,
    out: &mut Vec<MetricRecord>,
) -> Result<(), SchemaMismatchError> {
    let ticks = w.child(w.child(root, "time", "")?, "ticks", "time")?;
    out.push(record(&GAME_TICK, &[], w.gauge(ticks, "current", "time.ticks")?));
    out.push(record(
        &GAME_TICKS_PLAYED,
        &[],
        w.gauge(ticks, "played", "time.ticks")?,
    ));
    out.push(record(
        &GAME_TICK_PAUSED,
        &[],
        w.gauge(ticks, "paused", "time.ticks")?,
    ));

    for (surface, data) in w.child(root, "surfaces", "")? {
        let path = join("surfaces", surface);
        let time = w.child(w.mapping(data, &path)?, "time", &path)?;
        let ticks_per_day = w.gauge(time, "ticks_per_day", &join(&path, "time"))?;
        out.push(record(&SURFACE_TICKS_PER_DAY, &[surface.as_str()], ticks_per_day));
    }
    Ok(())
}

/// `players.<username>.connected`
fn translate_player(
    w: &Walker,
    root: &Mapping,
    out: &mut Vec<MetricRecord>,
) -> Result<(), SchemaMismatchError> {
    for (username, state) in w.child(root, "players", "")? {
        let path = join("players", username);
        let connected = w.gauge(w.mapping(state, &path)?, "connected", &path)?;
        out.push(record(&PLAYER_CONNECTED, &[username.as_str()], connected));
    }
    Ok(())
}

/// `forces.<force>.launches.{count,items.<name>}`
fn translate_launches(
    w: &Walker,
    root: &Mapping,
    out: &mut Vec<MetricRecord>,
) -> Result<(), SchemaMismatchError> {
    for (force, data) in w.child(root, "forces", "")? {
        let path = join("forces", force);
        let launches = w.child(w.mapping(data, &path)?, "launches", &path)?;
        let launches_path = join(&path, "launches");

        let count = w.counter(launches, "count", &launches_path)?;
        out.push(record(&ROCKETS_LAUNCHED, &[force.as_str()], count));

        let items_path = join(&launches_path, "items");
        for (name, launched) in w.optional_child(launches, "items", &launches_path)? {
            let value = w.number(launched, &join(&items_path, name))?;
            out.push(record(&ITEMS_LAUNCHED, &[force.as_str(), name.as_str()], value));
        }
    }
    Ok(())
}

/// `forces.<force>.research.progress`
fn translate_research(
    w: &Walker,
    root: &Mapping,
    out: &mut Vec<MetricRecord>,
) -> Result<(), SchemaMismatchError> {
    for (force, data) in w.child(root, "forces", "")? {
        let path = join("forces", force);
        let research = w.child(w.mapping(data, &path)?, "research", &path)?;
        let progress = w.gauge(research, "progress", &join(&path, "research"))?;
        out.push(record(&FORCE_RESEARCH_PROGRESS, &[force.as_str()], progress));
    }
    Ok(())
}

/// `forces.<force>.<surface>.prototypes.<prototype>.{production,consumption,type}`
fn translate_production(
    w: &Walker,
    root: &Mapping,
    out: &mut Vec<MetricRecord>,
) -> Result<(), SchemaMismatchError> {
    for (force, surfaces) in w.child(root, "forces", "")? {
        let force_path = join("forces", force);
        for (surface, data) in w.mapping(surfaces, &force_path)? {
            let path = join(&force_path, surface);
            let prototypes = w.child(w.mapping(data, &path)?, "prototypes", &path)?;
            let prototypes_path = join(&path, "prototypes");

            for (prototype, entry) in prototypes {
                let entry_path = join(&prototypes_path, prototype);
                let entry = w.mapping(entry, &entry_path)?;
                let kind = w.text(entry, "type", &entry_path)?;
                let labels = [force.as_str(), prototype.as_str(), surface.as_str(), kind];

                let production = w.counter(entry, "production", &entry_path)?.abs();
                let consumption = w.counter(entry, "consumption", &entry_path)?.abs();
                out.push(record(&PROTOTYPE_PRODUCTION, &labels, production));
                out.push(record(&PROTOTYPE_CONSUMPTION, &labels, consumption));
            }
        }
    }
    Ok(())
}

/// `surfaces.<surface>.pollution.{total,production.<source>,consumption.<source>}`
fn translate_pollution(
    w: &Walker,
    root: &Mapping,
    out: &mut Vec<MetricRecord>,
) -> Result<(), SchemaMismatchError> {
    for (surface, data) in w.child(root, "surfaces", "")? {
        let path = join("surfaces", surface);
        let pollution = w.child(w.mapping(data, &path)?, "pollution", &path)?;
        let pollution_path = join(&path, "pollution");

        let total = w.gauge(pollution, "total", &pollution_path)?;
        out.push(record(&SURFACE_POLLUTION_TOTAL, &[surface.as_str()], total));

        for (desc, key) in [
            (&POLLUTION_PRODUCTION, "production"),
            (&POLLUTION_CONSUMPTION, "consumption"),
        ] {
            let flows_path = join(&pollution_path, key);
            for (source, amount) in w.optional_child(pollution, key, &pollution_path)? {
                let value = w.number(amount, &join(&flows_path, source))?.abs();
                out.push(record(desc, &[source.as_str(), surface.as_str()], value));
            }
        }
    }
    Ok(())
}
