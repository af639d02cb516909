//! Domain entities: core data structures

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::graph::{ObjectRef, TransitionRef};

/// Number of lines forming one sprite block, starting at the `spriteID` line.
/// The trailing `invisHolding` line belongs to the block and is parsed with it.
pub const SPRITE_BLOCK_LINES: usize = 8;

/// Identifier of a game object as it appears in content files, e.g. `"30"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, when it has one.
    pub fn numeric(&self) -> Option<i64> {
        parse_int(&self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Craft depth and difficulty assigned by the difficulty classifier.
///
/// `value` and `difficulty` are assigned together; an object the classifier
/// could not reach has neither.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Depth {
    value: Option<u32>,
    difficulty: Option<f64>,
}

impl Depth {
    pub fn new(value: u32, difficulty: f64) -> Self {
        Self {
            value: Some(value),
            difficulty: Some(difficulty),
        }
    }

    /// Depth of an object with no known way to obtain it.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<u32> {
        self.value
    }

    pub fn difficulty(&self) -> Option<f64> {
        self.difficulty
    }

    /// Orders by difficulty, then by depth value.
    /// A missing value orders after any present value.
    pub fn compare(&self, other: &Depth) -> Ordering {
        match (self.difficulty, other.difficulty) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.value.cmp(&other.value)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// One sprite block of an object file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sprite {
    pub data: BTreeMap<String, String>,
}

impl Sprite {
    /// Parse a sprite block (the `spriteID` line and the lines following it).
    pub fn parse(lines: &[&str]) -> Self {
        let mut data = BTreeMap::new();
        for line in lines {
            for (key, value) in split_fields(line) {
                data.insert(key, value);
            }
        }
        Self { data }
    }

    pub fn id(&self) -> Option<&str> {
        self.data.get("spriteID").map(String::as_str)
    }
}

/// A game object as loaded from its content file.
#[derive(Debug, Clone)]
pub struct GameObject {
    pub id: ObjectId,
    pub name: Option<String>,
    /// Raw `key=value` attributes
    pub data: BTreeMap<String, String>,
    /// Biomes parsed from `mapChance=<chance>#biomes_<a>,<b>`
    pub biomes: Vec<String>,
    pub sprites: Vec<Sprite>,
    /// Ids of the category parents listing this object
    pub categories: Vec<ObjectId>,
    pub depth: Depth,
    pub version: Option<u32>,
    /// Edges producing this object; the first one is the primary transition
    pub transitions_toward: Vec<TransitionRef>,
    /// Edges consuming this object
    pub transitions_away: Vec<TransitionRef>,
}

impl GameObject {
    /// Create an object with no attributes.
    pub fn new(id: impl Into<ObjectId>, name: Option<&str>) -> Self {
        let id = id.into();
        let mut data = BTreeMap::new();
        data.insert("id".to_string(), id.to_string());
        Self {
            id,
            name: name.map(str::to_string),
            data,
            biomes: Vec::new(),
            sprites: Vec::new(),
            categories: Vec::new(),
            depth: Depth::unknown(),
            version: None,
            transitions_toward: Vec::new(),
            transitions_away: Vec::new(),
        }
    }

    /// Parse object file content.
    ///
    /// Extracts:
    /// - the display name from line 1 (`#` rendered as ` - `)
    /// - sprite blocks starting at lines containing `spriteID`
    /// - `key=value` attributes from every other line
    pub fn parse(content: &str) -> DomainResult<Self> {
        let lines: Vec<&str> = content.lines().collect();
        let mut data = BTreeMap::new();
        let mut biomes = Vec::new();
        let mut sprites = Vec::new();
        let mut name = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if i == 1 {
                name = parse_name(line);
                i += 1;
            } else if line.contains("spriteID") {
                let end = (i + SPRITE_BLOCK_LINES).min(lines.len());
                sprites.push(Sprite::parse(&lines[i..end]));
                i = end;
            } else {
                for (key, value) in split_fields(line) {
                    if key == "mapChance" {
                        let (chance, parsed) = parse_map_chance(&value);
                        biomes = parsed;
                        data.insert(key, chance);
                    } else {
                        data.insert(key, value);
                    }
                }
                i += 1;
            }
        }

        let id = data
            .get("id")
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or_else(|| DomainError::InvalidObject {
                message: format!(
                    "missing id in object starting with {:?}",
                    lines.first().unwrap_or(&"")
                ),
            })?;

        Ok(Self {
            id: ObjectId::new(id),
            name,
            data,
            biomes,
            sprites,
            categories: Vec::new(),
            depth: Depth::unknown(),
            version: None,
            transitions_toward: Vec::new(),
            transitions_away: Vec::new(),
        })
    }

    pub fn has_sprite(&self) -> bool {
        !self.sprites.is_empty()
    }

    /// Sort key placing the newest (highest numeric id) objects first.
    pub fn sort_weight(&self) -> i64 {
        -self.id.numeric().unwrap_or(0)
    }

    /// Obtainable directly from the environment.
    pub fn is_natural(&self) -> bool {
        self.map_chance().is_some_and(|chance| chance > 0.0)
    }

    pub fn map_chance(&self) -> Option<f64> {
        self.float("mapChance")
    }

    pub fn food_value(&self) -> Option<i64> {
        self.data.get("foodValue").and_then(|v| parse_int(v))
    }

    pub fn heat_value(&self) -> Option<i64> {
        self.data.get("heatValue").and_then(|v| parse_int(v))
    }

    pub fn num_uses(&self) -> Option<i64> {
        let uses = self.data.get("numUses")?;
        parse_int(uses.split(',').next().unwrap_or_default())
    }

    pub fn use_chance(&self) -> Option<f64> {
        let uses = self.data.get("numUses")?;
        let (_, chance) = uses.split_once(',')?;
        chance.trim().parse().ok()
    }

    pub fn num_slots(&self) -> Option<i64> {
        let slots = self.data.get("numSlots")?;
        parse_int(slots.split('#').next().unwrap_or_default())
    }

    pub fn slot_size(&self) -> Option<f64> {
        self.float("slotSize")
    }

    /// Size when stored in a container; only for containable objects.
    pub fn contain_size(&self) -> Option<f64> {
        if self.data.get("containable").map(String::as_str) != Some("1") {
            return None;
        }
        let size = self.data.get("containSize")?;
        size.split(',').next()?.trim().parse().ok()
    }

    /// Clothing slot code, absent for non-clothing (`n`).
    pub fn clothing(&self) -> Option<&str> {
        self.data
            .get("clothing")
            .map(String::as_str)
            .filter(|c| *c != "n")
    }

    /// Insulation contributed when worn: slot weight times `rValue`.
    pub fn insulation(&self) -> Option<f64> {
        let weight = match self.clothing()? {
            "h" => 0.25,
            "t" => 0.35,
            "b" => 0.2,
            "s" => 0.1,
            "p" => 0.1,
            _ => return None,
        };
        Some(weight * self.float("rValue")?)
    }

    fn float(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(|v| v.trim().parse().ok())
    }
}

/// A directed edge: actor used on target yields new actor and new target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub actor: Option<ObjectRef>,
    pub target: Option<ObjectRef>,
    pub new_actor: Option<ObjectRef>,
    pub new_target: Option<ObjectRef>,
    /// Seconds until the target transforms on its own
    pub decay: Option<u32>,
    /// The actor is used as a tool
    pub tool: bool,
    /// No actor required
    pub hand: bool,
}

impl Transition {
    /// Not a full two-input transformation.
    pub fn is_trivial(&self) -> bool {
        self.decay.is_some() || self.actor.is_none() || self.target.is_none()
    }

    /// Neither actor nor target nor decay; tolerated but contributes nothing.
    pub fn is_malformed(&self) -> bool {
        self.actor.is_none() && self.target.is_none() && self.decay.is_none()
    }

    /// Objects consumed by this edge, actor first.
    pub fn inputs(&self) -> impl Iterator<Item = ObjectRef> {
        self.actor.into_iter().chain(self.target)
    }

    /// Objects produced by this edge.
    ///
    /// A by-product equal to one of the inputs merely survives the
    /// transition and is not produced by it.
    pub fn products(&self) -> Vec<ObjectRef> {
        let mut products = Vec::with_capacity(2);
        for product in [self.new_actor, self.new_target].into_iter().flatten() {
            let survives = Some(product) == self.actor || Some(product) == self.target;
            if !survives && !products.contains(&product) {
                products.push(product);
            }
        }
        products
    }
}

/// Split a content line into `key=value` fields.
///
/// Fields are separated by `,`; a segment without `=` continues the value
/// of the previous field (`numUses=3,0.5` keeps `3,0.5`).
pub(crate) fn split_fields(line: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = Vec::new();
    for segment in line.split(',') {
        match segment.split_once('=') {
            Some((key, value)) => fields.push((key.trim().to_string(), value.trim().to_string())),
            None => {
                if let Some((_, value)) = fields.last_mut() {
                    value.push(',');
                    value.push_str(segment.trim());
                }
            }
        }
    }
    fields
}

fn parse_name(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.replace('#', " - "))
    }
}

/// `0.5#biomes_0,1` -> (`0.5`, [`0`, `1`])
fn parse_map_chance(value: &str) -> (String, Vec<String>) {
    match value.split_once('#') {
        Some((chance, rest)) => {
            let biomes = rest
                .split_once('_')
                .map(|(_, list)| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|b| !b.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            (chance.trim().to_string(), biomes)
        }
        None => (value.trim().to_string(), Vec::new()),
    }
}

/// Leading integer of a value (`"12.5"` -> 12, `"x"` -> None).
pub(crate) fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse().ok()
}
