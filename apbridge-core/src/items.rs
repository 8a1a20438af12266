use serde::{Deserialize, Serialize};
use std::fmt;

use crate::flags::keys;
use crate::{BridgeError, Result};

/// First filler id. Everything at or above this offset is a currency or
/// consumable grant.
pub const FILLER_OFFSET: i64 = 5000;

/// Delivering this id means the multiworld goal was reached.
pub const VICTORY_ITEM_ID: i64 = FILLER_OFFSET - 1;

/// Location ids for first catches under Dexsanity are `offset + dex`.
pub const DEXSANITY_LOCATION_OFFSET: i64 = 1000;

/// Location ids for alternate-form catches are `offset + alt form index`.
pub const ALT_FORM_LOCATION_OFFSET: i64 = 3000;

pub const NATIONAL_DEX_SIZE: u16 = 1025;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Category {
    KeyItem,
    OakItem,
    Script,
    Badge,
    EliteBadge,
    OtherItem,
    EventItem,
    Pokemon,
    AltFormPokemon,
    Mapsanity,
    DungeonTicket,
    Filler,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::KeyItem => "Key Item",
            Category::OakItem => "Oak Item",
            Category::Script => "Script",
            Category::Badge => "Badge",
            Category::EliteBadge => "Elite Badge",
            Category::OtherItem => "Other Item",
            Category::EventItem => "Event Item",
            Category::Pokemon => "Pokemon",
            Category::AltFormPokemon => "Alt Form Pokemon",
            Category::Mapsanity => "Mapsanity",
            Category::DungeonTicket => "Dungeon Ticket",
            Category::Filler => "Filler",
        };
        f.write_str(name)
    }
}

/// A species plus regional/alternate form. Form 0 is the base form; the game
/// writes form `n` as the fractional id `dex.0n` (e.g. `19.01`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PokemonId {
    pub dex: u16,
    #[serde(default)]
    pub form: u8,
}

impl PokemonId {
    pub const fn new(dex: u16) -> Self {
        Self { dex, form: 0 }
    }

    pub const fn alternate(dex: u16, form: u8) -> Self {
        Self { dex, form }
    }

    pub fn is_alternate_form(&self) -> bool {
        self.form != 0
    }

    /// Index of this form in the alt-form table, if it is one we track.
    pub fn alt_form_index(&self) -> Option<usize> {
        ALT_FORMS.iter().position(|(id, _)| id == self)
    }

    /// The Dexsanity location for a first catch. Untracked alternate forms
    /// have none.
    pub fn catch_location(&self) -> Option<i64> {
        if self.is_alternate_form() {
            self.alt_form_index()
                .map(|index| ALT_FORM_LOCATION_OFFSET + index as i64)
        } else {
            Some(DEXSANITY_LOCATION_OFFSET + i64::from(self.dex))
        }
    }
}

impl fmt::Display for PokemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.form == 0 {
            write!(f, "{}", self.dex)
        } else {
            write!(f, "{}.{:02}", self.dex, self.form)
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Money,
    QuestPoints,
    DungeonTokens,
    Diamonds,
    FarmPoints,
    BattlePoints,
}

/// What applying an item does to the game or the flag store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    KeyItem(&'static str),
    OakItem(&'static str),
    Flag(&'static str),
    /// Progressive counter in the flag store, +1 per delivery.
    Counter(&'static str),
    Badge(&'static str),
    GainItem { item: &'static str, amount: u32 },
    Event(&'static str),
    Location(&'static str),
    Pokemon(PokemonId),
    Currency { currency: Currency, amount: u64 },
}

impl Effect {
    /// Cumulative effects apply once per delivery; the rest are unlocks.
    pub fn is_cumulative(&self) -> bool {
        matches!(
            self,
            Effect::Counter(_) | Effect::GainItem { .. } | Effect::Currency { .. }
        )
    }

    /// Effects that only touch the flag store.
    pub fn is_flag(&self) -> bool {
        matches!(self, Effect::Flag(_) | Effect::Counter(_))
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ItemEntry {
    pub name: &'static str,
    pub effect: Effect,
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum Entries {
    List(&'static [ItemEntry]),
    NationalDex,
    AltForms,
}

impl Entries {
    fn len(&self) -> usize {
        match self {
            Entries::List(list) => list.len(),
            Entries::NationalDex => NATIONAL_DEX_SIZE as usize,
            Entries::AltForms => ALT_FORMS.len(),
        }
    }

    fn get(&self, index: usize) -> Option<(&'static str, Effect)> {
        match self {
            Entries::List(list) => list.get(index).map(|e| (e.name, e.effect)),
            Entries::NationalDex => {
                if index < NATIONAL_DEX_SIZE as usize {
                    Some(("Pokemon", Effect::Pokemon(PokemonId::new(index as u16 + 1))))
                } else {
                    None
                }
            }
            Entries::AltForms => ALT_FORMS
                .get(index)
                .map(|(id, name)| (*name, Effect::Pokemon(*id))),
        }
    }
}

/// Half-open id interval `[lower, upper)` owned by one category.
#[derive(Copy, Clone, Debug)]
pub struct CategoryRange {
    pub lower: i64,
    pub upper: i64,
    pub category: Category,
    pub(crate) entries: Entries,
}

impl CategoryRange {
    pub fn contains(&self, id: i64) -> bool {
        id >= self.lower && id < self.upper
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Resolved {
    Victory,
    Effect {
        category: Category,
        index: usize,
        name: &'static str,
        effect: Effect,
    },
    Unknown {
        category: Category,
    },
}

#[derive(Clone, Debug)]
pub struct ItemTable {
    ranges: Vec<CategoryRange>,
}

impl ItemTable {
    /// Builds a table from ranges sorted by lower bound. Overlapping or
    /// non-contiguous ranges are a configuration error.
    pub fn new(ranges: Vec<CategoryRange>) -> Result<Self> {
        for range in &ranges {
            if range.lower >= range.upper {
                return Err(BridgeError::Table(format!(
                    "{} range [{}, {}) is empty",
                    range.category, range.lower, range.upper
                )));
            }
        }
        for pair in ranges.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.lower < prev.upper {
                return Err(BridgeError::Table(format!(
                    "{} range [{}, {}) overlaps {} range [{}, {})",
                    next.category, next.lower, next.upper, prev.category, prev.lower, prev.upper
                )));
            }
            if next.lower > prev.upper {
                return Err(BridgeError::Table(format!(
                    "gap between {} (ends {}) and {} (starts {})",
                    prev.category, prev.upper, next.category, next.lower
                )));
            }
        }
        Ok(Self { ranges })
    }

    pub fn standard() -> Self {
        Self {
            ranges: STANDARD_RANGES.to_vec(),
        }
    }

    pub fn ranges(&self) -> &[CategoryRange] {
        &self.ranges
    }

    pub fn range_for(&self, id: i64) -> Option<&CategoryRange> {
        self.ranges.iter().find(|r| r.contains(id))
    }

    pub fn classify(&self, id: i64) -> Category {
        self.range_for(id)
            .map(|r| r.category)
            .unwrap_or(Category::Filler)
    }

    pub fn resolve(&self, id: i64) -> Resolved {
        if id == VICTORY_ITEM_ID {
            return Resolved::Victory;
        }
        let Some(range) = self.range_for(id) else {
            return Resolved::Unknown {
                category: Category::Filler,
            };
        };
        let index = (id - range.lower) as usize;
        match range.entries.get(index) {
            Some((name, effect)) => Resolved::Effect {
                category: range.category,
                index,
                name,
                effect,
            },
            None => Resolved::Unknown {
                category: range.category,
            },
        }
    }

    /// Human readable name for an id, used by the CLI and logs.
    pub fn describe(&self, id: i64) -> String {
        match self.resolve(id) {
            Resolved::Victory => "Victory".to_string(),
            Resolved::Effect {
                effect: Effect::Pokemon(pokemon),
                name,
                ..
            } if !pokemon.is_alternate_form() => format!("{name} #{pokemon}"),
            Resolved::Effect { name, .. } => name.to_string(),
            Resolved::Unknown { category } => format!("unknown {category}"),
        }
    }
}

impl Default for ItemTable {
    fn default() -> Self {
        Self::standard()
    }
}

const STANDARD_RANGES: [CategoryRange; 12] = [
    CategoryRange {
        lower: 1,
        upper: 100,
        category: Category::KeyItem,
        entries: Entries::List(KEY_ITEMS),
    },
    CategoryRange {
        lower: 100,
        upper: 200,
        category: Category::OakItem,
        entries: Entries::List(OAK_ITEMS),
    },
    CategoryRange {
        lower: 200,
        upper: 300,
        category: Category::Script,
        entries: Entries::List(SCRIPTS),
    },
    CategoryRange {
        lower: 300,
        upper: 400,
        category: Category::Badge,
        entries: Entries::List(BADGES),
    },
    CategoryRange {
        lower: 400,
        upper: 500,
        category: Category::EliteBadge,
        entries: Entries::List(ELITE_BADGES),
    },
    CategoryRange {
        lower: 500,
        upper: 600,
        category: Category::OtherItem,
        entries: Entries::List(OTHER_ITEMS),
    },
    CategoryRange {
        lower: 600,
        upper: 700,
        category: Category::EventItem,
        entries: Entries::List(EVENT_ITEMS),
    },
    CategoryRange {
        lower: 700,
        upper: 800,
        category: Category::DungeonTicket,
        entries: Entries::List(DUNGEON_TICKET),
    },
    CategoryRange {
        lower: 800,
        upper: 1000,
        category: Category::Mapsanity,
        entries: Entries::List(MAPSANITY),
    },
    CategoryRange {
        lower: 1000,
        upper: 3000,
        category: Category::Pokemon,
        entries: Entries::NationalDex,
    },
    CategoryRange {
        lower: 3000,
        upper: FILLER_OFFSET,
        category: Category::AltFormPokemon,
        entries: Entries::AltForms,
    },
    CategoryRange {
        lower: FILLER_OFFSET,
        upper: i64::MAX,
        category: Category::Filler,
        entries: Entries::List(FILLER),
    },
];

pub(crate) const KEY_ITEMS: &[ItemEntry] = &[
    ItemEntry { name: "Town Map", effect: Effect::KeyItem("Town Map") },
    ItemEntry { name: "Teachy TV", effect: Effect::KeyItem("Teachy TV") },
    ItemEntry { name: "Coin Case", effect: Effect::KeyItem("Coin Case") },
    ItemEntry { name: "Super Rod", effect: Effect::KeyItem("Super Rod") },
    ItemEntry { name: "Holo Caster", effect: Effect::KeyItem("Holo Caster") },
    ItemEntry { name: "Mystery Egg", effect: Effect::KeyItem("Mystery Egg") },
    ItemEntry { name: "Safari Ticket", effect: Effect::KeyItem("Safari Ticket") },
    ItemEntry { name: "Wailmer Pail", effect: Effect::KeyItem("Wailmer Pail") },
    ItemEntry { name: "Explorer Kit", effect: Effect::KeyItem("Explorer Kit") },
    ItemEntry { name: "Eon Ticket", effect: Effect::KeyItem("Eon Ticket") },
    ItemEntry { name: "Event Calendar", effect: Effect::KeyItem("Event Calendar") },
    ItemEntry { name: "Gem Case", effect: Effect::KeyItem("Gem Case") },
    ItemEntry { name: "DNA Splicers", effect: Effect::KeyItem("DNA Splicers") },
    ItemEntry { name: "Reins of Unity", effect: Effect::KeyItem("Reins of Unity") },
    ItemEntry { name: "Pokerus Virus", effect: Effect::KeyItem("Pokerus Virus") },
    ItemEntry { name: "Z-Power Ring", effect: Effect::KeyItem("Z-Power Ring") },
    ItemEntry { name: "Pokeball Bag", effect: Effect::KeyItem("Pokeball Bag") },
];

pub(crate) const OAK_ITEMS: &[ItemEntry] = &[
    ItemEntry { name: "Magic Ball", effect: Effect::OakItem("Magic Ball") },
    ItemEntry { name: "Amulet Coin", effect: Effect::OakItem("Amulet Coin") },
    ItemEntry { name: "Rocky Helmet", effect: Effect::OakItem("Rocky Helmet") },
    ItemEntry { name: "Exp Share", effect: Effect::OakItem("Exp Share") },
    ItemEntry { name: "Sprayduck", effect: Effect::OakItem("Sprayduck") },
    ItemEntry { name: "Shiny Charm", effect: Effect::OakItem("Shiny Charm") },
    ItemEntry { name: "Blaze Cassette", effect: Effect::OakItem("Blaze Cassette") },
    ItemEntry { name: "Cell Battery", effect: Effect::OakItem("Cell Battery") },
    ItemEntry { name: "Squirtbottle", effect: Effect::OakItem("Squirtbottle") },
    ItemEntry { name: "Sprinklotad", effect: Effect::OakItem("Sprinklotad") },
    ItemEntry { name: "Explosive Charge", effect: Effect::OakItem("Explosive Charge") },
    ItemEntry { name: "Treasure Scanner", effect: Effect::OakItem("Treasure Scanner") },
];

pub(crate) const SCRIPTS: &[ItemEntry] = &[
    ItemEntry { name: "Enhanced Auto Mine", effect: Effect::Flag(keys::ENHANCED_AUTO_MINE) },
    ItemEntry { name: "Simple Auto Farmer", effect: Effect::Flag(keys::SIMPLE_AUTO_FARMER) },
    ItemEntry { name: "Auto Battle Items", effect: Effect::Flag(keys::AUTO_BATTLE_ITEMS) },
    ItemEntry {
        name: "Simple Weather Changer",
        effect: Effect::Flag(keys::SIMPLE_WEATHER_CHANGER),
    },
    ItemEntry { name: "Oak Items Unlimited", effect: Effect::Flag(keys::OAK_ITEMS_UNLIMITED) },
    ItemEntry { name: "Auto Safari Zone", effect: Effect::Flag(keys::AUTO_SAFARI_ZONE) },
    ItemEntry {
        name: "Auto Safari Zone (Progressive Fast Animations)",
        effect: Effect::Counter(keys::AUTO_SAFARI_ZONE_SPEED),
    },
    ItemEntry {
        name: "Infinite Seasonal Events",
        effect: Effect::Flag(keys::INFINITE_SEASONAL_EVENTS),
    },
];

pub(crate) const BADGES: &[ItemEntry] = &[
    ItemEntry { name: "Boulder Badge", effect: Effect::Badge("Boulder Badge") },
    ItemEntry { name: "Cascade Badge", effect: Effect::Badge("Cascade Badge") },
    ItemEntry { name: "Thunder Badge", effect: Effect::Badge("Thunder Badge") },
    ItemEntry { name: "Rainbow Badge", effect: Effect::Badge("Rainbow Badge") },
    ItemEntry { name: "Soul Badge", effect: Effect::Badge("Soul Badge") },
    ItemEntry { name: "Marsh Badge", effect: Effect::Badge("Marsh Badge") },
    ItemEntry { name: "Volcano Badge", effect: Effect::Badge("Volcano Badge") },
    ItemEntry { name: "Earth Badge", effect: Effect::Badge("Earth Badge") },
    ItemEntry { name: "Zephyr Badge", effect: Effect::Badge("Zephyr Badge") },
    ItemEntry { name: "Hive Badge", effect: Effect::Badge("Hive Badge") },
    ItemEntry { name: "Plain Badge", effect: Effect::Badge("Plain Badge") },
    ItemEntry { name: "Fog Badge", effect: Effect::Badge("Fog Badge") },
    ItemEntry { name: "Storm Badge", effect: Effect::Badge("Storm Badge") },
    ItemEntry { name: "Mineral Badge", effect: Effect::Badge("Mineral Badge") },
    ItemEntry { name: "Glacier Badge", effect: Effect::Badge("Glacier Badge") },
    ItemEntry { name: "Rising Badge", effect: Effect::Badge("Rising Badge") },
];

pub(crate) const ELITE_BADGES: &[ItemEntry] = &[
    ItemEntry {
        name: "Kanto Elite Lorelei Badge",
        effect: Effect::Badge("Kanto Elite Lorelei Badge"),
    },
    ItemEntry { name: "Kanto Elite Bruno Badge", effect: Effect::Badge("Kanto Elite Bruno Badge") },
    ItemEntry {
        name: "Kanto Elite Agatha Badge",
        effect: Effect::Badge("Kanto Elite Agatha Badge"),
    },
    ItemEntry { name: "Kanto Elite Lance Badge", effect: Effect::Badge("Kanto Elite Lance Badge") },
    ItemEntry {
        name: "Kanto Champion Blue Badge",
        effect: Effect::Badge("Kanto Champion Blue Badge"),
    },
    ItemEntry { name: "Johto Elite Will Badge", effect: Effect::Badge("Johto Elite Will Badge") },
    ItemEntry { name: "Johto Elite Koga Badge", effect: Effect::Badge("Johto Elite Koga Badge") },
    ItemEntry { name: "Johto Elite Bruno Badge", effect: Effect::Badge("Johto Elite Bruno Badge") },
    ItemEntry { name: "Johto Elite Karen Badge", effect: Effect::Badge("Johto Elite Karen Badge") },
    ItemEntry {
        name: "Johto Champion Lance Badge",
        effect: Effect::Badge("Johto Champion Lance Badge"),
    },
];

pub(crate) const OTHER_ITEMS: &[ItemEntry] = &[
    ItemEntry { name: "Tutorial Complete", effect: Effect::Flag(keys::TUTORIAL_COMPLETE) },
    ItemEntry { name: "Moon Stone", effect: Effect::GainItem { item: "Moon_stone", amount: 1 } },
    ItemEntry { name: "Leaf Stone", effect: Effect::GainItem { item: "Leaf_stone", amount: 1 } },
    ItemEntry { name: "Fire Stone", effect: Effect::GainItem { item: "Fire_stone", amount: 1 } },
    ItemEntry { name: "Water Stone", effect: Effect::GainItem { item: "Water_stone", amount: 1 } },
    ItemEntry {
        name: "Thunder Stone",
        effect: Effect::GainItem { item: "Thunder_stone", amount: 1 },
    },
    ItemEntry {
        name: "Linking Cord",
        effect: Effect::GainItem { item: "Linking_cord", amount: 1 },
    },
    ItemEntry { name: "Grass Egg", effect: Effect::GainItem { item: "Grass_egg", amount: 1 } },
    ItemEntry { name: "Fire Egg", effect: Effect::GainItem { item: "Fire_egg", amount: 1 } },
    ItemEntry { name: "Water Egg", effect: Effect::GainItem { item: "Water_egg", amount: 1 } },
    ItemEntry {
        name: "Electric Egg",
        effect: Effect::GainItem { item: "Electric_egg", amount: 1 },
    },
    ItemEntry {
        name: "Fighting Egg",
        effect: Effect::GainItem { item: "Fighting_egg", amount: 1 },
    },
    ItemEntry { name: "Dragon Egg", effect: Effect::GainItem { item: "Dragon_egg", amount: 1 } },
];

pub(crate) const EVENT_ITEMS: &[ItemEntry] = &[
    ItemEntry { name: "Lunar New Year", effect: Effect::Event("Lunar New Year") },
    ItemEntry { name: "Easter", effect: Effect::Event("Easter") },
    ItemEntry { name: "Flying Pikachu", effect: Effect::Event("Flying Pikachu") },
    ItemEntry { name: "Mewtwo Strikes Back", effect: Effect::Event("Mewtwo Strikes Back") },
    ItemEntry { name: "Halloween", effect: Effect::Event("Halloween") },
    ItemEntry { name: "Let's Go", effect: Effect::Event("Let's Go") },
    ItemEntry { name: "Merry Christmas", effect: Effect::Event("Merry Christmas") },
    ItemEntry { name: "Hoopa Day", effect: Effect::Event("Hoopa Day") },
];

pub(crate) const DUNGEON_TICKET: &[ItemEntry] = &[ItemEntry {
    name: "Dungeon Ticket",
    effect: Effect::KeyItem("Dungeon Ticket"),
}];

pub(crate) const MAPSANITY: &[ItemEntry] = &[
    ItemEntry { name: "Pallet Town", effect: Effect::Location("Pallet Town") },
    ItemEntry { name: "Kanto Route 1", effect: Effect::Location("Kanto Route 1") },
    ItemEntry { name: "Viridian City", effect: Effect::Location("Viridian City") },
    ItemEntry { name: "Kanto Route 22", effect: Effect::Location("Kanto Route 22") },
    ItemEntry { name: "Kanto Route 2", effect: Effect::Location("Kanto Route 2") },
    ItemEntry { name: "Viridian Forest", effect: Effect::Location("Viridian Forest") },
    ItemEntry { name: "Pewter City", effect: Effect::Location("Pewter City") },
    ItemEntry { name: "Kanto Route 3", effect: Effect::Location("Kanto Route 3") },
    ItemEntry { name: "Mt. Moon", effect: Effect::Location("Mt. Moon") },
    ItemEntry { name: "Kanto Route 4", effect: Effect::Location("Kanto Route 4") },
    ItemEntry { name: "Cerulean City", effect: Effect::Location("Cerulean City") },
    ItemEntry { name: "Kanto Route 24", effect: Effect::Location("Kanto Route 24") },
    ItemEntry { name: "Kanto Route 25", effect: Effect::Location("Kanto Route 25") },
    ItemEntry { name: "Bill's House", effect: Effect::Location("Bill's House") },
    ItemEntry { name: "Kanto Route 5", effect: Effect::Location("Kanto Route 5") },
    ItemEntry { name: "Kanto Route 6", effect: Effect::Location("Kanto Route 6") },
    ItemEntry { name: "Vermilion City", effect: Effect::Location("Vermilion City") },
    ItemEntry { name: "Kanto Route 11", effect: Effect::Location("Kanto Route 11") },
    ItemEntry { name: "Diglett's Cave", effect: Effect::Location("Diglett's Cave") },
    ItemEntry { name: "Kanto Route 9", effect: Effect::Location("Kanto Route 9") },
    ItemEntry { name: "Power Plant", effect: Effect::Location("Power Plant") },
    ItemEntry { name: "Kanto Route 10", effect: Effect::Location("Kanto Route 10") },
    ItemEntry { name: "Rock Tunnel", effect: Effect::Location("Rock Tunnel") },
    ItemEntry { name: "Lavender Town", effect: Effect::Location("Lavender Town") },
    ItemEntry { name: "Pokemon Tower", effect: Effect::Location("Pokemon Tower") },
    ItemEntry { name: "Kanto Route 8", effect: Effect::Location("Kanto Route 8") },
    ItemEntry { name: "Kanto Route 7", effect: Effect::Location("Kanto Route 7") },
    ItemEntry { name: "Celadon City", effect: Effect::Location("Celadon City") },
    ItemEntry { name: "Rocket Game Corner", effect: Effect::Location("Rocket Game Corner") },
    ItemEntry { name: "Saffron City", effect: Effect::Location("Saffron City") },
    ItemEntry { name: "Silph Co.", effect: Effect::Location("Silph Co.") },
    ItemEntry { name: "Kanto Route 12", effect: Effect::Location("Kanto Route 12") },
    ItemEntry { name: "Kanto Route 13", effect: Effect::Location("Kanto Route 13") },
    ItemEntry { name: "Kanto Route 14", effect: Effect::Location("Kanto Route 14") },
    ItemEntry { name: "Kanto Route 15", effect: Effect::Location("Kanto Route 15") },
    ItemEntry { name: "Kanto Route 16", effect: Effect::Location("Kanto Route 16") },
    ItemEntry { name: "Kanto Route 17", effect: Effect::Location("Kanto Route 17") },
    ItemEntry { name: "Kanto Route 18", effect: Effect::Location("Kanto Route 18") },
    ItemEntry { name: "Fuchsia City", effect: Effect::Location("Fuchsia City") },
    ItemEntry { name: "Safari Zone", effect: Effect::Location("Safari Zone") },
    ItemEntry { name: "Kanto Route 19", effect: Effect::Location("Kanto Route 19") },
    ItemEntry { name: "Seafoam Islands", effect: Effect::Location("Seafoam Islands") },
    ItemEntry { name: "Kanto Route 20", effect: Effect::Location("Kanto Route 20") },
    ItemEntry { name: "Kanto Route 21", effect: Effect::Location("Kanto Route 21") },
    ItemEntry { name: "Cinnabar Island", effect: Effect::Location("Cinnabar Island") },
    ItemEntry { name: "Pokemon Mansion", effect: Effect::Location("Pokemon Mansion") },
    ItemEntry { name: "Kanto Route 23", effect: Effect::Location("Kanto Route 23") },
    ItemEntry { name: "Victory Road", effect: Effect::Location("Victory Road") },
    ItemEntry { name: "Indigo Plateau Kanto", effect: Effect::Location("Indigo Plateau Kanto") },
    ItemEntry { name: "Cerulean Cave", effect: Effect::Location("Cerulean Cave") },
    ItemEntry { name: "One Island", effect: Effect::Location("One Island") },
    ItemEntry { name: "Treasure Beach", effect: Effect::Location("Treasure Beach") },
    ItemEntry { name: "Kindle Road", effect: Effect::Location("Kindle Road") },
    ItemEntry { name: "Mt. Ember", effect: Effect::Location("Mt. Ember") },
    ItemEntry { name: "Two Island", effect: Effect::Location("Two Island") },
    ItemEntry { name: "Cape Brink", effect: Effect::Location("Cape Brink") },
    ItemEntry { name: "Three Island", effect: Effect::Location("Three Island") },
    ItemEntry { name: "Bond Bridge", effect: Effect::Location("Bond Bridge") },
    ItemEntry { name: "Berry Forest", effect: Effect::Location("Berry Forest") },
];

pub(crate) const ALT_FORMS: &[(PokemonId, &str)] = &[
    (PokemonId::alternate(19, 1), "Alolan Rattata"),
    (PokemonId::alternate(20, 1), "Alolan Raticate"),
    (PokemonId::alternate(26, 1), "Alolan Raichu"),
    (PokemonId::alternate(27, 1), "Alolan Sandshrew"),
    (PokemonId::alternate(28, 1), "Alolan Sandslash"),
    (PokemonId::alternate(37, 1), "Alolan Vulpix"),
    (PokemonId::alternate(38, 1), "Alolan Ninetales"),
    (PokemonId::alternate(50, 1), "Alolan Diglett"),
    (PokemonId::alternate(51, 1), "Alolan Dugtrio"),
    (PokemonId::alternate(52, 1), "Alolan Meowth"),
    (PokemonId::alternate(53, 1), "Alolan Persian"),
    (PokemonId::alternate(74, 1), "Alolan Geodude"),
    (PokemonId::alternate(75, 1), "Alolan Graveler"),
    (PokemonId::alternate(76, 1), "Alolan Golem"),
    (PokemonId::alternate(88, 1), "Alolan Grimer"),
    (PokemonId::alternate(89, 1), "Alolan Muk"),
    (PokemonId::alternate(103, 1), "Alolan Exeggutor"),
    (PokemonId::alternate(105, 1), "Alolan Marowak"),
];

pub(crate) const FILLER: &[ItemEntry] = &[
    ItemEntry {
        name: "Money (1,000)",
        effect: Effect::Currency { currency: Currency::Money, amount: 1_000 },
    },
    ItemEntry {
        name: "Money (10,000)",
        effect: Effect::Currency { currency: Currency::Money, amount: 10_000 },
    },
    ItemEntry {
        name: "Quest Points (100)",
        effect: Effect::Currency { currency: Currency::QuestPoints, amount: 100 },
    },
    ItemEntry {
        name: "Dungeon Tokens (500)",
        effect: Effect::Currency { currency: Currency::DungeonTokens, amount: 500 },
    },
    ItemEntry {
        name: "Diamonds (5)",
        effect: Effect::Currency { currency: Currency::Diamonds, amount: 5 },
    },
    ItemEntry {
        name: "Farm Points (100)",
        effect: Effect::Currency { currency: Currency::FarmPoints, amount: 100 },
    },
    ItemEntry {
        name: "Battle Points (50)",
        effect: Effect::Currency { currency: Currency::BattlePoints, amount: 50 },
    },
    ItemEntry { name: "Poke Ball x10", effect: Effect::GainItem { item: "Pokeball", amount: 10 } },
    ItemEntry { name: "Great Ball x5", effect: Effect::GainItem { item: "Greatball", amount: 5 } },
    ItemEntry { name: "Ultra Ball x2", effect: Effect::GainItem { item: "Ultraball", amount: 2 } },
    ItemEntry { name: "Rare Candy", effect: Effect::GainItem { item: "Rare_Candy", amount: 1 } },
    ItemEntry { name: "Protein", effect: Effect::GainItem { item: "Protein", amount: 1 } },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_contiguous() {
        let table = ItemTable::standard();
        assert!(ItemTable::new(table.ranges().to_vec()).is_ok());
    }

    #[test]
    fn every_declared_id_has_one_category() {
        let table = ItemTable::standard();
        for range in table.ranges().iter().take(table.ranges().len() - 1) {
            for id in range.lower..range.upper {
                let owners = table.ranges().iter().filter(|r| r.contains(id)).count();
                assert_eq!(owners, 1, "id {id}");
                assert_eq!(table.classify(id), range.category);
            }
        }
    }

    #[test]
    fn ids_outside_ranges_are_filler() {
        let table = ItemTable::standard();
        assert_eq!(table.classify(0), Category::Filler);
        assert_eq!(table.classify(-7), Category::Filler);
        assert_eq!(table.classify(FILLER_OFFSET + 40_000), Category::Filler);
    }

    #[test]
    fn id_five_is_fifth_key_item() {
        let table = ItemTable::standard();
        match table.resolve(5) {
            Resolved::Effect { category, index, effect, .. } => {
                assert_eq!(category, Category::KeyItem);
                assert_eq!(index, 4);
                assert_eq!(effect, Effect::KeyItem(KEY_ITEMS[4].name));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sentinel_resolves_to_victory() {
        let table = ItemTable::standard();
        assert_eq!(table.resolve(VICTORY_ITEM_ID), Resolved::Victory);
        assert_eq!(table.classify(VICTORY_ITEM_ID), Category::AltFormPokemon);
    }

    #[test]
    fn index_past_list_is_unknown() {
        let table = ItemTable::standard();
        let past_keys = 1 + KEY_ITEMS.len() as i64;
        assert_eq!(
            table.resolve(past_keys),
            Resolved::Unknown { category: Category::KeyItem }
        );
        assert_eq!(
            table.resolve(1000 + NATIONAL_DEX_SIZE as i64),
            Resolved::Unknown { category: Category::Pokemon }
        );
    }

    #[test]
    fn pokemon_range_maps_to_dex_numbers() {
        let table = ItemTable::standard();
        match table.resolve(1024) {
            Resolved::Effect { effect: Effect::Pokemon(id), .. } => {
                assert_eq!(id, PokemonId::new(25))
            }
            other => panic!("unexpected {other:?}"),
        }
        match table.resolve(3002) {
            Resolved::Effect { effect: Effect::Pokemon(id), .. } => {
                assert_eq!(id.to_string(), "26.01");
                assert_eq!(id.alt_form_index(), Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn catch_locations_follow_the_location_blocks() {
        assert_eq!(PokemonId::new(25).catch_location(), Some(1025));
        assert_eq!(PokemonId::alternate(26, 1).catch_location(), Some(3002));
        assert_eq!(PokemonId::alternate(25, 9).catch_location(), None);
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let mut ranges = ItemTable::standard().ranges().to_vec();
        ranges[1].lower = 50;
        assert!(matches!(ItemTable::new(ranges), Err(BridgeError::Table(_))));
    }

    #[test]
    fn gaps_are_rejected() {
        let mut ranges = ItemTable::standard().ranges().to_vec();
        ranges[1].lower = 150;
        assert!(matches!(ItemTable::new(ranges), Err(BridgeError::Table(_))));
    }
}
