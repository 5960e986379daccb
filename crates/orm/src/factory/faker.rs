//! Fake data generation for factories
//!
//! `Faker` owns its random generator, so a fixed seed reproduces the same
//! sequence of values.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

use crate::model::dates::to_storage_string;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Basil", "Cora", "Dmitri", "Elena", "Felix", "Greta", "Hugo", "Iris", "Jonah",
    "Kira", "Leon", "Maren", "Nico", "Opal", "Priya", "Rafael", "Selma", "Tobias", "Una",
    "Viktor", "Wren", "Yusuf", "Zora",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Brennan", "Castillo", "Dalton", "Eriksen", "Foster", "Gallagher", "Hoffman",
    "Ibarra", "Jensen", "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov",
    "Quintero", "Rasmussen", "Sato", "Thornton", "Varga", "Whitaker", "Yilmaz", "Zimmer",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test", "inbox.test"];

const COMPANY_WORDS: &[&str] = &[
    "Northwind", "Bluefield", "Ironbark", "Silverline", "Copperleaf", "Brightwater", "Stonegate", "Redfern",
];

const COMPANY_SUFFIXES: &[&str] = &["Labs", "Partners", "Holdings", "Works", "Group", "Logistics", "Studio", "Co"];

const STREETS: &[&str] = &[
    "Harbor Road", "Linden Avenue", "Quarry Lane", "Mill Street", "Orchard Way", "Canal Street",
    "Beacon Hill", "Juniper Court", "Meadow Drive", "Station Road",
];

const CITIES: &[&str] = &[
    "Ashford", "Brookhaven", "Clearwater", "Dunmore", "Eastwick", "Fairhaven", "Glenwood", "Hollis",
    "Kingsport", "Lakeside", "Milford", "Northgate",
];

const COUNTRIES: &[&str] = &[
    "Argentina", "Canada", "Denmark", "Estonia", "Finland", "Ghana", "Ireland", "Japan", "Kenya",
    "New Zealand", "Portugal", "Uruguay",
];

const WORDS: &[&str] = &[
    "amber", "anchor", "beacon", "canvas", "cipher", "delta", "ember", "fable", "granite", "harvest",
    "lantern", "meridian", "nimbus", "orbit", "pylon", "quartz", "ripple", "summit", "timber", "vertex",
];

/// Seedable fake value generator
#[derive(Debug, Clone)]
pub struct Faker {
    rng: StdRng,
}

impl Default for Faker {
    fn default() -> Self {
        Self::new()
    }
}

impl Faker {
    /// Generator seeded from system entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }

    /// Direct access to the generator
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn pick_str(&mut self, items: &[&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// Random element of `items`
    pub fn pick<T: Clone>(&mut self, items: &[T]) -> Option<T> {
        items.choose(&mut self.rng).cloned()
    }

    /// Integer in `min..=max`
    pub fn number(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Float in `min..max`, rounded to two decimals
    pub fn float(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        (self.rng.gen_range(min..max) * 100.0).round() / 100.0
    }

    /// `true` with the given probability (clamped to 0..=1, NaN counts as 0)
    pub fn boolean(&mut self, probability: f64) -> bool {
        if probability.is_nan() {
            return false;
        }
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Version 4 UUID drawn from this generator
    pub fn uuid(&mut self) -> uuid::Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    pub fn first_name(&mut self) -> String {
        self.pick_str(FIRST_NAMES).to_string()
    }

    pub fn last_name(&mut self) -> String {
        self.pick_str(LAST_NAMES).to_string()
    }

    pub fn name(&mut self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    pub fn username(&mut self) -> String {
        let word = self.pick_str(WORDS);
        let first = self.first_name().to_lowercase();
        format!("{}_{}{}", first, word, self.number(1, 99))
    }

    pub fn email(&mut self) -> String {
        let first = self.first_name().to_lowercase();
        let last = self.last_name().to_lowercase();
        let domain = self.pick_str(DOMAINS);
        format!("{}.{}{}@{}", first, last, self.number(1, 999), domain)
    }

    /// Email unique across one factory run: the index is embedded
    pub fn unique_email(&mut self, index: usize) -> String {
        let first = self.first_name().to_lowercase();
        let domain = self.pick_str(DOMAINS);
        format!("{}{}@{}", first, index, domain)
    }

    pub fn company(&mut self) -> String {
        format!("{} {}", self.pick_str(COMPANY_WORDS), self.pick_str(COMPANY_SUFFIXES))
    }

    pub fn phone(&mut self) -> String {
        format!(
            "+1-{:03}-{:03}-{:04}",
            self.number(201, 989),
            self.number(200, 999),
            self.number(0, 9999)
        )
    }

    pub fn street_address(&mut self) -> String {
        format!("{} {}", self.number(1, 4999), self.pick_str(STREETS))
    }

    pub fn city(&mut self) -> String {
        self.pick_str(CITIES).to_string()
    }

    pub fn country(&mut self) -> String {
        self.pick_str(COUNTRIES).to_string()
    }

    pub fn postal_code(&mut self) -> String {
        format!("{:05}", self.number(1000, 99999))
    }

    pub fn word(&mut self) -> String {
        self.pick_str(WORDS).to_string()
    }

    pub fn words(&mut self, count: usize) -> Vec<String> {
        (0..count).map(|_| self.word()).collect()
    }

    /// Capitalized sentence of `words` words
    pub fn sentence(&mut self, words: usize) -> String {
        let mut sentence = self.words(words.max(1)).join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }

    pub fn paragraph(&mut self, sentences: usize) -> String {
        (0..sentences.max(1))
            .map(|_| {
                let words = self.number(4, 10) as usize;
                self.sentence(words)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn url(&mut self) -> String {
        format!("https://{}.{}/{}", self.word(), self.pick_str(DOMAINS), self.word())
    }

    /// Timestamp between `start` and `end`, in storage format
    pub fn date_between(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> String {
        let span = (end - start).num_seconds().max(0);
        let offset = self.number(0, span);
        to_storage_string(&(start + Duration::seconds(offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_seeded_faker_is_deterministic() {
        let mut a = Faker::seeded(42);
        let mut b = Faker::seeded(42);
        assert_eq!(a.name(), b.name());
        assert_eq!(a.email(), b.email());
        assert_eq!(a.uuid(), b.uuid());
        assert_eq!(a.paragraph(2), b.paragraph(2));
    }

    #[test]
    fn test_value_shapes() {
        let mut faker = Faker::seeded(7);
        assert!(faker.email().contains('@'));
        assert_eq!(faker.uuid().get_version_num(), 4);
        assert!(faker.sentence(3).ends_with('.'));
        assert_eq!(faker.postal_code().len(), 5);

        let n = faker.number(5, 10);
        assert!((5..=10).contains(&n));
        assert_eq!(faker.number(3, 3), 3);
        assert!(!faker.boolean(0.0));
        assert!(faker.boolean(1.0));
        assert!(!faker.boolean(f64::NAN));
        assert_eq!(faker.unique_email(12).split('@').next().map(|s| s.ends_with("12")), Some(true));
    }

    #[test]
    fn test_date_between_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut faker = Faker::seeded(1);
        for _ in 0..20 {
            let date = faker.date_between(start, end);
            assert!(date.as_str() >= "2024-01-01 00:00:00" && date.as_str() <= "2024-01-31 00:00:00");
        }
    }
}
