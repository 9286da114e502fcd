//! Name and flavor-text generation tables.
//!
//! Pure lookup collaborators consumed by the generator and the customer
//! order queue; no state of their own.

use rand::Rng;

const GIVEN_NAMES: [&str; 20] = [
    "Aldric", "Brenna", "Cassian", "Dara", "Edwyn", "Fiora", "Garrick", "Hale", "Isolde", "Joren",
    "Kestrel", "Lysa", "Merek", "Nadia", "Osric", "Petra", "Quinn", "Rowan", "Sable", "Tamsin",
];

const EPITHETS: [&str; 16] = [
    "the Bold",
    "of the Vale",
    "Ironhand",
    "the Quiet",
    "Swiftfoot",
    "the Grim",
    "Emberborn",
    "of Coldharbor",
    "the Wary",
    "Stormcaller",
    "the Lucky",
    "Ashwalker",
    "the Stalwart",
    "Nightbriar",
    "the Keen",
    "of the Deep Roads",
];

const CUSTOMER_NAMES: [&str; 12] = [
    "Berta", "Colm", "Davina", "Elspeth", "Franz", "Greta", "Hobb", "Ilsa", "Jasper", "Kira",
    "Lorenz", "Mina",
];

const GEAR_STEMS: [&str; 10] = [
    "Blade", "Helm", "Cloak", "Ring", "Talisman", "Buckler", "Gauntlet", "Vial", "Idol", "Lantern",
];

const GEAR_SUFFIXES: [&str; 8] = [
    "of Embers",
    "of the Hollow",
    "of Wardings",
    "of the Old Kings",
    "of Thorns",
    "of Deep Winter",
    "of the Gull",
    "of Quiet Steps",
];

/// Synthesize an adventurer display name.
#[must_use]
pub fn adventurer_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let given = GIVEN_NAMES[rng.random_range(0..GIVEN_NAMES.len())];
    let epithet = EPITHETS[rng.random_range(0..EPITHETS.len())];
    format!("{given} {epithet}")
}

/// Pick a customer name for a town order.
#[must_use]
pub fn customer_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    CUSTOMER_NAMES[rng.random_range(0..CUSTOMER_NAMES.len())].to_string()
}

/// Synthesize a gear drop name.
#[must_use]
pub fn gear_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let stem = GEAR_STEMS[rng.random_range(0..GEAR_STEMS.len())];
    let suffix = GEAR_SUFFIXES[rng.random_range(0..GEAR_SUFFIXES.len())];
    format!("{stem} {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn names_are_deterministic_for_a_seed() {
        let mut a = SmallRng::seed_from_u64(7);
        let mut b = SmallRng::seed_from_u64(7);
        assert_eq!(adventurer_name(&mut a), adventurer_name(&mut b));
        assert_eq!(gear_name(&mut a), gear_name(&mut b));
    }

    #[test]
    fn customer_names_come_from_table() {
        let mut rng = SmallRng::seed_from_u64(11);
        let name = customer_name(&mut rng);
        assert!(CUSTOMER_NAMES.contains(&name.as_str()));
    }
}
