// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Random test-data generation. Every generator takes the random source as
//! an explicit parameter so runs are reproducible under a fixed seed; there
//! is no ambient global RNG state anywhere in the harness.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{Address, Feedback};

const ADJECTIVES: &[&str] = &[
    "brisk", "cosmic", "dusty", "eager", "fuzzy", "gentle", "hasty", "icy", "jolly", "keen",
    "lunar", "mellow", "nimble", "orbital", "plucky", "quiet", "rusty", "solar", "tidy", "vivid",
];

const NOUNS: &[&str] = &[
    "courier", "beacon", "crate", "docker", "freighter", "gasket", "hauler", "lander", "magnet",
    "nozzle", "orbiter", "pallet", "rover", "sorter", "thruster", "tugboat", "voyager", "winch",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Carmen", "Dexter", "Elena", "Felix", "Greta", "Hugo", "Irene", "Jonas",
    "Klara", "Lennart", "Mira", "Nadia", "Oskar", "Petra", "Quentin", "Rosa", "Stefan", "Tilda",
];

const LAST_NAMES: &[&str] = &[
    "Albrecht", "Becker", "Conrad", "Dietrich", "Engel", "Falk", "Gruber", "Hoffmann", "Imhof",
    "Jansen", "Keller", "Lorenz", "Moser", "Neumann", "Oswald", "Pfeiffer", "Richter", "Sauer",
];

const STREETS: &[&str] = &[
    "Maple Avenue", "Crater Rim Road", "Harbor Street", "Telemetry Lane", "Juniper Drive",
    "Relay Court", "Meridian Boulevard", "Cargo Row", "Summit Way", "Gantry Street",
];

const CITIES: &[&str] = &[
    "Springfield", "Fairview", "Riverton", "Oakdale", "Brookhaven", "Clarksburg", "Milltown",
    "Lakewood", "Ashford", "Granite Falls",
];

const EMAIL_DOMAINS: &[&str] = &["example.org", "mailbox.test", "orbitmail.test", "postbox.test"];

const PASSWORD_LENGTH: usize = 12;

const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+-_$/!@#%&*()[]";

fn pick<'a, R: Rng>(rng: &mut R, list: &[&'a str]) -> &'a str {
    list.choose(rng).copied().unwrap_or(list[0])
}

/// Silly two-word username with a numeric suffix to keep collisions rare
/// (collisions are still handled upstream by the registration retry loop).
pub fn new_username<R: Rng>(rng: &mut R) -> String {
    let adjective = pick(rng, ADJECTIVES);
    let noun = pick(rng, NOUNS);
    let n: u32 = rng.gen_range(0..10_000);
    format!("{adjective}_{noun}{n}")
}

pub fn new_password<R: Rng>(rng: &mut R) -> String {
    (0..PASSWORD_LENGTH)
        .map(|_| {
            let i = rng.gen_range(0..PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[i] as char
        })
        .collect()
}

pub fn new_full_name<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

pub fn new_email<R: Rng>(rng: &mut R) -> String {
    let user = pick(rng, NOUNS);
    let n: u32 = rng.gen_range(0..100_000);
    format!("{user}{n}@{}", pick(rng, EMAIL_DOMAINS))
}

pub fn new_address<R: Rng>(rng: &mut R) -> Address {
    Address {
        street: format!("{} {}", rng.gen_range(1..2000), pick(rng, STREETS)),
        zip: format!("{:05}", rng.gen_range(10_000..100_000)),
        city: pick(rng, CITIES).to_owned(),
        country: "USA".to_owned(),
        planet: "Earth".to_owned(),
    }
}

/// Fixed corpus of plausible customer reviews used by the plant phase. The
/// text is a carrier; what matters downstream is that the service displays
/// the author publicly.
const FEEDBACK_CORPUS: &[(u8, &str)] = &[
    (1, "Two parcels lost this month alone. How do you even lose something inside a sealed container ship?"),
    (1, "Paid for express delivery to Mars and the package surfaced three weeks later on Ganymede. No refund, no apology."),
    (2, "The express option costs triple and arrived after the regular shipment I sent the same day. Save your money."),
    (3, "Mixed experience. Most deliveries are fine, but every few months one goes missing or gets marked as delivered while I was home all day."),
    (3, "Packaging survived re-entry, contents did not. At least the tracking page was pretty."),
    (4, "Works as advertised almost every time. Out of maybe a hundred shipments I had problems twice."),
    (5, "Ordered spare batteries from Earth while stationed on Ceres. Quoted twelve months, delivered in nine. Genuinely impressed."),
    (5, "Friendly couriers, honest tracking, and my film rolls arrived radiation-shielded and on schedule. Best carrier off-world."),
];

/// Picks one review from the corpus, falling back to the placeholder entry
/// rather than aborting a check run.
pub fn pick_feedback<R: Rng>(rng: &mut R) -> Feedback {
    FEEDBACK_CORPUS
        .choose(rng)
        .copied()
        .and_then(|(rating, text)| Feedback::new(rating, text).ok())
        .unwrap_or_else(Feedback::placeholder)
}
