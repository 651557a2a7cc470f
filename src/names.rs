//! Rewriting names for display.
//!
//! Street names are abbreviated with a table per language before they go
//! on the map. Short road numbers are recognized so that they can be shown
//! as a road sign instead.

use std::collections::HashMap;
use lazy_static::lazy_static;
use serde::Deserialize;


//------------ Language ------------------------------------------------------

/// The language names are abbreviated for.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Swedish,
    German,
    French,
    Dutch,
    Danish,
    Norwegian,
}


//------------ Position ------------------------------------------------------

/// Where in a name a full string must appear to be abbreviated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Position {
    /// A complete word.
    Word,

    /// The end of a longer word.
    End,

    /// Anywhere at all.
    Anywhere,
}


//------------ Abbreviation --------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Abbreviation {
    full: &'static str,
    short: &'static str,
    position: Position,
}

macro_rules! abbreviations {
    (
        $(
            $lang:ident => [
                $( ($full:expr, $short:expr, $pos:ident), )*
            ]
        )*
    ) => {
        lazy_static! {
            static ref ABBREVIATIONS: HashMap<Language, Vec<Abbreviation>> = {
                let mut res = HashMap::new();
                $(
                    res.insert(Language::$lang, vec![
                        $(
                            Abbreviation {
                                full: $full,
                                short: $short,
                                position: Position::$pos,
                            },
                        )*
                    ]);
                )*
                res
            };
        }
    }
}

// Earlier entries win. Longer words must come before their prefixes.
abbreviations! {
    Swedish => [
        ("VÄGEN", "v", End),
        ("VÄG", "v", Word),
        ("GATAN", "g", End),
        ("GATA", "g", Word),
        ("GRÄNDEN", "gr", End),
        ("GRÄND", "gr", Word),
        ("TRAFIKPLATS", "Tp", Word),
        ("NORRA", "N", Word),
        ("SÖDRA", "S", Word),
        ("ÖSTRA", "Ö", Word),
        ("VÄSTRA", "V", Word),
        ("SANKT", "S:t", Word),
        ("GAMLA", "Ga", Word),
        ("STORA", "St", Word),
        ("LILLA", "L", Word),
        ("PLATSEN", "pl", End),
        ("PLATS", "Pl", Word),
        ("OMRÅDET", "omr", Anywhere),
        ("OMRÅDE", "omr", Anywhere),
    ]
    English => [
        ("SOUTHWESTERN", "SW", Word),
        ("SOUTHEASTERN", "SE", Word),
        ("NORTHWESTERN", "NW", Word),
        ("NORTHEASTERN", "NE", Word),
        ("SOUTHWEST", "SW", Word),
        ("SOUTHEAST", "SE", Word),
        ("NORTHWEST", "NW", Word),
        ("NORTHEAST", "NE", Word),
        ("WESTERN", "W", Word),
        ("EASTERN", "E", Word),
        ("NORTHERN", "N", Word),
        ("SOUTHERN", "S", Word),
        ("WEST", "W", Word),
        ("EAST", "E", Word),
        ("NORTH", "N", Word),
        ("SOUTH", "S", Word),
        ("ARCADE", "Arc", Word),
        ("AVENUE", "Ave", Word),
        ("BEACH", "Bch", Word),
        ("BOULEVARD", "Blvd", Word),
        ("BRIDGE", "Brg", Word),
        ("BYPASS", "Byp", Word),
        ("CIRCLE", "Cir", Word),
        ("CAUSEWAY", "Cswy", Word),
        ("COURT", "Ct", Word),
        ("CRESCENT", "Cres", Word),
        ("DRIVEWAY", "Drwy", Word),
        ("DRIVE", "Dr", Word),
        ("EXPRESSWAY", "Expy", Word),
        ("EXTENSION", "Ext", Word),
        ("FREEWAY", "Fwy", Word),
        ("GARDENS", "Gdns", Word),
        ("GARDEN", "Gdn", Word),
        ("HEIGHTS", "Hts", Word),
        ("HIGHWAY", "Hwy", Word),
        ("JUNCTION", "Jct", Word),
        ("LANE", "Ln", Word),
        ("MOUNTAIN", "Mtn", Word),
        ("MOUNT", "Mt", Word),
        ("PARKWAY", "Pkwy", Word),
        ("PLACE", "Pl", Word),
        ("PLAZA", "Plz", Word),
        ("POINT", "Pt", Word),
        ("ROAD", "Rd", Word),
        ("SQUARE", "Sq", Word),
        ("STREET", "St", Word),
        ("TERRACE", "Ter", Word),
        ("TURNPIKE", "Tpke", Word),
        ("TRAIL", "Trl", Word),
        ("VIADUCT", "Via", Word),
        ("CROSSING", "Xing", Word),
    ]
    German => [
        ("STRASSE", "Str", Word),
        ("STRAßE", "Str", Word),
        ("STRAßE", "str", End),
        ("STRASSE", "str", End),
        ("GASSE", "G", Word),
        ("PLATZ", "Plz", Word),
        ("BRÜCKE", "Br", Word),
        ("MARKT", "Mkt", Word),
        ("PROMENADE", "Prom", Word),
        ("RING", "Rg", Word),
    ]
    French => [
        ("ALLÉE", "All", Word),
        ("AVENUE", "Av", Word),
        ("BOULEVARD", "Bd", Word),
        ("CHEMIN", "Ch", Word),
        ("IMPASSE", "Imp", Word),
        ("PLACE", "Pl", Word),
        ("PROMENADE", "Prom", Word),
        ("ROND-POINT", "Rpt", Word),
        ("ROUTE", "Rte", Word),
    ]
    Dutch => [
        ("DREEF", "Dr", Word),
        ("LAAN", "Ln", Word),
        ("PLEIN", "Pl", Word),
        ("STRAAT", "Str", Word),
        ("STRAAT", "str", End),
    ]
    Danish => [
        ("VEJEN", "v", End),
        ("VEJ", "v", End),
        ("GADE", "g", End),
        ("VEJ", "v", Word),
        ("GADE", "g", Word),
    ]
    Norwegian => [
        ("VEIEN", "vn", End),
        ("VEGEN", "vn", End),
        ("GATA", "g", End),
        ("GATE", "g", End),
        ("GATA", "g", Word),
        ("GATE", "g", Word),
    ]
}


//------------ abbreviate ----------------------------------------------------

/// Returns the abbreviated form of a name.
///
/// Matching ignores case. Names consisting of a single word never have
/// whole words replaced. Every table entry is applied at most once and
/// never to text produced by an earlier entry.
pub fn abbreviate(name: &str, language: Language) -> String {
    let table = match ABBREVIATIONS.get(&language) {
        Some(table) => table,
        None => return name.into(),
    };
    let one_word = !name.trim().contains(' ');

    // The name and its upper case form, char by char. Replaced ranges are
    // blanked out in the upper case form so they don’t match again.
    let mut orig: Vec<char> = name.chars().collect();
    let mut upper: Vec<char> = orig.iter().map(|&ch| single_upper(ch)).collect();

    for item in table {
        if item.position == Position::Word && one_word {
            continue
        }
        let full: Vec<char> = item.full.chars().collect();
        let start = match find_at(&upper, &full, item.position) {
            Some(start) => start,
            None => continue,
        };
        let short: Vec<char> = item.short.chars().collect();
        let end = start + full.len();
        orig.splice(start..end, short.iter().copied());
        upper.splice(start..end, short.iter().map(|_| '\u{1}'));
    }
    orig.into_iter().collect()
}

/// Finds the first occurrence of `full` valid at `position`.
fn find_at(upper: &[char], full: &[char], position: Position) -> Option<usize> {
    if full.is_empty() || full.len() > upper.len() {
        return None
    }
    (0..=upper.len() - full.len()).find(|&start| {
        if upper[start..start + full.len()] != *full {
            return false
        }
        let before = start.checked_sub(1).map(|i| upper[i]);
        let after = upper.get(start + full.len()).copied();
        let word_start = matches!(before, None | Some(' '));
        let word_end = matches!(after, None | Some(' ') | Some('.'));
        match position {
            Position::Word => word_start && word_end,
            Position::End => word_end && !word_start,
            Position::Anywhere => true,
        }
    })
}

/// Upper cases a char if that results in exactly one char.
fn single_upper(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(res), None) => res,
        _ => ch
    }
}


//------------ Road Signs ----------------------------------------------------

/// Returns whether a name is a road number shown as a road sign.
///
/// These are up to three digits optionally prefixed by `E`, `M` or `A`,
/// `I ` followed by up to three digits, or `Us ` followed by up to three
/// digits.
pub fn is_road_sign_name(name: &str) -> bool {
    fn digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|ch| ch.is_ascii_digit())
    }

    let len = name.chars().count();
    if len <= 3 {
        if digits(name) {
            return true
        }
        if let Some(rest) = name.strip_prefix(['E', 'M', 'A']) {
            return digits(rest)
        }
        false
    }
    else if len <= 5 && name.starts_with("I ") {
        digits(&name[2..])
    }
    else if len <= 6 && name.starts_with("Us ") {
        digits(&name[3..])
    }
    else {
        false
    }
}


//------------ Display Helpers -----------------------------------------------

/// Returns a name with the first letter of each word upper case.
///
/// Words are separated by blanks or dashes.
pub fn title_case(name: &str) -> String {
    let mut res = String::with_capacity(name.len());
    let mut start = true;
    for ch in name.chars() {
        if start {
            res.extend(ch.to_uppercase());
        }
        else {
            res.extend(ch.to_lowercase());
        }
        start = ch == ' ' || ch == '-';
    }
    res
}

/// Splits a long name into two lines at the last blank.
///
/// Returns `None` if the name has at most `max_chars` chars or contains
/// no blank.
pub fn split_two_lines(name: &str, max_chars: usize) -> Option<(&str, &str)> {
    if name.chars().count() <= max_chars {
        return None
    }
    let pos = name.trim_end().rfind(' ')?;
    let (first, second) = (&name[..pos], name[pos + 1..].trim());
    if first.trim().is_empty() || second.is_empty() {
        return None
    }
    Some((first.trim(), second))
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn road_sign_names() {
        assert!(is_road_sign_name("E4"));
        assert!(is_road_sign_name("E45"));
        assert!(is_road_sign_name("73"));
        assert!(is_road_sign_name("M25"));
        assert!(is_road_sign_name("I 95"));
        assert!(is_road_sign_name("Us 101"));
        assert!(!is_road_sign_name("E"));
        assert!(!is_road_sign_name(""));
        assert!(!is_road_sign_name("E4S"));
        assert!(!is_road_sign_name("Main St"));
        assert!(!is_road_sign_name("I 9500"));
        assert!(!is_road_sign_name("Elm"));
    }

    #[test]
    fn english_abbreviations() {
        assert_eq!(abbreviate("Main Street", Language::English), "Main St");
        assert_eq!(
            abbreviate("North Cedar Avenue", Language::English),
            "N Cedar Ave"
        );
        assert_eq!(
            abbreviate("Northwestern Road", Language::English), "NW Rd"
        );
        // A single word stays.
        assert_eq!(abbreviate("Broadway", Language::English), "Broadway");
        assert_eq!(abbreviate("Street", Language::English), "Street");
        // Only whole words.
        assert_eq!(abbreviate("Lanes End", Language::English), "Lanes End");
    }

    #[test]
    fn swedish_endings() {
        assert_eq!(abbreviate("Drottninggatan", Language::Swedish), "Drottningg");
        assert_eq!(abbreviate("Södra vägen", Language::Swedish), "S vägen");
        assert_eq!(abbreviate("Kungsväg", Language::Swedish), "Kungsväg");
        assert_eq!(abbreviate("Lilla Nygatan", Language::Swedish), "L Nyg");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("STOCKHOLM"), "Stockholm");
        assert_eq!(title_case("NEW YORK"), "New York");
        assert_eq!(title_case("saint-étienne"), "Saint-Étienne");
    }

    #[test]
    fn two_lines() {
        assert_eq!(split_two_lines("Hyde Park", 12), None);
        assert_eq!(
            split_two_lines("Kensington Gardens", 12),
            Some(("Kensington", "Gardens"))
        );
        assert_eq!(
            split_two_lines("Royal Botanic Gardens", 12),
            Some(("Royal Botanic", "Gardens"))
        );
        assert_eq!(split_two_lines("Supercalifragilistic", 12), None);
    }
}
