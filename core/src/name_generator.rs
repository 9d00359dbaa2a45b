//! Deterministic name, company and address generation from curated lists.
//!
//! All generation is deterministic (same RNG seed = same names).

use crate::rng::GeneratorRng;

/// A California city with a ZIP prefix and phone area code.
#[derive(Debug, Clone, Copy)]
pub struct CityEntry {
    pub city: &'static str,
    pub zip_prefix: &'static str,
    pub area_code: &'static str,
}

/// Deterministic name generator using curated name lists
pub struct NameGenerator;

impl NameGenerator {
    /// Generate first name from curated list
    pub fn generate_first_name(rng: &mut GeneratorRng) -> &'static str {
        let names = Self::first_names();
        names[rng.next_u64_below(names.len() as u64) as usize]
    }

    /// Generate last name from curated list
    pub fn generate_last_name(rng: &mut GeneratorRng) -> &'static str {
        let names = Self::last_names();
        names[rng.next_u64_below(names.len() as u64) as usize]
    }

    /// Company name and the lowercase domain derived from it.
    /// Format: "Prefix Industry" / "lastname-industry.com".
    pub fn generate_company(rng: &mut GeneratorRng) -> (String, String) {
        let prefixes = Self::company_prefixes();
        let industries = Self::company_industries();
        let tlds = [".com", ".io", ".net", ".co"];

        let prefix = if rng.chance(0.5) {
            prefixes[rng.next_u64_below(prefixes.len() as u64) as usize]
        } else {
            Self::generate_last_name(rng)
        };
        let industry = industries[rng.next_u64_below(industries.len() as u64) as usize];
        let tld = tlds[rng.next_u64_below(tlds.len() as u64) as usize];

        let name = format!("{prefix} {industry}");
        (name.clone(), Self::domain_for(&name, tld))
    }

    /// `"Northwind Cloud Systems"` -> `"northwindcloudsystems.com"`.
    pub fn domain_for(company: &str, tld: &str) -> String {
        let stem: String = company
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect();
        format!("{stem}{tld}")
    }

    pub fn generate_street(rng: &mut GeneratorRng) -> String {
        let streets = Self::street_names();
        let suffixes = ["St", "Ave", "Blvd", "Way", "Dr", "Ct", "Ln"];
        let number = 100 + rng.next_u64_below(9800);
        let street = streets[rng.next_u64_below(streets.len() as u64) as usize];
        let suffix = suffixes[rng.next_u64_below(suffixes.len() as u64) as usize];
        if rng.chance(0.4) {
            format!("{number} {street} {suffix}, Apt {}", 1 + rng.next_u64_below(450))
        } else {
            format!("{number} {street} {suffix}")
        }
    }

    pub fn generate_city(rng: &mut GeneratorRng) -> CityEntry {
        let cities = Self::cities();
        cities[rng.next_u64_below(cities.len() as u64) as usize]
    }

    pub fn generate_job_title(rng: &mut GeneratorRng) -> &'static str {
        let titles = [
            "Senior Software Engineer",
            "Staff Engineer",
            "Site Reliability Engineer",
            "Data Engineer",
            "Product Manager",
            "Engineering Manager",
            "Security Engineer",
            "Solutions Architect",
        ];
        titles[rng.next_u64_below(titles.len() as u64) as usize]
    }

    /// Curated list of first names
    fn first_names() -> &'static [&'static str] {
        &[
            "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph",
            "Thomas", "Charles", "Christopher", "Daniel", "Matthew", "Anthony", "Mark",
            "Steven", "Paul", "Andrew", "Joshua", "Kevin", "Brian", "George", "Timothy",
            "Jason", "Ryan", "Jacob", "Nicholas", "Eric", "Jonathan", "Samuel", "Gregory",
            "Alexander", "Patrick", "Nathan", "Henry", "Peter", "Noah", "Ethan", "Arthur",
            "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Susan", "Jessica", "Sarah",
            "Karen", "Lisa", "Nancy", "Margaret", "Ashley", "Kimberly", "Emily", "Michelle",
            "Amanda", "Melissa", "Stephanie", "Rebecca", "Laura", "Amy", "Angela", "Anna",
            "Nicole", "Helen", "Samantha", "Katherine", "Rachel", "Maria", "Heather", "Julie",
            "Olivia", "Victoria", "Lauren", "Megan", "Hannah", "Grace", "Sophia", "Natalie",
        ]
    }

    /// Curated list of last names
    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
            "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
            "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson",
            "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker",
            "Young", "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores",
            "Green", "Adams", "Nelson", "Baker", "Hall", "Rivera", "Campbell", "Mitchell",
            "Carter", "Roberts", "Phillips", "Evans", "Turner", "Parker", "Collins", "Edwards",
            "Stewart", "Morris", "Murphy", "Cook", "Rogers", "Morgan", "Cooper", "Peterson",
            "Reed", "Kelly", "Howard", "Kim", "Ward", "Watson", "Brooks", "Bennett", "Gray",
            "Patel", "Chen", "Mathew", "Foster", "Sullivan", "Hughes", "Fisher", "Hayes",
        ]
    }

    fn company_prefixes() -> &'static [&'static str] {
        &[
            "Northwind", "Bluepeak", "Summit", "Redwood", "Granite", "Harbor", "Pioneer",
            "Silverline", "Cobalt", "Evergreen", "Lighthouse", "Meridian", "Keystone",
        ]
    }

    fn company_industries() -> &'static [&'static str] {
        &[
            "Software", "Cloud Systems", "Analytics", "Labs", "Networks", "Data",
            "Technologies", "Digital", "Security", "Logistics", "Health Tech",
        ]
    }

    fn street_names() -> &'static [&'static str] {
        &[
            "Market", "Mission", "Valencia", "Castro", "Oak", "Pine", "Cedar", "Maple",
            "Sunset", "Ocean", "Lincoln", "Hillcrest", "Silicon", "Alameda", "El Camino",
        ]
    }

    fn cities() -> &'static [CityEntry] {
        &[
            CityEntry { city: "San Francisco", zip_prefix: "941", area_code: "415" },
            CityEntry { city: "Oakland", zip_prefix: "946", area_code: "510" },
            CityEntry { city: "San Jose", zip_prefix: "951", area_code: "408" },
            CityEntry { city: "Palo Alto", zip_prefix: "943", area_code: "650" },
            CityEntry { city: "Sacramento", zip_prefix: "958", area_code: "916" },
            CityEntry { city: "Los Angeles", zip_prefix: "900", area_code: "213" },
            CityEntry { city: "San Diego", zip_prefix: "921", area_code: "619" },
            CityEntry { city: "Irvine", zip_prefix: "926", area_code: "949" },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{GeneratorSlot, RngBank};

    #[test]
    fn name_generation_is_deterministic() {
        let mut rng1 = RngBank::new(12345).for_generator(GeneratorSlot::Persona);
        let mut rng2 = RngBank::new(12345).for_generator(GeneratorSlot::Persona);

        assert_eq!(
            NameGenerator::generate_first_name(&mut rng1),
            NameGenerator::generate_first_name(&mut rng2),
            "Same seed should produce same name"
        );
    }

    #[test]
    fn company_domain_is_derived_from_name() {
        let mut rng = RngBank::new(12345).for_generator(GeneratorSlot::Persona);

        for _ in 0..50 {
            let (name, domain) = NameGenerator::generate_company(&mut rng);
            let stem = domain.split('.').next().unwrap();
            let squashed: String = name
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            assert_eq!(stem, squashed, "domain {domain} should derive from {name}");
        }
    }

    #[test]
    fn domain_for_strips_punctuation() {
        assert_eq!(NameGenerator::domain_for("Acme Co.", ".com"), "acmeco.com");
    }
}
