// src/market/extract.rs
//! Best-effort extraction of requirement and nice-to-have bullet lists from
//! free-text offer descriptions. Polish job boards rarely ship structured
//! sections, so this matches the common section markers and splits the
//! following text into short fragments. Heuristic by nature; callers must
//! tolerate empty output.

use regex::Regex;

const REQUIREMENT_MARKERS: &[&str] = &[
    r"(?i)wymagania:?\s*([^.]+)",
    r"(?i)wymagamy:?\s*([^.]+)",
    r"(?i)musisz znać:?\s*([^.]+)",
    r"(?i)potrzebujemy:?\s*([^.]+)",
    r"(?i)oczekujemy:?\s*([^.]+)",
];

const NICE_TO_HAVE_MARKERS: &[&str] = &[
    r"(?i)mile widziane:?\s*([^.]+)",
    r"(?i)dodatkowo:?\s*([^.]+)",
    r"(?i)nice to have:?\s*([^.]+)",
    r"(?i)będzie plusem:?\s*([^.]+)",
    r"(?i)plus:?\s*([^.]+)",
];

/// Splits offer descriptions into requirement / nice-to-have fragments
/// behind a stable `&str -> Vec<String>` interface.
pub struct SectionExtractor {
    requirement_patterns: Vec<Regex>,
    nice_to_have_patterns: Vec<Regex>,
}

impl SectionExtractor {
    pub fn new() -> Self {
        let compile = |markers: &[&str]| {
            markers
                .iter()
                .map(|p| Regex::new(p).expect("hardcoded pattern is valid"))
                .collect()
        };
        Self {
            requirement_patterns: compile(REQUIREMENT_MARKERS),
            nice_to_have_patterns: compile(NICE_TO_HAVE_MARKERS),
        }
    }

    pub fn requirements(&self, description: &str) -> Vec<String> {
        Self::extract(&self.requirement_patterns, description)
    }

    pub fn nice_to_have(&self, description: &str) -> Vec<String> {
        Self::extract(&self.nice_to_have_patterns, description)
    }

    fn extract(patterns: &[Regex], description: &str) -> Vec<String> {
        if description.is_empty() {
            return Vec::new();
        }

        let mut seen = std::collections::HashSet::new();
        let mut points = Vec::new();

        for pattern in patterns {
            for captures in pattern.captures_iter(description) {
                let section = &captures[1];
                for fragment in section.split([',', ';', '•', '-', '\n']) {
                    let fragment = fragment.trim();
                    // Fragments of one or two characters are separator noise.
                    if fragment.chars().count() > 2 && seen.insert(fragment.to_string()) {
                        points.push(fragment.to_string());
                    }
                }
            }
        }

        points
    }
}

impl Default for SectionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_requirement_fragments() {
        let extractor = SectionExtractor::new();
        let description =
            "Szukamy programisty. Wymagania: znajomość Rust, doświadczenie z SQL; praca w zespole. \
             Oferujemy owocowe czwartki.";

        let requirements = extractor.requirements(description);
        assert!(requirements.contains(&"znajomość Rust".to_string()));
        assert!(requirements.contains(&"doświadczenie z SQL".to_string()));
        assert!(requirements.contains(&"praca w zespole".to_string()));
    }

    #[test]
    fn extracts_nice_to_have_fragments() {
        let extractor = SectionExtractor::new();
        let description = "Mile widziane: Docker, Kubernetes. Wymagamy: Pythona.";

        let nice = extractor.nice_to_have(description);
        assert_eq!(nice, vec!["Docker", "Kubernetes"]);

        let requirements = extractor.requirements(description);
        assert_eq!(requirements, vec!["Pythona"]);
    }

    #[test]
    fn deduplicates_and_drops_short_fragments() {
        let extractor = SectionExtractor::new();
        let description = "Wymagania: Git, Git, C, aa, testowanie aplikacji webowych";

        let requirements = extractor.requirements(description);
        // "Git" survives once; "C" and "aa" are below the length floor.
        assert_eq!(requirements.iter().filter(|r| *r == "Git").count(), 1);
        assert!(requirements.contains(&"testowanie aplikacji webowych".to_string()));
        assert!(!requirements.iter().any(|r| r == "C" || r == "aa"));
    }

    #[test]
    fn empty_description_yields_nothing() {
        let extractor = SectionExtractor::new();
        assert!(extractor.requirements("").is_empty());
        assert!(extractor.nice_to_have("").is_empty());
    }

    #[test]
    fn matches_markers_case_insensitively() {
        let extractor = SectionExtractor::new();
        let requirements = extractor.requirements("WYMAGANIA: umiejętność czytania dokumentacji");
        assert_eq!(requirements, vec!["umiejętność czytania dokumentacji"]);
    }
}
