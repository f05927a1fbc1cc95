//! Title/description derivation from an uploaded filename.
//!
//! Stands in for a richer metadata generator at the intake boundary; the
//! record keeps whatever is derived here for the rest of its life.

use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
}

/// Turn "my_summer-trip.final.mp4" into "My Summer Trip Final".
pub fn derive_metadata(filename: &str) -> VideoMetadata {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let words: Vec<String> = stem
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    let title = if words.is_empty() {
        "Untitled upload".to_string()
    } else {
        words.join(" ")
    };
    let description = format!("{title}\n\nScheduled upload via latecast.");

    VideoMetadata { title, description }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_spaces() {
        assert_eq!(
            derive_metadata("my_summer-trip.final.mp4").title,
            "My Summer Trip Final"
        );
    }

    #[test]
    fn plain_name_is_capitalized() {
        assert_eq!(derive_metadata("holiday.mp4").title, "Holiday");
    }

    #[test]
    fn separator_only_stem_gets_placeholder() {
        assert_eq!(derive_metadata("___.mp4").title, "Untitled upload");
    }

    #[test]
    fn description_mentions_title() {
        let meta = derive_metadata("demo_reel.mov");
        assert!(meta.description.starts_with("Demo Reel"));
    }
}
