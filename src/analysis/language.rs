use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

use super::LanguageGuesser;
use crate::github::{ChangedFile, HostingApi};

pub const UNDETERMINED_LANGUAGE: &str = "Language could not be determined";
pub const NO_RECOGNIZED_LANGUAGES: &str = "No recognized programming languages found.";

/// Minimum number of matching markers before a content guess is trusted.
const MIN_SIGNATURE_SCORE: usize = 2;

const EXTENSIONS: &[(&str, &str)] = &[
    (".py", "Python"),
    (".js", "JavaScript"),
    (".html", "HTML"),
    (".css", "CSS"),
    (".java", "Java"),
    (".c", "C"),
    (".cpp", "C++"),
    (".rb", "Ruby"),
    (".php", "PHP"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".swift", "Swift"),
    (".ts", "TypeScript"),
];

struct Signature {
    language: &'static str,
    markers: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        language: "Python",
        markers: &["def ", "import ", "self.", "elif ", "print(", "__init__", "None", "lambda "],
    },
    Signature {
        language: "Rust",
        markers: &["fn ", "let mut ", "impl ", "pub fn ", "::", "use std", "match ", "-> "],
    },
    Signature {
        language: "TypeScript",
        markers: &["interface ", ": string", ": number", "export type ", "implements ", "readonly "],
    },
    Signature {
        language: "JavaScript",
        markers: &["function ", "const ", "=> ", "console.log", "require(", "module.exports", "===", "document."],
    },
    Signature {
        language: "Java",
        markers: &["public class ", "private ", "System.out", "public static void", "import java.", "@Override"],
    },
    Signature {
        language: "C",
        markers: &["#include <", "int main(", "printf(", "malloc(", "#define ", "void "],
    },
    Signature {
        language: "Go",
        markers: &["package ", "func ", ":= ", "fmt.", "import (", "go func"],
    },
    Signature {
        language: "Ruby",
        markers: &["puts ", "require '", "do |", ".each", "attr_accessor", "\nend"],
    },
    Signature {
        language: "PHP",
        markers: &["<?php", "$this->", "echo ", "namespace ", "public function "],
    },
    Signature {
        language: "HTML",
        markers: &["<!DOCTYPE html", "<html", "<div", "<body", "<head", "</p>"],
    },
    Signature {
        language: "CSS",
        markers: &["color:", "margin:", "padding:", "font-size:", "display:", "background:"],
    },
    Signature {
        language: "Bash",
        markers: &["echo ", "fi\n", "then\n", "$(", "esac", "export "],
    },
    Signature {
        language: "Markdown",
        markers: &["# ", "## ", "```", "](", "**", "\n- "],
    },
    Signature {
        language: "TOML",
        markers: &["[package]", "[dependencies]", " = \"", "[[", "version = "],
    },
];

/// Guesses a language from file content: shebang first, then JSON, then
/// keyword signatures. Ties go to the earlier signature.
pub struct HeuristicGuesser;

impl HeuristicGuesser {
    pub fn new() -> Self {
        Self
    }
}

fn shebang_language(first_line: &str) -> Option<&'static str> {
    let interpreter = first_line.strip_prefix("#!")?;
    [
        ("python", "Python"),
        ("node", "JavaScript"),
        ("ruby", "Ruby"),
        ("perl", "Perl"),
        ("bash", "Bash"),
        ("sh", "Bash"),
    ]
    .into_iter()
    .find(|(needle, _)| interpreter.contains(needle))
    .map(|(_, language)| language)
}

impl LanguageGuesser for HeuristicGuesser {
    fn guess(&self, content: &str) -> Option<String> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(language) = trimmed.lines().next().and_then(shebang_language) {
            return Some(language.to_string());
        }

        if (trimmed.starts_with('{') || trimmed.starts_with('['))
            && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
        {
            return Some("JSON".to_string());
        }

        let mut best: Option<(&str, usize)> = None;
        for signature in SIGNATURES {
            let score = signature.markers.iter().filter(|m| content.contains(**m)).count();
            if score >= MIN_SIGNATURE_SCORE && best.map_or(true, |(_, top)| score > top) {
                best = Some((signature.language, score));
            }
        }
        best.map(|(language, _)| language.to_string())
    }
}

/// Language name for `content`, or the "could not be determined" sentinel.
pub fn detect_language(guesser: &dyn LanguageGuesser, content: &str) -> String {
    guesser
        .guess(content)
        .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLanguage {
    pub filename: String,
    pub language: String,
}

/// Fetch each changed file and guess its language from the content.
/// Files without a raw URL or whose fetch fails are left out.
pub async fn detect_file_languages(
    api: &dyn HostingApi,
    guesser: &dyn LanguageGuesser,
    files: &[ChangedFile],
) -> Vec<FileLanguage> {
    let mut detected = Vec::new();
    for file in files {
        let Some(raw_url) = file.raw_url.as_deref() else {
            continue;
        };
        match api.fetch_raw_file(raw_url).await {
            Ok(content) => detected.push(FileLanguage {
                filename: file.filename.clone(),
                language: detect_language(guesser, &content),
            }),
            Err(err) => {
                warn!(file = %file.filename, error = %err, "failed to fetch file content for language detection");
            }
        }
    }
    detected
}

/// Languages implied by file suffixes, sorted and comma-joined.
pub fn detect_languages(files: &[ChangedFile]) -> String {
    let languages: BTreeSet<&str> = files
        .iter()
        .flat_map(|file| {
            EXTENSIONS
                .iter()
                .filter(|(ext, _)| file.filename.ends_with(ext))
                .map(|(_, language)| *language)
        })
        .collect();

    if languages.is_empty() {
        NO_RECOGNIZED_LANGUAGES.to_string()
    } else {
        languages.into_iter().collect::<Vec<_>>().join(", ")
    }
}
