// Presentation defaults for repository cards.
// Fills in missing fields and turns feed failures into a single placeholder card.

use std::fmt;

use crate::error::FeedError;
use crate::feed::RepositorySummary;

pub const DEFAULT_NAME: &str = "Unnamed Repository";
pub const DEFAULT_DESCRIPTION: &str = "No description provided for this project";
pub const DEFAULT_LANGUAGE: &str = "Unknown";
pub const ERROR_LANGUAGE: &str = "error";
/// Card image for repositories without a preview image.
pub const FALLBACK_IMAGE: &str = "./assets/placeholder.svg";

const UNKNOWN_COLOR: &str = "#858585";
const ERROR_COLOR: &str = "#f77062";

/// Badge colours for common languages.
const LANGUAGE_COLORS: &[(&str, &str)] = &[
    ("JavaScript", "#f1e05a"),
    ("Python", "#3572A5"),
    ("HTML", "#e34c26"),
    ("CSS", "#563d7c"),
    ("TypeScript", "#2b7489"),
    ("Java", "#b07219"),
    ("C#", "#178600"),
    ("PHP", "#4F5D95"),
    ("C++", "#f34b7d"),
    ("Ruby", "#701516"),
    ("Go", "#00ADD8"),
    ("Swift", "#ffac45"),
    ("Kotlin", "#F18E33"),
    ("Rust", "#dea584"),
    ("Dart", "#00B4AB"),
];

/// Badge colour for a language; unknown languages get neutral grey.
pub fn language_color(language: &str) -> &'static str {
    if language == ERROR_LANGUAGE {
        return ERROR_COLOR;
    }
    LANGUAGE_COLORS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, color)| *color)
        .unwrap_or(UNKNOWN_COLOR)
}

/// Everything a card needs, with defaults already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub homepage: Option<String>,
    pub language: String,
    pub color: &'static str,
    pub image_url: String,
}

impl ProjectCard {
    pub fn from_summary(summary: &RepositorySummary, account: &str) -> Self {
        let language = summary
            .language
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let url = if summary.source_url.is_empty() {
            profile_url(account)
        } else {
            summary.source_url.clone()
        };

        Self {
            name: non_empty_or(&summary.name, DEFAULT_NAME),
            description: summary
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            url,
            homepage: summary.homepage_url.clone(),
            color: language_color(&language),
            language,
            image_url: summary
                .image_url
                .clone()
                .unwrap_or_else(|| FALLBACK_IMAGE.to_string()),
        }
    }

    /// The single card shown when the feed could not be loaded.
    pub fn placeholder(error: &FeedError, account: &str) -> Self {
        let (name, description) = match error {
            FeedError::RateLimited { .. } => (
                "Rate limited",
                "GitHub's rate limit was exceeded; projects will be back shortly.".to_string(),
            ),
            FeedError::EmptyResult { .. } => {
                ("No projects found", "There is nothing to show yet.".to_string())
            }
            other => (
                "Projects unavailable",
                format!("GitHub projects could not be loaded: {}", other),
            ),
        };

        Self {
            name: name.to_string(),
            description,
            url: profile_url(account),
            homepage: None,
            language: ERROR_LANGUAGE.to_string(),
            color: ERROR_COLOR,
            image_url: FALLBACK_IMAGE.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.language == ERROR_LANGUAGE
    }

    pub fn has_preview_image(&self) -> bool {
        self.image_url != FALLBACK_IMAGE
    }
}

impl fmt::Display for ProjectCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.name, self.language)?;
        writeln!(f, "  {}", self.description)?;
        write!(f, "  {}", self.url)?;
        if let Some(homepage) = &self.homepage {
            write!(f, "\n  {}", homepage)?;
        }
        if self.has_preview_image() {
            write!(f, "\n  image: {}", self.image_url)?;
        }
        Ok(())
    }
}

/// Cards to render for a load result. Failures always yield exactly one placeholder.
pub fn cards_for(
    result: &Result<Vec<RepositorySummary>, FeedError>,
    account: &str,
) -> Vec<ProjectCard> {
    match result {
        Ok(repos) if !repos.is_empty() => repos
            .iter()
            .map(|repo| ProjectCard::from_summary(repo, account))
            .collect(),
        Ok(_) => vec![ProjectCard::placeholder(
            &FeedError::EmptyResult {
                account: account.to_string(),
            },
            account,
        )],
        Err(e) => vec![ProjectCard::placeholder(e, account)],
    }
}

fn profile_url(account: &str) -> String {
    format!("https://github.com/{}", account)
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
