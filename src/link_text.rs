//! Structured link text: plain text interleaved with language-specific
//! tokens, rendered per display convention.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the resolver includes besides the bare name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayOptions(u8);

impl DisplayOptions {
    /// Bare names only.
    pub const NONE: Self = Self(0);
    /// Enclosing namespace and outer types.
    pub const SHOW_CONTAINER: Self = Self(1);
    /// Generic parameter and argument lists.
    pub const SHOW_TEMPLATES: Self = Self(2);
    /// Parameter lists of methods, constructors and indexers.
    pub const SHOW_PARAMETERS: Self = Self(4);
    /// Templates and parameters, no container.
    pub const DEFAULT: Self = Self(6);

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        return self.0 & other.0 == other.0;
    }

    /// These options with the bits of `other` cleared.
    pub const fn without(self, other: Self) -> Self {
        return Self(self.0 & !other.0);
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        return Self::DEFAULT;
    }
}

impl BitOr for DisplayOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        return Self(self.0 | rhs.0);
    }
}

/// Output language convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// `::` separators, `array<T, n>`.
    Cpp,
    /// `<T>` templates, `T[,]` arrays.
    CSharp,
    /// `<'T>` template parameters.
    FSharp,
    /// Language-agnostic text, C#-shaped.
    Neutral,
    /// `(Of T)` templates, `T(,)` arrays, `(...)` indexers.
    VisualBasic,
}

impl Convention {
    /// Every convention, in the order the driver lists them.
    pub const ALL: [Self; 5] = [Self::CSharp, Self::VisualBasic, Self::Cpp, Self::FSharp, Self::Neutral];

    /// Name accepted on the command line.
    pub const fn name(self) -> &'static str {
        return match self {
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::FSharp => "fsharp",
            Self::Neutral => "neutral",
            Self::VisualBasic => "visualbasic",
        };
    }

    /// Text of one language-specific token.
    fn token(self, variant: &LanguageVariant) -> String {
        return match variant {
            LanguageVariant::ArrayClose { rank } => match self {
                Self::Cpp if *rank > 1 => format!(", {rank}>"),
                Self::Cpp => ">".to_string(),
                Self::CSharp | Self::FSharp | Self::Neutral => format!("[{}]", commas(*rank)),
                Self::VisualBasic => format!("({})", commas(*rank)),
            },
            LanguageVariant::ArrayOpen { .. } => match self {
                Self::Cpp => "array<".to_string(),
                Self::CSharp | Self::FSharp | Self::Neutral | Self::VisualBasic => String::new(),
            },
            LanguageVariant::ByRef => match self {
                Self::Cpp => "%".to_string(),
                Self::CSharp | Self::FSharp | Self::Neutral | Self::VisualBasic => "&".to_string(),
            },
            LanguageVariant::ContainerSeparator => match self {
                Self::Cpp => "::".to_string(),
                Self::CSharp | Self::FSharp | Self::Neutral | Self::VisualBasic => ".".to_string(),
            },
            LanguageVariant::IndexerClose => match self {
                Self::VisualBasic => ")".to_string(),
                Self::Cpp | Self::CSharp | Self::FSharp | Self::Neutral => "]".to_string(),
            },
            LanguageVariant::IndexerOpen => match self {
                Self::VisualBasic => "(".to_string(),
                Self::Cpp | Self::CSharp | Self::FSharp | Self::Neutral => "[".to_string(),
            },
            LanguageVariant::ListSeparator => ", ".to_string(),
            LanguageVariant::Pointer => "*".to_string(),
            LanguageVariant::TemplateListClose => match self {
                Self::VisualBasic => ")".to_string(),
                Self::Cpp | Self::CSharp | Self::FSharp | Self::Neutral => ">".to_string(),
            },
            LanguageVariant::TemplateListOpen => match self {
                Self::VisualBasic => "(Of ".to_string(),
                Self::Cpp | Self::CSharp | Self::FSharp | Self::Neutral => "<".to_string(),
            },
            LanguageVariant::TemplateParameter(name) => match self {
                Self::FSharp => format!("'{name}"),
                Self::Cpp | Self::CSharp | Self::Neutral | Self::VisualBasic => name.clone(),
            },
        };
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.name());
    }
}

impl FromStr for Convention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s.to_ascii_lowercase().as_str() {
            "c#" | "cs" | "csharp" => Ok(Self::CSharp),
            "c++" | "cpp" => Ok(Self::Cpp),
            "f#" | "fs" | "fsharp" => Ok(Self::FSharp),
            "neutral" => Ok(Self::Neutral),
            "vb" | "visualbasic" => Ok(Self::VisualBasic),
            other => Err(format!(
                "unknown convention `{other}` (expected one of: csharp, visualbasic, cpp, fsharp, neutral)"
            )),
        };
    }
}

/// `rank - 1` commas.
fn commas(rank: u32) -> String {
    return ",".repeat(usize::try_from(rank.saturating_sub(1)).unwrap_or_default());
}

/// A token whose text depends on the convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageVariant {
    /// After an array's element type.
    ArrayClose {
        /// Number of dimensions.
        rank: u32,
    },
    /// Before an array's element type.
    ArrayOpen {
        /// Number of dimensions.
        rank: u32,
    },
    /// After a by-reference type.
    ByRef,
    /// Between a container and what it contains.
    ContainerSeparator,
    /// Closes an index parameter list.
    IndexerClose,
    /// Opens an index parameter list.
    IndexerOpen,
    /// Between list items.
    ListSeparator,
    /// After a pointer's pointee.
    Pointer,
    /// Closes a generic list.
    TemplateListClose,
    /// Opens a generic list.
    TemplateListOpen,
    /// A generic parameter name.
    TemplateParameter(String),
}

/// One piece of link text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Literal text, identical in every convention.
    Text(String),
    /// Convention-specific token.
    Variant(LanguageVariant),
}

/// Destination of resolver output.
pub trait LinkSink {
    /// Append literal text.
    fn text(&mut self, text: &str);
    /// Append a convention-specific token.
    fn variant(&mut self, variant: LanguageVariant);
}

/// Collected link text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkText {
    /// Pieces in output order; adjacent text is merged.
    pub segments: Vec<Segment>,
}

impl LinkText {
    /// Empty text.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Render for one convention.
    pub fn render(&self, convention: Convention) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variant(variant) => out.push_str(&convention.token(variant)),
            }
        }
        return out;
    }
}

impl LinkSink for LinkText {
    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
            return;
        }
        self.segments.push(Segment::Text(text.to_string()));
    }

    fn variant(&mut self, variant: LanguageVariant) {
        self.segments.push(Segment::Variant(variant));
    }
}

impl fmt::Display for LinkText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.render(Convention::Neutral));
    }
}
