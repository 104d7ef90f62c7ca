//! File-name templates
//!
//! A template is literal text with `{placeholder}` tokens. Only the four
//! placeholders in [`Placeholder`] are substituted; any other `{...}` token,
//! and any unmatched brace, is kept verbatim in the output.

use std::fmt;

/// Placeholders recognized in file-name templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `{n}`: 0-based index of the successfully rendered file
    Index,
    /// `{country}`: primary country of the endpoint
    Country,
    /// `{endpointId}`: hostname without the provider domain suffix
    EndpointId,
    /// `{load}`: endpoint load
    Load,
}

impl Placeholder {
    /// All recognized placeholders
    pub const ALL: [Placeholder; 4] = [
        Placeholder::Index,
        Placeholder::Country,
        Placeholder::EndpointId,
        Placeholder::Load,
    ];

    /// Name between the braces
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Index => "n",
            Placeholder::Country => "country",
            Placeholder::EndpointId => "endpointId",
            Placeholder::Load => "load",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Values substituted for one rendered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameValues<'a> {
    pub index: usize,
    pub country: &'a str,
    pub endpoint_id: &'a str,
    pub load: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Parsed file-name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
    source: String,
    segments: Vec<Segment>,
    unknown: Vec<String>,
}

impl FileNameTemplate {
    /// Default template
    pub const DEFAULT: &'static str = "wg{n}.conf";

    /// Parse a template. Parsing never fails; unknown tokens are recorded.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut segments = Vec::new();
        let mut unknown = Vec::new();
        let mut literal = String::new();
        let mut rest = source.as_str();

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let Some(close) = after.find('}') else {
                literal.push_str(&rest[open..]);
                rest = "";
                break;
            };

            let name = &after[..close];
            if let Some(inner) = name.rfind('{') {
                // "{a{n}": the first brace is literal, retry from the inner one
                literal.push_str(&rest[open..open + 1 + inner]);
                rest = &after[inner..];
                continue;
            }
            match Placeholder::from_name(name) {
                Some(placeholder) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(placeholder));
                }
                None => {
                    let token = format!("{{{}}}", name);
                    if !unknown.contains(&token) {
                        unknown.push(token.clone());
                    }
                    literal.push_str(&token);
                }
            }
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source,
            segments,
            unknown,
        }
    }

    /// Original template text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// `{...}` tokens that are not recognized placeholders
    pub fn unknown_placeholders(&self) -> &[String] {
        &self.unknown
    }

    /// Whether the template contains the given placeholder
    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| *s == Segment::Placeholder(placeholder))
    }

    /// Whether two different endpoints always get different names
    ///
    /// Only the index and the endpoint id tell files apart; country and load
    /// repeat across endpoints.
    pub fn yields_unique_names(&self) -> bool {
        self.contains(Placeholder::Index) || self.contains(Placeholder::EndpointId)
    }

    /// Substitute placeholder values
    pub fn render(&self, values: &FileNameValues<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(Placeholder::Index) => out.push_str(&values.index.to_string()),
                Segment::Placeholder(Placeholder::Country) => out.push_str(values.country),
                Segment::Placeholder(Placeholder::EndpointId) => out.push_str(values.endpoint_id),
                Segment::Placeholder(Placeholder::Load) => out.push_str(&values.load.to_string()),
            }
        }
        out
    }
}

impl Default for FileNameTemplate {
    fn default() -> Self {
        Self::parse(Self::DEFAULT)
    }
}

impl fmt::Display for FileNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(index: usize) -> FileNameValues<'static> {
        FileNameValues {
            index,
            country: "Canada",
            endpoint_id: "ca1003",
            load: 17,
        }
    }

    #[test]
    fn test_index_and_country() {
        let template = FileNameTemplate::parse("wg{n}-{country}.conf");
        assert_eq!(template.render(&values(2)), "wg2-Canada.conf");
    }

    #[test]
    fn test_all_placeholders() {
        let template = FileNameTemplate::parse("{endpointId}_{country}_{load}_{n}");
        assert_eq!(template.render(&values(0)), "ca1003_Canada_17_0");
        assert!(template.unknown_placeholders().is_empty());
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = FileNameTemplate::parse("{n}-{n}.conf");
        assert_eq!(template.render(&values(4)), "4-4.conf");
    }

    #[test]
    fn test_unknown_tokens_kept_verbatim() {
        let template = FileNameTemplate::parse("wg{n}-{city}-{N}.conf");
        assert_eq!(template.render(&values(1)), "wg1-{city}-{N}.conf");
        assert_eq!(
            template.unknown_placeholders(),
            &["{city}".to_string(), "{N}".to_string()]
        );
    }

    #[test]
    fn test_unbalanced_braces() {
        let template = FileNameTemplate::parse("wg}{n}{country.conf");
        assert_eq!(template.render(&values(3)), "wg}3{country.conf");
        assert!(template.unknown_placeholders().is_empty());

        let nested = FileNameTemplate::parse("x{a{n}.conf");
        assert_eq!(nested.render(&values(5)), "x{a5.conf");
        assert!(nested.unknown_placeholders().is_empty());
    }

    #[test]
    fn test_placeholder_queries() {
        let template = FileNameTemplate::default();
        assert!(template.contains(Placeholder::Index));
        assert!(!template.contains(Placeholder::Load));
        assert!(!FileNameTemplate::parse("static.conf").yields_unique_names());
        assert!(template.yields_unique_names());
        assert!(FileNameTemplate::parse("{endpointId}.conf").yields_unique_names());
        assert!(!FileNameTemplate::parse("{country}-{load}.conf").yields_unique_names());
        assert_eq!(template.to_string(), "wg{n}.conf");
    }
}
