use crate::{
    error::{ResolveError, TemplateError},
    token::{tokenize, Token},
};
use core::fmt::{self, Display};
use std::collections::BTreeSet;

/// The name a version template may never reference, since it is the thing being rendered.
pub const VERSION_PARAMETER: &str = "version";

/// One element of a parsed [`Template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Text copied to the output unchanged.
    StringLiteral(String),

    /// `{name}`: the resolved value of `name`.
    Expansion(String),

    /// `{name:0Wd}`: the resolved value of `name`, read as a non-negative integer and
    /// left-padded with zeros to at least `width` digits.
    ZeroFillExpansion {
        /// The parameter to resolve.
        name: String,
        /// Minimum number of digits.
        width: usize,
    },
}

impl Node {
    fn variable(&self) -> Option<&str> {
        match self {
            Node::StringLiteral(_) => None,
            Node::Expansion(name) | Node::ZeroFillExpansion { name, .. } => Some(name),
        }
    }

    fn render<F>(&self, resolve: &mut F) -> Result<String, ResolveError>
    where
        F: FnMut(&str) -> Result<String, ResolveError>,
    {
        match self {
            Node::StringLiteral(value) => Ok(value.clone()),
            Node::Expansion(name) => expand(name, resolve),
            Node::ZeroFillExpansion { name, width } => {
                let value = expand(name, resolve)?;
                let number = value
                    .parse::<u64>()
                    .map_err(|_| ResolveError::NotAnInteger {
                        name: name.clone(),
                        value,
                    })?;
                Ok(format!("{number:0width$}"))
            }
        }
    }

    /// Builds an expansion node from the raw contents of a `{...}` reference.
    fn from_variable(raw: &str, template: &str) -> Result<Self, TemplateError> {
        let malformed = || TemplateError::MalformedSpecifier {
            spec: raw.to_string(),
            template: template.to_string(),
        };

        let mut parts = raw.split(':');
        let name = parts.next().filter(|name| !name.is_empty()).ok_or_else(malformed)?;
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Node::Expansion(name.to_string())),
            (Some(spec), None) => {
                let width = match spec.as_bytes() {
                    [b'0', width @ b'0'..=b'9', b'd'] => usize::from(width - b'0'),
                    _ => return Err(malformed()),
                };
                Ok(Node::ZeroFillExpansion {
                    name: name.to_string(),
                    width,
                })
            }
            _ => Err(malformed()),
        }
    }
}

fn expand<F>(name: &str, resolve: &mut F) -> Result<String, ResolveError>
where
    F: FnMut(&str) -> Result<String, ResolveError>,
{
    resolve(name).map_err(|source| ResolveError::Expansion {
        name: name.to_string(),
        source: Box::new(source),
    })
}

impl Display for Node {
    /// Writes the node back in template syntax, escaping literal `\` and `{`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::StringLiteral(value) => {
                for c in value.chars() {
                    if matches!(c, '\\' | '{') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            Node::Expansion(name) => write!(f, "{{{name}}}"),
            Node::ZeroFillExpansion { name, width } => write!(f, "{{{name}:0{width}d}}"),
        }
    }
}

/// A parsed version template: literal text and variable expansions, rendered in order.
///
/// # Syntax
///
/// - `{name}` expands to the value of `name`. Names start with a letter and continue with
///   letters, digits, and `-`.
/// - `{name:0Wd}` expands to the value of `name` as an integer, zero-padded to at least `W`
///   digits, where `W` is a single digit.
/// - `\{` and `\\` are a literal `{` and `\`. No other escapes exist.
/// - Everything else is literal text.
///
/// ```
/// use branchver::Template;
///
/// let template = Template::parse("{major}.{minor:02d}").unwrap();
/// let version = template
///     .render(|name| Ok(if name == "major" { "1" } else { "2" }.to_string()))
///     .unwrap();
/// assert_eq!("1.02", version);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] carrying the template text if the template is malformed.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut nodes = Vec::new();
        for token in tokenize(template) {
            match token {
                Token::Literal(value) => nodes.push(Node::StringLiteral(value)),
                Token::Variable(raw) => nodes.push(Node::from_variable(&raw, template)?),
                Token::Error(source) => {
                    return Err(TemplateError::Tokenize {
                        source,
                        template: template.to_string(),
                    })
                }
            }
        }
        Ok(Self { nodes })
    }

    /// The nodes in rendering order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the distinct variable names this template references.
    pub fn variables(&self) -> BTreeSet<&str> {
        self.nodes.iter().filter_map(Node::variable).collect()
    }

    /// Renders the template, calling `resolve` for each expansion in order.
    ///
    /// # Errors
    ///
    /// The first failing expansion aborts rendering with a [`ResolveError::Expansion`] naming the
    /// variable, or a [`ResolveError::NotAnInteger`] for a zero-fill of a non-integer value.
    pub fn render<F>(&self, mut resolve: F) -> Result<String, ResolveError>
    where
        F: FnMut(&str) -> Result<String, ResolveError>,
    {
        self.nodes
            .iter()
            .map(|node| node.render(&mut resolve))
            .collect()
    }
}

impl Display for Template {
    /// Writes the template back in template syntax.
    ///
    /// ```
    /// use branchver::Template;
    ///
    /// let template_str = r"{major}.{minor:02d}\{x}";
    /// let template = Template::parse(template_str).unwrap();
    /// assert_eq!(template_str, template.to_string());
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{node}")?;
        }
        Ok(())
    }
}
