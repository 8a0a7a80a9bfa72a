//! Attribute paths: validated, name-based addresses into complex features.

use std::fmt;

/// Errors related to attribute path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path component is not a valid attribute name.
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path string is invalid.
    InvalidPath { message: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidComponent {
                component,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid attribute name '{}' at position {}: {}",
                    component, position, message
                )
            }
            PathError::InvalidPath { message } => {
                write!(f, "invalid attribute path: {}", message)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A validated path to an attribute inside a complex feature or schema.
///
/// Components are attribute names, which must be Unicode identifiers
/// (per UAX#31), or numeric strings when indexing into a multi-valued
/// attribute. Schemas and features are addressed by name, never by
/// position, so two paths are equal exactly when their names are.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub components: Vec<String>,
}

impl Path {
    /// The root path (no components).
    pub fn root() -> Self {
        Path::default()
    }

    /// Parse a `/`-separated path, validating every component.
    ///
    /// Empty components are dropped, so `a//b/` and `a/b` are the same path.
    ///
    /// ```rust
    /// use featurecrs_model::Path;
    ///
    /// let path = Path::parse("site/location/shape").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(Path::parse("site/").unwrap(), Path::parse("site").unwrap());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let components: Vec<String> = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Self::try_from_components(components)
    }

    /// Build a path from components, validating each.
    pub fn try_from_components(components: Vec<String>) -> Result<Self, PathError> {
        for (i, component) in components.iter().enumerate() {
            validate_name(component, i)?;
        }
        Ok(Path { components })
    }

    /// Append a single attribute name, returning the extended path.
    pub fn child(&self, name: &str) -> Result<Path, PathError> {
        validate_name(name, self.components.len())?;
        let mut components = self.components.clone();
        components.push(name.to_string());
        Ok(Path { components })
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// Split into the first component and the remaining components.
    pub fn split_first(&self) -> Option<(&str, &[String])> {
        self.components
            .split_first()
            .map(|(first, rest)| (first.as_str(), rest))
    }
}

/// Check that `name` can be used as an attribute name at `position`.
pub(crate) fn validate_name(name: &str, position: usize) -> Result<(), PathError> {
    let invalid = |message: String| PathError::InvalidComponent {
        component: name.to_string(),
        position,
        message,
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("empty component".to_string()));
    };

    // Indexes into multi-valued attributes
    if name.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }

    let valid_start = unicode_ident::is_xid_start(first)
        || (first == '_'
            && chars
                .clone()
                .next()
                .is_some_and(unicode_ident::is_xid_continue));
    if !valid_start {
        return Err(invalid(
            "must start with a letter or underscore followed by letter/digit".to_string(),
        ));
    }

    if let Some(c) = chars.find(|c| !unicode_ident::is_xid_continue(*c)) {
        return Err(invalid(format!("invalid character '{}' in identifier", c)));
    }

    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

/// Macro for creating attribute paths from literals.
///
/// ```rust
/// use featurecrs_model::path;
///
/// let p = path!("site/location/shape");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}
