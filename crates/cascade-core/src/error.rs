//! Error types for cascade
//!
//! Errors are structured: a kind, the node and property the operation
//! touched, and an actionable help message. Every error is recoverable by
//! the caller; a failed operation never leaves a partially mutated tree.

use std::fmt;

/// Result type alias for cascade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cascade operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Node the operation was applied to, if any
    pub node: Option<String>,
    /// Property key the operation was applied to, if any
    pub property: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Parent assignment rejected because it would close a loop
    #[error("Cascading cycle detected: {}", .chain.join(" → "))]
    Cycle { chain: Vec<String> },
    /// Reset requested on a property with no local override
    #[error("Property '{property}' is not overridden on '{node}'")]
    NotOverridden { node: String, property: String },
    /// Reference to a node that does not exist
    #[error("Unknown node: {name}")]
    UnknownNode { name: String },
    /// Node name already taken
    #[error("Node already exists: {name}")]
    DuplicateNode { name: String },
    /// Error parsing YAML/JSON
    #[error("Parse error")]
    Parse,
    /// I/O error (file not found, etc.)
    #[error("I/O error")]
    Io,
    /// Internal error (bug in cascade or a poisoned lock)
    #[error("Internal error")]
    Internal,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            node: None,
            property: None,
            help: None,
            cause: None,
        }
    }

    /// Create a cycle error
    ///
    /// `chain` lists the walk that revisited a node, starting and ending
    /// with the repeated name.
    pub fn cycle(node: impl Into<String>, chain: Vec<String>) -> Self {
        Self {
            node: Some(node.into()),
            help: Some("Choose a cascading parent that does not descend from this node".into()),
            ..Self::new(ErrorKind::Cycle { chain })
        }
    }

    /// Create a not-overridden error
    pub fn not_overridden(node: impl Into<String>, property: impl Into<String>) -> Self {
        let node = node.into();
        let property = property.into();
        let help = format!(
            "'{}' already inherits '{}'; there is nothing to reset",
            node, property
        );
        let mut err = Self::new(ErrorKind::NotOverridden {
            node: node.clone(),
            property: property.clone(),
        });
        err.node = Some(node);
        err.property = Some(property);
        err.help = Some(help);
        err
    }

    /// Create an unknown node error
    pub fn unknown_node(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut err = Self::new(ErrorKind::UnknownNode { name: name.clone() });
        err.help = Some(format!("Create '{}' first or check for typos", name));
        err.node = Some(name);
        err
    }

    /// Create a duplicate node error
    pub fn duplicate_node(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut err = Self::new(ErrorKind::DuplicateNode { name: name.clone() });
        err.node = Some(name);
        err.help = Some(
            "Node names must be unique; pick another name or rename the existing node".into(),
        );
        err
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Parse)
        }
    }

    /// Create an I/O error
    pub fn io(path: impl fmt::Display, err: std::io::Error) -> Self {
        Self {
            cause: Some(format!("{}: {}", path, err)),
            ..Self::new(ErrorKind::Io)
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            help: Some("This is likely a bug in cascade. Please report it.".into()),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Internal)
        }
    }

    /// Add property context to the error
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        // Context is already part of the message for these kinds
        let context_in_message = matches!(
            self.kind,
            ErrorKind::NotOverridden { .. }
                | ErrorKind::UnknownNode { .. }
                | ErrorKind::DuplicateNode { .. }
        );
        if !context_in_message {
            if let Some(node) = &self.node {
                write!(f, "\n  Node: {}", node)?;
            }
            if let Some(property) = &self.property {
                write!(f, "\n  Property: {}", property)?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
