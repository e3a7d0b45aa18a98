//! Errors raised while reading a robot description

use std::fmt;
use std::io;

/// Error type for URDF parsing and validation
#[derive(Debug)]
pub enum UrdfError {
    /// Malformed XML
    Xml(String),
    /// A required child element is absent
    MissingElement {
        element: &'static str,
        context: String,
    },
    /// A required attribute is absent
    MissingAttribute {
        attribute: &'static str,
        element: String,
    },
    /// An attribute could not be interpreted
    InvalidAttribute {
        attribute: &'static str,
        element: String,
        message: String,
    },
    /// Joint `type` attribute not recognised
    UnknownJointType(String),
    /// A joint names a link that does not exist
    UndefinedLink { link: String, joint: String },
    DuplicateLink(String),
    DuplicateJoint(String),
    /// A link is the child of more than one joint
    KinematicLoop(String),
    /// Every link is some joint's child
    NoRootLink,
    MultipleRootLinks(Vec<String>),
    /// Valid URDF the simulator does not handle (prismatic joints, ...)
    Unsupported(String),
    Io(io::Error),
}

impl UrdfError {
    pub fn missing_element(element: &'static str, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element,
            context: context.into(),
        }
    }

    pub fn missing_attribute(attribute: &'static str, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.into(),
        }
    }

    pub fn invalid_attribute(
        attribute: &'static str,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            attribute,
            element: element.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for UrdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrdfError::Xml(msg) => write!(f, "XML parse error: {}", msg),
            UrdfError::MissingElement { element, context } => {
                write!(f, "missing required element: {} in {}", element, context)
            }
            UrdfError::MissingAttribute { attribute, element } => {
                write!(f, "missing required attribute: {} on {}", attribute, element)
            }
            UrdfError::InvalidAttribute { attribute, element, message } => {
                write!(f, "invalid value for {} on {}: {}", attribute, element, message)
            }
            UrdfError::UnknownJointType(t) => write!(f, "unknown joint type: {}", t),
            UrdfError::UndefinedLink { link, joint } => {
                write!(f, "reference to undefined link: {} in joint {}", link, joint)
            }
            UrdfError::DuplicateLink(name) => write!(f, "duplicate link name: {}", name),
            UrdfError::DuplicateJoint(name) => write!(f, "duplicate joint name: {}", name),
            UrdfError::KinematicLoop(name) => {
                write!(f, "kinematic loop: link {} has more than one parent", name)
            }
            UrdfError::NoRootLink => write!(f, "no root link found"),
            UrdfError::MultipleRootLinks(names) => {
                write!(f, "multiple root links found: {:?}", names)
            }
            UrdfError::Unsupported(what) => write!(f, "unsupported URDF feature: {}", what),
            UrdfError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for UrdfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UrdfError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for UrdfError {
    fn from(e: io::Error) -> Self {
        UrdfError::Io(e)
    }
}
