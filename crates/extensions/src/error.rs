//! Extension and registry errors

/// Errors raised while loading, binding or constructing extensions
#[derive(thiserror::Error, Debug)]
pub enum ExtensionError {
    /// A required argument was missing or empty
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A dependency was requested for an interface with no binding
    #[error("No binding for {interface}")]
    Unbound { interface: String },

    /// Singleton construction depends on itself
    #[error("Dependency cycle: {}", join_path(.path))]
    DependencyCycle { path: Vec<String> },

    /// Two plugins declared the same name
    #[error("Duplicate plugin name: {name}")]
    DuplicateName { name: String },

    /// A factory failed
    #[error("Failed to construct {name}: {source}")]
    Construction {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

fn join_path(path: &[String]) -> String {
    path.join(" -> ")
}

impl ExtensionError {
    /// Wrap a factory failure, passing nested registry errors through unchanged
    pub(crate) fn from_factory(name: &str, err: anyhow::Error) -> Self {
        match err.downcast::<ExtensionError>() {
            Ok(inner) => inner,
            Err(source) => Self::Construction { name: name.to_string(), source },
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtensionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = ExtensionError::DependencyCycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Dependency cycle: a -> b -> a");
    }

    #[test]
    fn test_nested_errors_pass_through() {
        let nested = anyhow::Error::new(ExtensionError::Unbound { interface: "dyn Foo".into() });
        match ExtensionError::from_factory("bar", nested) {
            ExtensionError::Unbound { interface } => assert_eq!(interface, "dyn Foo"),
            other => panic!("unexpected error: {:?}", other),
        }

        match ExtensionError::from_factory("bar", anyhow::anyhow!("boom")) {
            ExtensionError::Construction { name, source } => {
                assert_eq!(name, "bar");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
