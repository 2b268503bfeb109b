use crate::connectors::ConnectorKind;

/// What a tool name says about the call: which connector owns it, if any,
/// and the action part after the connector prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<'a> {
    Scoped {
        connector: ConnectorKind,
        action: &'a str,
    },
    Unscoped {
        action: &'a str,
    },
}

impl<'a> Capability<'a> {
    pub fn classify(tool: &'a str) -> Self {
        match ConnectorKind::from_tool(tool) {
            Some(connector) => {
                let action =
                    tool[connector.as_ref().len()..].trim_start_matches(['.', '_', ':', '/']);
                Self::Scoped { connector, action }
            }
            None => Self::Unscoped { action: tool },
        }
    }

    pub fn connector(&self) -> Option<ConnectorKind> {
        match self {
            Self::Scoped { connector, .. } => Some(*connector),
            Self::Unscoped { .. } => None,
        }
    }

    pub fn action(&self) -> &'a str {
        match self {
            Self::Scoped { action, .. } | Self::Unscoped { action } => action,
        }
    }
}
