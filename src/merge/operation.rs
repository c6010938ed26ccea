//! Operations submitted by managers.

use crate::fieldpath::APIVersion;
use crate::value::Value;

/// Operation is one write by one manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Sets the fields in `object`. The manager gains ownership of them and
    /// keeps whatever else it owned.
    Update {
        manager: String,
        api_version: APIVersion,
        object: Value,
    },
    /// Declares `object` as the manager's whole intent. Fields it owned
    /// before and no longer sets are released. With `force`, fields owned by
    /// other managers are taken over instead of reported as conflicts.
    Apply {
        manager: String,
        api_version: APIVersion,
        object: Value,
        force: bool,
    },
}

impl Operation {
    pub fn update(
        manager: impl Into<String>,
        api_version: impl Into<APIVersion>,
        object: Value,
    ) -> Self {
        Operation::Update {
            manager: manager.into(),
            api_version: api_version.into(),
            object,
        }
    }

    pub fn apply(
        manager: impl Into<String>,
        api_version: impl Into<APIVersion>,
        object: Value,
    ) -> Self {
        Operation::Apply {
            manager: manager.into(),
            api_version: api_version.into(),
            object,
            force: false,
        }
    }

    pub fn force_apply(
        manager: impl Into<String>,
        api_version: impl Into<APIVersion>,
        object: Value,
    ) -> Self {
        Operation::Apply {
            manager: manager.into(),
            api_version: api_version.into(),
            object,
            force: true,
        }
    }

    pub fn manager(&self) -> &str {
        match self {
            Operation::Update { manager, .. } | Operation::Apply { manager, .. } => manager,
        }
    }

    pub fn api_version(&self) -> &APIVersion {
        match self {
            Operation::Update { api_version, .. } | Operation::Apply { api_version, .. } => {
                api_version
            }
        }
    }

    pub fn object(&self) -> &Value {
        match self {
            Operation::Update { object, .. } | Operation::Apply { object, .. } => object,
        }
    }

    pub fn is_apply(&self) -> bool {
        matches!(self, Operation::Apply { .. })
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Operation::Update { .. } => "update",
            Operation::Apply { force: false, .. } => "apply",
            Operation::Apply { force: true, .. } => "force-apply",
        }
    }
}
