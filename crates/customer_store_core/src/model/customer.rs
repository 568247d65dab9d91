//! Customer record, audit stamp and probe.

use crate::audit::tracker::AuditorId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned customer identity.
pub type CustomerId = Uuid;

/// System-managed audit metadata attached on first save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    /// Auditor acting when the record was inserted.
    pub created_by: Option<AuditorId>,
    /// Unix epoch milliseconds of the insert.
    pub created_at: i64,
    /// Auditor acting on the most recent write.
    pub last_modified_by: Option<AuditorId>,
    /// Unix epoch milliseconds of the most recent write.
    pub last_modified_at: i64,
    /// Number of updates since creation.
    pub version: u64,
}

impl AuditStamp {
    /// Stamp for a freshly inserted record.
    pub(crate) fn created(auditor: Option<&str>, now_ms: i64) -> Self {
        Self {
            created_by: auditor.map(str::to_owned),
            created_at: now_ms,
            last_modified_by: auditor.map(str::to_owned),
            last_modified_at: now_ms,
            version: 0,
        }
    }
}

/// A customer document.
///
/// `id` and `audit` are private: they are filled in by the repository on
/// save and read back through accessors. A deserialized record that carries
/// an `id` without a complete audit stamp is refused by `save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    id: Option<CustomerId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(flatten)]
    audit: Option<AuditStamp>,
}

impl Customer {
    /// Creates an unsaved customer.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            audit: None,
        }
    }

    /// Rebuilds a persisted customer from stored columns.
    pub(crate) fn persisted(
        id: CustomerId,
        first_name: String,
        last_name: String,
        audit: AuditStamp,
    ) -> Self {
        Self {
            id: Some(id),
            first_name,
            last_name,
            audit: Some(audit),
        }
    }

    pub fn id(&self) -> Option<CustomerId> {
        self.id
    }

    /// Whether the next save will insert rather than update.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn audit(&self) -> Option<&AuditStamp> {
        self.audit.as_ref()
    }

    pub fn version(&self) -> Option<u64> {
        self.audit.as_ref().map(|audit| audit.version)
    }

    pub fn created_by(&self) -> Option<&str> {
        self.audit.as_ref()?.created_by.as_deref()
    }

    pub fn last_modified_by(&self) -> Option<&str> {
        self.audit.as_ref()?.last_modified_by.as_deref()
    }

    /// True for saved records that were never updated.
    pub fn is_unmodified(&self) -> bool {
        self.version() == Some(0)
    }
}

impl Display for Customer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn or_null<T: Display>(value: Option<T>) -> String {
            value.map_or_else(|| "null".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "Customer[id={}, firstName='{}', lastName='{}'",
            or_null(self.id),
            self.first_name,
            self.last_name
        )?;
        match &self.audit {
            Some(audit) => write!(
                f,
                ", createdBy={}, createdAt={}, lastModifiedBy={}, lastModifiedAt={}, version={}]",
                or_null(audit.created_by.as_deref()),
                audit.created_at,
                or_null(audit.last_modified_by.as_deref()),
                audit.last_modified_at,
                audit.version
            ),
            None => write!(f, "]"),
        }
    }
}

/// Partially-populated template for query-by-example.
///
/// Every `Some` field must match exactly; `None` fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerProbe {
    pub id: Option<CustomerId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_by: Option<AuditorId>,
    pub last_modified_by: Option<AuditorId>,
    pub version: Option<u64>,
}

impl CustomerProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_created_by(mut self, auditor: impl Into<AuditorId>) -> Self {
        self.created_by = Some(auditor.into());
        self
    }

    pub fn with_last_modified_by(mut self, auditor: impl Into<AuditorId>) -> Self {
        self.last_modified_by = Some(auditor.into());
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// True when no field is populated, i.e. the probe matches everything.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// In-memory evaluation of the probe against one record.
    pub fn matches(&self, customer: &Customer) -> bool {
        fn field<T: PartialEq + ?Sized>(probe: Option<&T>, actual: Option<&T>) -> bool {
            probe.map_or(true, |expected| actual == Some(expected))
        }

        field(self.id.as_ref(), customer.id.as_ref())
            && field(self.first_name.as_deref(), Some(customer.first_name.as_str()))
            && field(self.last_name.as_deref(), Some(customer.last_name.as_str()))
            && field(self.created_by.as_deref(), customer.created_by())
            && field(self.last_modified_by.as_deref(), customer.last_modified_by())
            && field(self.version.as_ref(), customer.audit.as_ref().map(|a| &a.version))
    }
}
